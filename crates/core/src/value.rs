//! Typed values delivered by the row source
//!
//! Scan columns carry scalars only (`Null`, `Int`, `Text`). Point lookups may
//! also return collections: lists of strings or of affiliation triples, and
//! id sets such as a person's interests.

use crate::types::EntityId;
use std::collections::BTreeSet;

/// A single typed value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// SQL NULL
    Null,
    /// 64-bit signed integer (ids, counts, distances, epoch milliseconds)
    Int(i64),
    /// UTF-8 text
    Text(String),
    /// Ordered list of values
    List(Vec<Value>),
    /// Set of entity ids
    IdSet(BTreeSet<EntityId>),
}

impl Value {
    /// Short name of the variant, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "integer",
            Value::Text(_) => "text",
            Value::List(_) => "list",
            Value::IdSet(_) => "id set",
        }
    }

    /// Whether this is `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Integer payload, if any
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Text payload, if any
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// List payload, if any
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Id-set payload, if any
    pub fn as_id_set(&self) -> Option<&BTreeSet<EntityId>> {
        match self {
            Value::IdSet(ids) => Some(ids),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<BTreeSet<EntityId>> for Value {
    fn from(ids: BTreeSet<EntityId>) -> Self {
        Value::IdSet(ids)
    }
}
