//! Flat rows produced by a scan
//!
//! A [`RawRow`] is one leaf of the join that feeds a query: a handful of
//! typed columns addressed by logical [`Column`] name. Rows are transient;
//! the kernel reads what it needs and drops them before pulling the next.

use crate::error::{Error, Result};
use crate::types::EntityId;
use crate::value::Value;
use smallvec::SmallVec;
use std::fmt;

/// Logical column names used by the scan contracts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    /// A person (friend, friend of friend, reply author)
    PersonId,
    /// A post
    PostId,
    /// A comment
    CommentId,
    /// A post or comment
    MessageId,
    /// A tag attached to a post
    TagId,
    /// A forum
    ForumId,
    /// The country a message was created in
    CountryId,
    /// Shortest-path distance from the start person
    Distance,
    /// A person's last name
    LastName,
}

impl Column {
    /// Stable snake_case name
    pub fn as_str(&self) -> &'static str {
        match self {
            Column::PersonId => "person_id",
            Column::PostId => "post_id",
            Column::CommentId => "comment_id",
            Column::MessageId => "message_id",
            Column::TagId => "tag_id",
            Column::ForumId => "forum_id",
            Column::CountryId => "country_id",
            Column::Distance => "distance",
            Column::LastName => "last_name",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a scan
///
/// Most scans deliver three columns, so the storage is inline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    columns: SmallVec<[(Column, Value); 4]>,
}

impl RawRow {
    /// Create an empty row
    pub fn new() -> Self {
        RawRow::default()
    }

    /// Builder: set a column, replacing any previous value
    pub fn with(mut self, column: Column, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    /// Set a column, replacing any previous value
    pub fn set(&mut self, column: Column, value: impl Into<Value>) {
        let value = value.into();
        match self.columns.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.columns.push((column, value)),
        }
    }

    /// Raw access to a column
    pub fn get(&self, column: Column) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, v)| v)
    }

    /// Number of columns present
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the row has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn require(&self, column: Column) -> Result<&Value> {
        self.get(column)
            .ok_or_else(|| Error::malformed(column, "is missing"))
    }

    /// Read a non-null id column
    pub fn id(&self, column: Column) -> Result<EntityId> {
        match self.require(column)? {
            Value::Int(v) => Ok(*v),
            other => Err(Error::malformed(
                column,
                format!("expected integer, found {}", other.type_name()),
            )),
        }
    }

    /// Read a nullable id column (outer-join side)
    pub fn nullable_id(&self, column: Column) -> Result<Option<EntityId>> {
        match self.require(column)? {
            Value::Null => Ok(None),
            Value::Int(v) => Ok(Some(*v)),
            other => Err(Error::malformed(
                column,
                format!("expected integer or null, found {}", other.type_name()),
            )),
        }
    }

    /// Read a non-null integer column
    pub fn int(&self, column: Column) -> Result<i64> {
        self.id(column)
    }

    /// Read a non-null text column
    pub fn text(&self, column: Column) -> Result<&str> {
        match self.require(column)? {
            Value::Text(s) => Ok(s),
            other => Err(Error::malformed(
                column,
                format!("expected text, found {}", other.type_name()),
            )),
        }
    }
}
