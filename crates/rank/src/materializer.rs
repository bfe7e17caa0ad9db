//! Result materializer
//!
//! Enriches drained entries with descriptive attributes fetched by point
//! lookup. Order is taken from the drained list as-is; nothing here ranks.
//!
//! A lookup that comes back empty for an id that survived ranking is a
//! consistency failure. The whole invocation fails rather than returning a
//! shorter list.

use snb_core::{Attribute, EntityId, Error, PointLookup, QueryKind, Result, Value};
use std::collections::BTreeSet;
use tracing::warn;

/// Typed point lookups for one query invocation
pub struct Materializer<'a, L: PointLookup + ?Sized> {
    query: QueryKind,
    lookup: &'a L,
}

impl<'a, L: PointLookup + ?Sized> Materializer<'a, L> {
    /// Create a materializer reading from `lookup`
    pub fn new(query: QueryKind, lookup: &'a L) -> Self {
        Materializer { query, lookup }
    }

    /// Build one record per entry, preserving order
    ///
    /// # Errors
    ///
    /// The first error from `build` aborts materialization.
    pub fn materialize<T, R, F>(&self, ranked: Vec<T>, mut build: F) -> Result<Vec<R>>
    where
        F: FnMut(&Self, T) -> Result<R>,
    {
        let mut out = Vec::with_capacity(ranked.len());
        for entry in ranked {
            out.push(build(self, entry)?);
        }
        Ok(out)
    }

    /// Fetch an attribute that must exist
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingAttribute`] if the store has no value, or the
    /// lookup's own error.
    pub fn require(&self, entity: EntityId, attribute: Attribute) -> Result<Value> {
        match self.lookup.lookup(entity, attribute)? {
            Some(value) => Ok(value),
            None => {
                warn!(
                    target: "snb::materialize",
                    query = %self.query,
                    entity,
                    attribute = %attribute,
                    "Ranked entity has no attribute value"
                );
                Err(Error::MissingAttribute { entity, attribute })
            }
        }
    }

    /// Required text attribute
    pub fn text(&self, entity: EntityId, attribute: Attribute) -> Result<String> {
        match self.require(entity, attribute)? {
            Value::Text(s) => Ok(s),
            _ => Err(malformed(entity, attribute, "text")),
        }
    }

    /// Required integer attribute
    pub fn int(&self, entity: EntityId, attribute: Attribute) -> Result<i64> {
        self.require(entity, attribute)?
            .as_int()
            .ok_or_else(|| malformed(entity, attribute, "integer"))
    }

    /// Optional list of text values; absent or NULL reads as empty
    pub fn text_list(&self, entity: EntityId, attribute: Attribute) -> Result<Vec<String>> {
        let items = self.optional_list(entity, attribute)?;
        items
            .into_iter()
            .map(|item| match item {
                Value::Text(s) => Ok(s),
                _ => Err(malformed(entity, attribute, "list of text")),
            })
            .collect()
    }

    /// Optional list of values; absent or NULL reads as empty
    pub fn optional_list(&self, entity: EntityId, attribute: Attribute) -> Result<Vec<Value>> {
        match self.lookup.lookup(entity, attribute)? {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::List(items)) => Ok(items),
            Some(_) => Err(malformed(entity, attribute, "list")),
        }
    }

    /// Optional id set; absent or NULL reads as empty
    pub fn id_set(&self, entity: EntityId, attribute: Attribute) -> Result<BTreeSet<EntityId>> {
        match self.lookup.lookup(entity, attribute)? {
            None | Some(Value::Null) => Ok(BTreeSet::new()),
            Some(Value::IdSet(ids)) => Ok(ids),
            Some(Value::List(items)) => items
                .iter()
                .map(|v| v.as_int().ok_or_else(|| malformed(entity, attribute, "id set")))
                .collect(),
            Some(_) => Err(malformed(entity, attribute, "id set")),
        }
    }
}

fn malformed(entity: EntityId, attribute: Attribute, expected: &'static str) -> Error {
    Error::MalformedAttribute {
        entity,
        attribute,
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snb_core::{ErrorCategory, MemorySource};

    fn source() -> MemorySource {
        MemorySource::new()
            .with_person(1, "Ada", "Lovelace", "female", "London")
            .with_person(2, "Alan", "Turing", "male", "Wilmslow")
            .with_attribute(1, Attribute::Birthday, 1_000i64)
            .with_attribute(
                1,
                Attribute::Emails,
                vec![Value::from("ada@example.org"), Value::from("al@example.org")],
            )
            .with_attribute(1, Attribute::Interests, BTreeSet::from([3i64, 5]))
    }

    #[test]
    fn test_materialize_preserves_order() {
        let src = source();
        let m = Materializer::new(QueryKind::Closeness, &src);
        let names = m
            .materialize(vec![2, 1], |m, id| m.text(id, Attribute::LastName))
            .unwrap();
        assert_eq!(names, vec!["Turing", "Lovelace"]);
    }

    #[test]
    fn test_missing_required_attribute_is_consistency_error() {
        let src = source();
        let m = Materializer::new(QueryKind::Closeness, &src);
        let err = m
            .materialize(vec![1, 99], |m, id| m.text(id, Attribute::LastName))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MissingAttribute {
                entity: 99,
                attribute: Attribute::LastName
            }
        ));
        assert_eq!(err.category(), ErrorCategory::Consistency);
    }

    #[test]
    fn test_wrong_shape_is_malformed() {
        let src = source();
        let m = Materializer::new(QueryKind::Closeness, &src);
        assert!(matches!(
            m.int(1, Attribute::LastName),
            Err(Error::MalformedAttribute {
                expected: "integer",
                ..
            })
        ));
        assert_eq!(m.int(1, Attribute::Birthday).unwrap(), 1_000);
    }

    #[test]
    fn test_optional_lists_default_to_empty() {
        let src = source();
        let m = Materializer::new(QueryKind::Closeness, &src);
        assert_eq!(
            m.text_list(1, Attribute::Emails).unwrap(),
            vec!["ada@example.org", "al@example.org"]
        );
        assert!(m.text_list(2, Attribute::Emails).unwrap().is_empty());
        assert!(m.optional_list(2, Attribute::Universities).unwrap().is_empty());
    }

    #[test]
    fn test_id_set() {
        let src = source();
        let m = Materializer::new(QueryKind::FriendRecommendation, &src);
        assert_eq!(m.id_set(1, Attribute::Interests).unwrap(), BTreeSet::from([3, 5]));
        assert!(m.id_set(2, Attribute::Interests).unwrap().is_empty());
    }

    #[test]
    fn test_lookup_failure_propagates() {
        let src = source().fail_lookups();
        let m = Materializer::new(QueryKind::Closeness, &src);
        let err = m.text(1, Attribute::LastName).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Source);
    }
}
