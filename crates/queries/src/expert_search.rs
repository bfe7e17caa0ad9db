//! Expert search
//!
//! Ranks the start person's friends by how many distinct comments they wrote
//! in reply to posts tagged within a tag class, and reports the in-class tags
//! involved. The scan delivers one row per (comment, tag of the replied-to
//! post); rows whose tag lies outside the class are dropped before they reach
//! the aggregator.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use snb_core::{
    Attribute, Column, EntityId, Error, Limit, PointLookup, QueryKind, Result, RowSource,
    ScanRequest, TagId,
};
use snb_rank::{
    value_desc_then_id_desc, Aggregate, AggregateKind, Contribution, GroupLayout, Materializer,
    RankPipeline, ValueEntry,
};
use std::collections::BTreeSet;
use tracing::debug;

// ============================================================================
// Tag classes
// ============================================================================

/// Decides whether a tag belongs to the requested tag class
///
/// Implementations typically walk a small static class hierarchy; closures
/// work too.
pub trait TagClassPredicate {
    /// Whether `tag` is in the class or one of its subclasses
    fn is_within_class(&self, tag: TagId) -> bool;
}

impl<F> TagClassPredicate for F
where
    F: Fn(TagId) -> bool,
{
    fn is_within_class(&self, tag: TagId) -> bool {
        self(tag)
    }
}

/// In-memory tag class hierarchy
#[derive(Debug, Clone, Default)]
pub struct TagClassIndex {
    classes_by_name: FxHashMap<String, EntityId>,
    parent: FxHashMap<EntityId, EntityId>,
    tag_class: FxHashMap<TagId, EntityId>,
}

impl TagClassIndex {
    /// Create an empty hierarchy
    pub fn new() -> Self {
        TagClassIndex::default()
    }

    /// Builder: a class with an optional parent class
    pub fn with_class(mut self, class: EntityId, name: &str, parent: Option<EntityId>) -> Self {
        self.classes_by_name.insert(name.to_string(), class);
        if let Some(parent) = parent {
            self.parent.insert(class, parent);
        }
        self
    }

    /// Builder: the class a tag has
    pub fn with_tag(mut self, tag: TagId, class: EntityId) -> Self {
        self.tag_class.insert(tag, class);
        self
    }

    /// Predicate for the class called `name`
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if no class has that name.
    pub fn class(&self, name: &str) -> Result<ClassMembers> {
        let root = *self
            .classes_by_name
            .get(name)
            .ok_or_else(|| Error::invalid_parameter(format!("unknown tag class '{}'", name)))?;
        let tags = self
            .tag_class
            .iter()
            .filter(|(_, class)| self.descends_from(**class, root))
            .map(|(tag, _)| *tag)
            .collect();
        Ok(ClassMembers { tags })
    }

    fn descends_from(&self, mut class: EntityId, root: EntityId) -> bool {
        // Bounded walk so a malformed (cyclic) hierarchy terminates.
        for _ in 0..=self.parent.len() {
            if class == root {
                return true;
            }
            match self.parent.get(&class) {
                Some(parent) => class = *parent,
                None => return false,
            }
        }
        false
    }
}

/// Tags within one class and its subclasses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassMembers {
    tags: FxHashSet<TagId>,
}

impl ClassMembers {
    /// Number of member tags
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Whether the class has no tags
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl TagClassPredicate for ClassMembers {
    fn is_within_class(&self, tag: TagId) -> bool {
        self.tags.contains(&tag)
    }
}

// ============================================================================
// Query
// ============================================================================

/// Inputs of one expert search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpertSearchParams {
    /// Start person
    pub person: EntityId,
    /// Name of the tag class
    pub tag_class: String,
}

impl ExpertSearchParams {
    /// Create parameters
    pub fn new(person: EntityId, tag_class: impl Into<String>) -> Self {
        ExpertSearchParams {
            person,
            tag_class: tag_class.into(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.tag_class.trim().is_empty() {
            return Err(Error::invalid_parameter("tag class name is empty"));
        }
        Ok(())
    }
}

/// One friend and their in-class replies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpertSearchResult {
    /// Friend
    pub person_id: EntityId,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Names of the in-class tags on the replied-to posts
    pub tag_names: BTreeSet<String>,
    /// Distinct replying comments
    pub reply_count: u64,
}

/// Rank up to `k` friends by replies to posts within the tag class
///
/// Order: larger reply count first, ties to the larger person id. Only
/// friends with at least one in-class reply are ranked.
///
/// # Errors
///
/// Rejects an empty class name before touching the source. Source and
/// consistency errors (including a tag without a name) abort the call.
pub fn top_k<S, P>(
    source: &S,
    params: &ExpertSearchParams,
    within_class: &P,
    k: Limit,
) -> Result<Vec<ExpertSearchResult>>
where
    S: RowSource + PointLookup + ?Sized,
    P: TagClassPredicate + ?Sized,
{
    params.validate()?;
    let query = QueryKind::ExpertSearch;

    let cursor = source.open(&ScanRequest::ExpertSearch {
        person: params.person,
    })?;
    let pipeline = RankPipeline::new(
        query,
        GroupLayout::two_level(Column::PersonId, Column::CommentId),
        k,
        value_desc_then_id_desc,
    );
    let (ranked, stats) = pipeline.run(
        cursor,
        AggregateKind::CountWithAttributes,
        |row| {
            let tag = row.id(Column::TagId)?;
            Ok(if within_class.is_within_class(tag) {
                Contribution::Include(Some(tag))
            } else {
                Contribution::Skip
            })
        },
        |f| {
            let value = f.aggregate.rank_value();
            match f.aggregate {
                Aggregate::CountWithAttributes { count, attributes } if count > 0 => {
                    Some(ValueEntry::new(f.key, value, attributes))
                }
                _ => None,
            }
        },
    )?;

    let lookups = Materializer::new(query, source);
    let results = lookups.materialize(ranked, |m, entry| {
        let tag_names = entry
            .payload
            .iter()
            .map(|tag| m.text(*tag, Attribute::TagName))
            .collect::<Result<BTreeSet<String>>>()?;
        Ok(ExpertSearchResult {
            person_id: entry.id,
            first_name: m.text(entry.id, Attribute::FirstName)?,
            last_name: m.text(entry.id, Attribute::LastName)?,
            tag_names,
            reply_count: u64::try_from(entry.value).unwrap_or(0),
        })
    })?;

    debug!(
        target: "snb::query",
        query = %query,
        person = params.person,
        tag_class = %params.tag_class,
        rows = stats.rows,
        k = %k,
        results = results.len(),
        "Query ranked"
    );
    Ok(results)
}
