//! Fan-out-safe partial aggregation
//!
//! A one-to-many join repeats a child record once per leaf attribute (a post
//! with three tags arrives three times). The aggregator keeps a set of child
//! keys already seen for the open entity, so each child contributes to a
//! count at most once while every row still contributes its attribute.
//!
//! Only one entity is open at a time: the row stream is sorted by primary
//! key, so the state for an entity is dropped as soon as it is finalized.

use rustc_hash::{FxHashMap, FxHashSet};
use snb_core::{child_key, EntityId, Error, QueryKind, Result};
use std::collections::BTreeSet;

/// How rows fold into a per-entity aggregate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregateKind {
    /// Children with at least one attribute in `interests`, minus the
    /// children with none
    Score {
        /// Attribute ids that make a child "matching"
        interests: FxHashSet<EntityId>,
    },
    /// Distinct children
    Count,
    /// Distinct children plus the union of all attributes seen
    CountWithAttributes,
    /// Distinct children per bucket; the attribute selects the bucket
    CountryPair {
        /// Attribute value counted in the first bucket
        x: EntityId,
        /// Attribute value counted in the second bucket
        y: EntityId,
    },
}

/// Frozen per-entity aggregate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Aggregate {
    /// Signed score
    Score(i64),
    /// Distinct child count
    Count(u64),
    /// Distinct child count and attribute union
    CountWithAttributes {
        /// Distinct children
        count: u64,
        /// Union of attributes over all rows
        attributes: BTreeSet<EntityId>,
    },
    /// Distinct child counts per bucket
    CountryPair {
        /// Children in the first bucket
        x: u64,
        /// Children in the second bucket
        y: u64,
    },
}

impl Aggregate {
    /// The single value entities are ranked by
    ///
    /// Score for `Score`, the child count for the counting variants and the
    /// combined count for `CountryPair`.
    pub fn rank_value(&self) -> i64 {
        match self {
            Aggregate::Score(score) => *score,
            Aggregate::Count(count) | Aggregate::CountWithAttributes { count, .. } => {
                saturating_i64(*count)
            }
            Aggregate::CountryPair { x, y } => saturating_i64(x.saturating_add(*y)),
        }
    }
}

fn saturating_i64(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

/// An entity's aggregate after its group boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finalized {
    /// Primary key of the entity
    pub key: EntityId,
    /// Frozen aggregate
    pub aggregate: Aggregate,
}

#[derive(Debug)]
enum PartialState {
    // child -> whether any of its rows matched
    Score(FxHashMap<EntityId, bool>),
    Count(FxHashSet<EntityId>),
    CountWithAttributes {
        seen: FxHashSet<EntityId>,
        attributes: BTreeSet<EntityId>,
    },
    CountryPair {
        seen_x: FxHashSet<EntityId>,
        seen_y: FxHashSet<EntityId>,
    },
}

#[derive(Debug)]
struct OpenGroup {
    key: EntityId,
    state: PartialState,
}

/// Folds rows into one open per-entity aggregate at a time
#[derive(Debug)]
pub struct PartialAggregator {
    query: QueryKind,
    kind: AggregateKind,
    open: Option<OpenGroup>,
}

impl PartialAggregator {
    /// Create an aggregator with nothing open
    pub fn new(query: QueryKind, kind: AggregateKind) -> Self {
        PartialAggregator {
            query,
            kind,
            open: None,
        }
    }

    /// Primary key of the open entity, if any
    pub fn open_key(&self) -> Option<EntityId> {
        self.open.as_ref().map(|g| g.key)
    }

    /// Fold one row into the entity `primary`
    ///
    /// The first row for an entity allocates its state. A NULL or zero
    /// `child` is the "no child record" sentinel: it opens the entity but
    /// counts nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnorderedSource`] if a different entity is still
    /// open, i.e. the previous entity was never finalized because the rows
    /// were not grouped by primary key.
    pub fn update(
        &mut self,
        primary: EntityId,
        child: Option<EntityId>,
        attribute: Option<EntityId>,
    ) -> Result<()> {
        if let Some(open) = &self.open {
            if open.key != primary {
                return Err(Error::UnorderedSource {
                    query: self.query,
                    previous: open.key,
                    current: primary,
                });
            }
        }
        let kind = &self.kind;
        let group = self.open.get_or_insert_with(|| OpenGroup {
            key: primary,
            state: fresh_state(kind),
        });
        let child = child_key(child);

        match (&mut group.state, kind) {
            (PartialState::Score(children), AggregateKind::Score { interests }) => {
                if let Some(child) = child {
                    let matched = attribute.map_or(false, |a| interests.contains(&a));
                    *children.entry(child).or_insert(false) |= matched;
                }
            }
            (PartialState::Count(seen), _) => {
                if let Some(child) = child {
                    seen.insert(child);
                }
            }
            (PartialState::CountWithAttributes { seen, attributes }, _) => {
                if let Some(child) = child {
                    seen.insert(child);
                }
                if let Some(attribute) = attribute {
                    attributes.insert(attribute);
                }
            }
            (PartialState::CountryPair { seen_x, seen_y }, AggregateKind::CountryPair { x, y }) => {
                if let (Some(child), Some(attribute)) = (child, attribute) {
                    if attribute == *x {
                        seen_x.insert(child);
                    } else if attribute == *y {
                        seen_y.insert(child);
                    }
                }
            }
            // State is always built from self.kind.
            _ => {}
        }
        Ok(())
    }

    /// Freeze and release the open entity
    ///
    /// Returns `None` if no entity is open (nothing was updated since the
    /// last boundary).
    pub fn finalize(&mut self) -> Option<Finalized> {
        let group = self.open.take()?;
        let aggregate = match group.state {
            PartialState::Score(children) => {
                let matching = children.values().filter(|m| **m).count();
                let others = children.len() - matching;
                Aggregate::Score(saturating_i64(matching as u64) - saturating_i64(others as u64))
            }
            PartialState::Count(seen) => Aggregate::Count(seen.len() as u64),
            PartialState::CountWithAttributes { seen, attributes } => {
                Aggregate::CountWithAttributes {
                    count: seen.len() as u64,
                    attributes,
                }
            }
            PartialState::CountryPair { seen_x, seen_y } => Aggregate::CountryPair {
                x: seen_x.len() as u64,
                y: seen_y.len() as u64,
            },
        };
        Some(Finalized {
            key: group.key,
            aggregate,
        })
    }
}

fn fresh_state(kind: &AggregateKind) -> PartialState {
    match kind {
        AggregateKind::Score { .. } => PartialState::Score(FxHashMap::default()),
        AggregateKind::Count => PartialState::Count(FxHashSet::default()),
        AggregateKind::CountWithAttributes => PartialState::CountWithAttributes {
            seen: FxHashSet::default(),
            attributes: BTreeSet::new(),
        },
        AggregateKind::CountryPair { .. } => PartialState::CountryPair {
            seen_x: FxHashSet::default(),
            seen_y: FxHashSet::default(),
        },
    }
}
