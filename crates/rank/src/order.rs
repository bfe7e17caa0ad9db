//! Desired output orders
//!
//! Each comparator returns `Less` when its first argument belongs earlier in
//! the final result. They are total: the last tie-break is always the entity
//! id, and ids are unique within one scan.
//!
//! | query                 | order                                              |
//! |-----------------------|----------------------------------------------------|
//! | friend recommendation | score desc, id desc                                |
//! | expert search         | reply count desc, id desc                          |
//! | country pair          | combined count desc, id desc                       |
//! | forum posts           | post count desc, id desc                           |
//! | closeness             | distance asc, surname asc (case-insensitive), id desc |

use snb_core::EntityId;
use std::cmp::Ordering;

/// A desired output order over `T`
pub type DesiredOrder<T> = fn(&T, &T) -> Ordering;

/// Entry ranked by one integer value, larger first, then larger id first
///
/// `payload` rides along untouched (tag sets, per-country counts) so the
/// materializer has it after drain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueEntry<P> {
    /// Entity id
    pub id: EntityId,
    /// Ranking value
    pub value: i64,
    /// Data carried to materialization
    pub payload: P,
}

impl<P> ValueEntry<P> {
    /// Create an entry
    pub fn new(id: EntityId, value: i64, payload: P) -> Self {
        ValueEntry { id, value, payload }
    }
}

/// Larger value first; ties go to the larger id
pub fn value_desc_then_id_desc<P>(a: &ValueEntry<P>, b: &ValueEntry<P>) -> Ordering {
    b.value.cmp(&a.value).then_with(|| b.id.cmp(&a.id))
}

/// Entry ranked by graph distance and surname
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistanceEntry {
    /// Entity id
    pub id: EntityId,
    /// Shortest-path distance from the start person
    pub distance: u32,
    /// Surname, compared case-insensitively
    pub last_name: String,
}

/// Smaller distance first, then surname ascending ignoring case, then the
/// larger id
pub fn distance_then_surname_then_id_desc(a: &DistanceEntry, b: &DistanceEntry) -> Ordering {
    a.distance
        .cmp(&b.distance)
        .then_with(|| cmp_ignore_case(&a.last_name, &b.last_name))
        .then_with(|| b.id.cmp(&a.id))
}

/// Compare two strings character by character after lowercasing
pub fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}
