//! Identifier and capacity types
//!
//! Dataset identifiers are plain signed 64-bit integers, the width the
//! benchmark's generator emits. Zero never names a real entity; outer joins
//! use it (or SQL NULL) to mean "no child record".

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a person, post, comment, forum, tag or place
pub type EntityId = i64;

/// Identifier of a tag
pub type TagId = EntityId;

/// Whether `id` is the "no child record" sentinel produced by outer joins
pub fn is_sentinel(id: EntityId) -> bool {
    id == 0
}

/// Normalize a nullable child key so that both NULL and zero read as absent
pub fn child_key(id: Option<EntityId>) -> Option<EntityId> {
    id.filter(|id| !is_sentinel(*id))
}

/// Validated top-k capacity (always at least 1)
///
/// Construct with [`Limit::new`] or `Limit::try_from(i64)`; both reject zero
/// and negative values with [`Error::InvalidLimit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Limit(usize);

impl Limit {
    /// Smallest valid limit
    pub const MIN: Limit = Limit(1);

    /// Create a limit, rejecting zero
    pub fn new(k: usize) -> Result<Self> {
        if k == 0 {
            return Err(Error::InvalidLimit(0));
        }
        Ok(Limit(k))
    }

    /// The capacity as a `usize`
    pub fn get(self) -> usize {
        self.0
    }
}

impl TryFrom<i64> for Limit {
    type Error = Error;

    fn try_from(k: i64) -> Result<Self> {
        if k < 1 {
            return Err(Error::InvalidLimit(k));
        }
        usize::try_from(k)
            .map(Limit)
            .map_err(|_| Error::InvalidLimit(k))
    }
}

impl From<Limit> for i64 {
    fn from(limit: Limit) -> i64 {
        i64::try_from(limit.0).unwrap_or(i64::MAX)
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
