//! Scripted in-memory row source
//!
//! `MemorySource` replays pre-ordered rows per query kind and answers point
//! lookups from a hash map. It implements both [`RowSource`] and
//! [`PointLookup`], so the whole pipeline can run without a database.
//!
//! Rows are replayed verbatim; the source does not sort or validate them.
//! Failure injection (`fail_open`, `fail_after_rows`, `fail_lookups`) lets
//! tests exercise the error paths.

use crate::error::{Error, Result};
use crate::request::{QueryKind, ScanRequest};
use crate::row::RawRow;
use crate::traits::{Attribute, Cursor, PointLookup, RowSource, VecCursor};
use crate::types::EntityId;
use crate::value::Value;
use rustc_hash::FxHashMap;
use std::cell::{Cell, RefCell};
use tracing::trace;

/// In-memory [`RowSource`] + [`PointLookup`]
#[derive(Debug, Default)]
pub struct MemorySource {
    scans: FxHashMap<QueryKind, Vec<RawRow>>,
    attributes: FxHashMap<(EntityId, Attribute), Value>,
    fail_open: bool,
    fail_after_rows: Option<usize>,
    fail_lookups: bool,
    opened: RefCell<Vec<ScanRequest>>,
    lookups: Cell<usize>,
}

impl MemorySource {
    /// Create an empty source
    pub fn new() -> Self {
        MemorySource::default()
    }

    /// Builder: rows replayed for every scan of `kind`
    pub fn with_rows(mut self, kind: QueryKind, rows: Vec<RawRow>) -> Self {
        self.scans.insert(kind, rows);
        self
    }

    /// Builder: one attribute value
    pub fn with_attribute(
        mut self,
        entity: EntityId,
        attribute: Attribute,
        value: impl Into<Value>,
    ) -> Self {
        self.insert_attribute(entity, attribute, value);
        self
    }

    /// Builder: first name, last name, gender and city of a person
    pub fn with_person(
        self,
        id: EntityId,
        first_name: &str,
        last_name: &str,
        gender: &str,
        city: &str,
    ) -> Self {
        self.with_attribute(id, Attribute::FirstName, first_name)
            .with_attribute(id, Attribute::LastName, last_name)
            .with_attribute(id, Attribute::Gender, gender)
            .with_attribute(id, Attribute::City, city)
    }

    /// Set one attribute value
    pub fn insert_attribute(
        &mut self,
        entity: EntityId,
        attribute: Attribute,
        value: impl Into<Value>,
    ) {
        self.attributes.insert((entity, attribute), value.into());
    }

    /// Builder: every `open` fails
    pub fn fail_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Builder: scans fail after yielding `n` rows
    pub fn fail_after_rows(mut self, n: usize) -> Self {
        self.fail_after_rows = Some(n);
        self
    }

    /// Builder: every lookup fails
    pub fn fail_lookups(mut self) -> Self {
        self.fail_lookups = true;
        self
    }

    /// Scan requests opened so far, in order
    pub fn opened(&self) -> Vec<ScanRequest> {
        self.opened.borrow().clone()
    }

    /// Number of point lookups served so far
    pub fn lookup_count(&self) -> usize {
        self.lookups.get()
    }
}

impl RowSource for MemorySource {
    fn open(&self, request: &ScanRequest) -> Result<Box<dyn Cursor + '_>> {
        if self.fail_open {
            return Err(Error::source(format!(
                "cannot open {} scan",
                request.kind()
            )));
        }
        self.opened.borrow_mut().push(request.clone());

        let rows = self.scans.get(&request.kind()).cloned().unwrap_or_default();
        trace!(target: "snb::memory", query = %request.kind(), rows = rows.len(), "Scan opened");

        let cursor = VecCursor::new(rows);
        let boxed: Box<dyn Cursor + '_> = match self.fail_after_rows {
            Some(limit) => Box::new(FailingCursor {
                inner: cursor,
                remaining: limit,
            }),
            None => Box::new(cursor),
        };
        Ok(boxed)
    }
}

impl PointLookup for MemorySource {
    fn lookup(&self, entity: EntityId, attribute: Attribute) -> Result<Option<Value>> {
        if self.fail_lookups {
            return Err(Error::source(format!(
                "lookup of {} for {} failed",
                attribute, entity
            )));
        }
        self.lookups.set(self.lookups.get() + 1);
        Ok(self.attributes.get(&(entity, attribute)).cloned())
    }
}

struct FailingCursor {
    inner: VecCursor,
    remaining: usize,
}

impl Cursor for FailingCursor {
    fn next_row(&mut self) -> Result<Option<RawRow>> {
        if self.remaining == 0 {
            return Err(Error::source("connection lost mid-scan"));
        }
        self.remaining -= 1;
        self.inner.next_row()
    }
}
