//! Row source contracts
//!
//! The relational store behind the queries is an external collaborator. The
//! kernel reaches it through two narrow traits:
//! - [`RowSource`]: open one ordered scan for a [`ScanRequest`]
//! - [`PointLookup`]: fetch one attribute of one entity by id
//!
//! Neither trait requires `Send` or `Sync`. A query invocation owns its
//! cursor and runs on one thread; parallel workloads run independent
//! invocations, each against its own source handle.

use crate::error::Result;
use crate::request::ScanRequest;
use crate::row::RawRow;
use crate::types::EntityId;
use crate::value::Value;
use std::fmt;

/// Descriptive attributes available through [`PointLookup`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    /// Person first name (text)
    FirstName,
    /// Person last name (text)
    LastName,
    /// Person gender (text)
    Gender,
    /// Person birthday, epoch milliseconds (integer)
    Birthday,
    /// Person creation date, epoch milliseconds (integer)
    CreationDate,
    /// Browser the person signed up with (text)
    BrowserUsed,
    /// Person IP address (text)
    LocationIp,
    /// Person email addresses (list of text)
    Emails,
    /// Languages the person speaks (list of text)
    Languages,
    /// Name of the city the person lives in (text)
    City,
    /// Universities attended: list of `[name, class year, city]` lists
    Universities,
    /// Employers: list of `[name, work-from year, country]` lists
    Companies,
    /// Tags the person is interested in (id set)
    Interests,
    /// Forum title (text)
    ForumTitle,
    /// Tag name (text)
    TagName,
}

impl Attribute {
    /// Stable snake_case name
    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::FirstName => "first_name",
            Attribute::LastName => "last_name",
            Attribute::Gender => "gender",
            Attribute::Birthday => "birthday",
            Attribute::CreationDate => "creation_date",
            Attribute::BrowserUsed => "browser_used",
            Attribute::LocationIp => "location_ip",
            Attribute::Emails => "emails",
            Attribute::Languages => "languages",
            Attribute::City => "city",
            Attribute::Universities => "universities",
            Attribute::Companies => "companies",
            Attribute::Interests => "interests",
            Attribute::ForumTitle => "forum_title",
            Attribute::TagName => "tag_name",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A forward-only cursor over one scan
pub trait Cursor {
    /// Next row, or `None` once the scan is exhausted
    ///
    /// # Errors
    ///
    /// Returns an error if the source fails mid-scan. The cursor must not be
    /// polled again after an error.
    fn next_row(&mut self) -> Result<Option<RawRow>>;
}

impl<C: Cursor + ?Sized> Cursor for Box<C> {
    fn next_row(&mut self) -> Result<Option<RawRow>> {
        (**self).next_row()
    }
}

/// Opens ordered scans
pub trait RowSource {
    /// Open the scan for `request`
    ///
    /// Rows must arrive in the order documented on the request variant.
    ///
    /// # Errors
    ///
    /// Returns an error if the scan cannot be started.
    fn open(&self, request: &ScanRequest) -> Result<Box<dyn Cursor + '_>>;
}

/// Point lookups by entity id
pub trait PointLookup {
    /// Fetch one attribute of one entity
    ///
    /// Returns `Ok(None)` if the store has no such value.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup itself fails.
    fn lookup(&self, entity: EntityId, attribute: Attribute) -> Result<Option<Value>>;
}

impl<S: RowSource + ?Sized> RowSource for &S {
    fn open(&self, request: &ScanRequest) -> Result<Box<dyn Cursor + '_>> {
        (**self).open(request)
    }
}

impl<L: PointLookup + ?Sized> PointLookup for &L {
    fn lookup(&self, entity: EntityId, attribute: Attribute) -> Result<Option<Value>> {
        (**self).lookup(entity, attribute)
    }
}

/// Cursor over an in-memory vector of rows
pub struct VecCursor {
    rows: std::vec::IntoIter<RawRow>,
}

impl VecCursor {
    /// Create a cursor that yields `rows` in order
    pub fn new(rows: Vec<RawRow>) -> Self {
        VecCursor {
            rows: rows.into_iter(),
        }
    }
}

impl Cursor for VecCursor {
    fn next_row(&mut self) -> Result<Option<RawRow>> {
        Ok(self.rows.next())
    }
}
