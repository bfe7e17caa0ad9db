//! Error types for snb-topk
//!
//! This module defines all error types used throughout the workspace.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Every variant belongs to exactly one [`ErrorCategory`]:
//! - Source: the row source failed or delivered data the kernel cannot use
//! - Consistency: a point lookup came back empty for an id that survived ranking
//! - Parameter: the caller asked for something invalid (checked before scanning)
//! - Config: the configuration file could not be used

use crate::request::QueryKind;
use crate::row::Column;
use crate::traits::Attribute;
use crate::types::EntityId;
use std::io;
use thiserror::Error;

/// Result type alias for snb-topk operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for snb-topk
#[derive(Debug, Error)]
pub enum Error {
    /// The row source failed to open a scan or to produce the next row
    #[error("Source error: {0}")]
    Source(String),

    /// A row is missing a column or carries a value of the wrong type
    #[error("Malformed row: column {column} {reason}")]
    MalformedRow {
        /// Column that could not be read
        column: Column,
        /// What was wrong with it
        reason: String,
    },

    /// The primary grouping key went backwards
    #[error("Unordered source for {query}: primary key {current} follows {previous}")]
    UnorderedSource {
        /// Query whose scan was out of order
        query: QueryKind,
        /// Primary key of the previous row
        previous: EntityId,
        /// Primary key of the offending row
        current: EntityId,
    },

    /// A point lookup returned a value of the wrong shape
    #[error("Malformed attribute {attribute} for entity {entity}: expected {expected}")]
    MalformedAttribute {
        /// Entity that was looked up
        entity: EntityId,
        /// Attribute that was looked up
        attribute: Attribute,
        /// Shape the caller needed
        expected: &'static str,
    },

    /// A point lookup found nothing for an id that survived ranking
    #[error("Missing attribute {attribute} for entity {entity}")]
    MissingAttribute {
        /// Entity that was looked up
        entity: EntityId,
        /// Attribute that was looked up
        attribute: Attribute,
    },

    /// Requested result capacity is zero or negative
    #[error("Invalid limit: {0} (must be at least 1)")]
    InvalidLimit(i64),

    /// A query parameter is out of range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Configuration could not be read, parsed or validated
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error (configuration files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Row source scan or lookup failure, including malformed data
    Source,
    /// The source broke the identity guarantees the kernel depends on
    Consistency,
    /// Rejected before any scan was opened
    Parameter,
    /// Configuration loading failure
    Config,
}

impl Error {
    /// Create a source error from anything displayable
    pub fn source(msg: impl Into<String>) -> Self {
        Error::Source(msg.into())
    }

    /// Create a malformed-row error
    pub fn malformed(column: Column, reason: impl Into<String>) -> Self {
        Error::MalformedRow {
            column,
            reason: reason.into(),
        }
    }

    /// Create an invalid-parameter error
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Error::InvalidParameter(msg.into())
    }

    /// Which part of the taxonomy this error belongs to
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Source(_)
            | Error::MalformedRow { .. }
            | Error::MalformedAttribute { .. } => ErrorCategory::Source,
            Error::UnorderedSource { .. } | Error::MissingAttribute { .. } => {
                ErrorCategory::Consistency
            }
            Error::InvalidLimit(_) | Error::InvalidParameter(_) => ErrorCategory::Parameter,
            Error::Config(_) | Error::Io(_) => ErrorCategory::Config,
        }
    }
}
