//! Core types and traits for snb-topk
//!
//! This crate defines the foundational types used throughout the workspace:
//! - EntityId, Limit: dataset identifiers and validated top-k capacity
//! - Value, RawRow, Column: typed rows delivered by a scan
//! - ScanRequest, QueryKind: what a query asks the row source for
//! - RowSource, Cursor, PointLookup, Attribute: the external source contracts
//! - Error: error taxonomy (source, consistency, parameter, config)
//! - MemorySource: scripted in-memory source for tests and demos

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod memory;
pub mod request;
pub mod row;
pub mod traits;
pub mod types;
pub mod value;

// Re-export commonly used types and traits
pub use error::{Error, ErrorCategory, Result};
pub use memory::MemorySource;
pub use request::{QueryKind, ScanRequest};
pub use row::{Column, RawRow};
pub use traits::{Attribute, Cursor, PointLookup, RowSource, VecCursor};
pub use types::{child_key, is_sentinel, EntityId, Limit, TagId};
pub use value::Value;
