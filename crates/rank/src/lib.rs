//! Streaming top-k rank aggregation
//!
//! This crate is the single-pass kernel shared by the ranked queries:
//! - GroupReader: detects primary and sub-group boundaries in an ordered scan
//! - PartialAggregator: folds rows into one entity at a time, immune to join fan-out
//! - BoundedHeap: keeps the k most desirable entries and drains them in order
//! - RankPipeline: wires the three together over one cursor
//! - Materializer: enriches drained entries by point lookup
//!
//! Memory is bounded by k entries plus the state of the one open entity.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod aggregator;
pub mod group_reader;
pub mod heap;
pub mod materializer;
pub mod order;
pub mod pipeline;

pub use aggregator::{Aggregate, AggregateKind, Finalized, PartialAggregator};
pub use group_reader::{GroupEvent, GroupKey, GroupLayout, GroupReader, ReaderStats};
pub use heap::BoundedHeap;
pub use materializer::Materializer;
pub use order::{
    cmp_ignore_case, distance_then_surname_then_id_desc, value_desc_then_id_desc, DesiredOrder,
    DistanceEntry, ValueEntry,
};
pub use pipeline::{Contribution, RankPipeline, ScanStats};
