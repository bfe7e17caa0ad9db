//! Scan-to-ranking pipeline
//!
//! Wires the group reader, the entity state and the bounded heap into one
//! pass. Rows are folded into the open entity. Each primary-group boundary
//! closes it and offers the result to the heap, which is drained once the
//! scan ends.

use crate::aggregator::{AggregateKind, Finalized, PartialAggregator};
use crate::group_reader::{GroupEvent, GroupKey, GroupLayout, GroupReader};
use crate::heap::BoundedHeap;
use crate::order::DesiredOrder;
use snb_core::{Cursor, EntityId, Limit, QueryKind, RawRow, Result};
use tracing::debug;

/// What a row contributes to its entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contribution {
    /// Ignore the row entirely (it fails the query's predicate)
    Skip,
    /// Fold the row's child key and this attribute into the entity
    Include(Option<EntityId>),
}

/// Counters for one ranked scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Rows pulled from the source
    pub rows: u64,
    /// Primary groups seen
    pub primary_groups: u64,
    /// Child key transitions, see [`crate::ReaderStats::sub_groups`]
    pub sub_groups: u64,
    /// Entries offered to the heap
    pub offered: u64,
    /// Entries evicted from the heap
    pub evicted: u64,
}

/// One configured ranking pass
///
/// The pass is either an aggregation ([`RankPipeline::run`]), where rows fold
/// into a [`PartialAggregator`], or a plain fold ([`RankPipeline::fold`]),
/// where each row builds a candidate entry and candidates of the same entity
/// merge. Both share one scan loop, one heap and one scan summary.
#[derive(Clone)]
pub struct RankPipeline<T> {
    query: QueryKind,
    layout: GroupLayout,
    limit: Limit,
    desired: DesiredOrder<T>,
}

impl<T> RankPipeline<T> {
    /// Configure a pass
    pub fn new(
        query: QueryKind,
        layout: GroupLayout,
        limit: Limit,
        desired: DesiredOrder<T>,
    ) -> Self {
        RankPipeline {
            query,
            layout,
            limit,
            desired,
        }
    }

    /// Aggregate `cursor` with `kind` and return the surviving entries in
    /// desired order
    ///
    /// `contribution` decides, per row, whether and with which attribute the
    /// row is folded in. `to_entry` turns a finalized aggregate into a heap
    /// entry, or drops the entity by returning `None`.
    ///
    /// # Errors
    ///
    /// Any error from the cursor, the row accessors or the ordering checks
    /// aborts the pass; no partial result is returned.
    pub fn run<C, R, E>(
        &self,
        cursor: C,
        kind: AggregateKind,
        mut contribution: R,
        mut to_entry: E,
    ) -> Result<(Vec<T>, ScanStats)>
    where
        C: Cursor,
        R: FnMut(&RawRow) -> Result<Contribution>,
        E: FnMut(Finalized) -> Option<T>,
    {
        let mut aggregator = PartialAggregator::new(self.query, kind);
        self.scan(
            cursor,
            &mut aggregator,
            |aggregator, key, row| {
                if let Contribution::Include(attribute) = contribution(row)? {
                    aggregator.update(key.primary, key.child, attribute)?;
                }
                Ok(())
            },
            |aggregator| aggregator.finalize().and_then(&mut to_entry),
        )
    }

    /// Build one candidate per row and merge candidates of the same entity
    ///
    /// `merge(current, candidate)` updates the entity's open entry in place,
    /// e.g. keeping the smaller distance. Each entity is offered once, at its
    /// primary-group boundary.
    ///
    /// # Errors
    ///
    /// Same as [`RankPipeline::run`], plus any error from `build`.
    pub fn fold<C, B, M>(&self, cursor: C, mut build: B, mut merge: M) -> Result<(Vec<T>, ScanStats)>
    where
        C: Cursor,
        B: FnMut(&RawRow) -> Result<T>,
        M: FnMut(&mut T, T),
    {
        let mut open: Option<T> = None;
        self.scan(
            cursor,
            &mut open,
            |open, _, row| {
                let candidate = build(row)?;
                if let Some(current) = open.as_mut() {
                    merge(current, candidate);
                } else {
                    *open = Some(candidate);
                }
                Ok(())
            },
            |open| open.take(),
        )
    }

    fn scan<C, S, F, G>(
        &self,
        cursor: C,
        state: &mut S,
        mut step: F,
        mut close: G,
    ) -> Result<(Vec<T>, ScanStats)>
    where
        C: Cursor,
        F: FnMut(&mut S, GroupKey, &RawRow) -> Result<()>,
        G: FnMut(&mut S) -> Option<T>,
    {
        let mut reader = GroupReader::new(self.query, cursor, self.layout);
        let mut heap = BoundedHeap::new(self.limit, self.desired);

        loop {
            let row = match reader.next_event()? {
                GroupEvent::EndOfStream => break,
                GroupEvent::NewPrimaryGroup(row) => {
                    if let Some(entry) = close(state) {
                        heap.offer(entry);
                    }
                    row
                }
                GroupEvent::NewSubGroup(row) | GroupEvent::SameGroup(row) => row,
            };
            let Some(key) = reader.current_key() else {
                continue;
            };
            step(state, key, &row)?;
        }
        if let Some(entry) = close(state) {
            heap.offer(entry);
        }

        let reader_stats = reader.stats();
        let stats = ScanStats {
            rows: reader_stats.rows,
            primary_groups: reader_stats.primary_groups,
            sub_groups: reader_stats.sub_groups,
            offered: heap.offered(),
            evicted: heap.evicted(),
        };
        debug!(
            target: "snb::rank",
            query = %self.query,
            rows = stats.rows,
            primary_groups = stats.primary_groups,
            sub_groups = stats.sub_groups,
            offered = stats.offered,
            evicted = stats.evicted,
            "Scan ranked"
        );
        Ok((heap.drain(), stats))
    }
}

impl<T> std::fmt::Debug for RankPipeline<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RankPipeline")
            .field("query", &self.query)
            .field("layout", &self.layout)
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::Aggregate;
    use crate::order::{
        distance_then_surname_then_id_desc, value_desc_then_id_desc, DistanceEntry, ValueEntry,
    };
    use snb_core::{Column, Error, VecCursor};

    fn row(person: EntityId, post: Option<EntityId>, tag: Option<EntityId>) -> RawRow {
        RawRow::new()
            .with(Column::PersonId, person)
            .with(Column::PostId, post)
            .with(Column::TagId, tag)
    }

    fn posts_pipeline(query: QueryKind, k: usize) -> RankPipeline<ValueEntry<()>> {
        RankPipeline::new(
            query,
            GroupLayout::two_level(Column::PersonId, Column::PostId),
            Limit::new(k).unwrap(),
            value_desc_then_id_desc,
        )
    }

    fn score(interests: &[EntityId]) -> AggregateKind {
        AggregateKind::Score {
            interests: interests.iter().copied().collect(),
        }
    }

    fn include_tag(row: &RawRow) -> Result<Contribution> {
        Ok(Contribution::Include(row.nullable_id(Column::TagId)?))
    }

    fn score_entry(f: Finalized) -> Option<ValueEntry<()>> {
        Some(ValueEntry::new(f.key, f.aggregate.rank_value(), ()))
    }

    fn distance_row(person: EntityId, distance: i64, last_name: &str) -> RawRow {
        RawRow::new()
            .with(Column::PersonId, person)
            .with(Column::Distance, distance)
            .with(Column::LastName, last_name)
    }

    fn distance_entry(row: &RawRow) -> Result<DistanceEntry> {
        Ok(DistanceEntry {
            id: row.id(Column::PersonId)?,
            distance: row.int(Column::Distance)? as u32,
            last_name: row.text(Column::LastName)?.to_string(),
        })
    }

    fn keep_closer(current: &mut DistanceEntry, candidate: DistanceEntry) {
        if candidate.distance < current.distance {
            *current = candidate;
        }
    }

    fn distance_pipeline(k: usize) -> RankPipeline<DistanceEntry> {
        RankPipeline::new(
            QueryKind::Closeness,
            GroupLayout::single(Column::PersonId),
            Limit::new(k).unwrap(),
            distance_then_surname_then_id_desc,
        )
    }

    // ========================================================================
    // Aggregation
    // ========================================================================

    #[test]
    fn test_score_scenario_drops_worst() {
        // A=1: one post with a matching and a non-matching tag -> +1
        // B=2: no posts -> 0
        // C=3: one post with a non-matching tag -> -1
        let rows = vec![
            row(1, Some(100), Some(7)),
            row(1, Some(100), Some(8)),
            row(2, None, None),
            row(3, Some(300), Some(8)),
        ];
        let (entries, stats) = posts_pipeline(QueryKind::FriendRecommendation, 2)
            .run(VecCursor::new(rows), score(&[7]), include_tag, score_entry)
            .unwrap();

        let got: Vec<(EntityId, i64)> = entries.iter().map(|e| (e.id, e.value)).collect();
        assert_eq!(got, vec![(1, 1), (2, 0)]);
        assert_eq!(stats.rows, 4);
        assert_eq!(stats.primary_groups, 3);
        assert_eq!(stats.sub_groups, 2);
        assert_eq!(stats.offered, 3);
        assert_eq!(stats.evicted, 1);
    }

    #[test]
    fn test_entity_with_only_skipped_rows_is_not_offered() {
        let rows = vec![
            row(1, Some(10), Some(1)),
            row(2, Some(20), Some(2)),
            row(2, Some(21), Some(1)),
            row(3, Some(30), Some(2)),
        ];
        let (entries, stats) = posts_pipeline(QueryKind::ExpertSearch, 5)
            .run(
                VecCursor::new(rows),
                AggregateKind::CountWithAttributes,
                |r| {
                    Ok(if r.id(Column::TagId)? == 1 {
                        Contribution::Include(Some(1))
                    } else {
                        Contribution::Skip
                    })
                },
                |f| match f.aggregate {
                    Aggregate::CountWithAttributes { count, .. } => {
                        Some(ValueEntry::new(f.key, count as i64, ()))
                    }
                    _ => None,
                },
            )
            .unwrap();
        let got: Vec<(EntityId, i64)> = entries.iter().map(|e| (e.id, e.value)).collect();
        assert_eq!(got, vec![(2, 1), (1, 1)]);
        assert_eq!(stats.primary_groups, 3);
        assert_eq!(stats.offered, 2);
    }

    #[test]
    fn test_to_entry_can_drop_entities() {
        let rows = vec![row(1, Some(10), Some(7)), row(2, Some(20), Some(9))];
        let (entries, stats) = posts_pipeline(QueryKind::FriendRecommendation, 5)
            .run(VecCursor::new(rows), score(&[7]), include_tag, |f| {
                (f.aggregate.rank_value() > 0).then(|| ValueEntry::new(f.key, 1, ()))
            })
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, 1);
        assert_eq!(stats.offered, 1);
    }

    #[test]
    fn test_unordered_rows_abort() {
        let rows = vec![row(2, Some(1), None), row(1, Some(2), None)];
        let err = posts_pipeline(QueryKind::FriendRecommendation, 5)
            .run(VecCursor::new(rows), score(&[]), include_tag, score_entry)
            .unwrap_err();
        assert!(matches!(err, Error::UnorderedSource { .. }));
    }

    #[test]
    fn test_row_error_aborts() {
        let rows = vec![RawRow::new()
            .with(Column::PersonId, 1i64)
            .with(Column::PostId, 5i64)
            .with(Column::TagId, "oops")];
        let err = posts_pipeline(QueryKind::FriendRecommendation, 5)
            .run(VecCursor::new(rows), score(&[]), include_tag, score_entry)
            .unwrap_err();
        assert!(matches!(err, Error::MalformedRow { .. }));
    }

    // ========================================================================
    // Fold
    // ========================================================================

    #[test]
    fn test_fold_keeps_minimum_per_entity() {
        let rows = vec![
            distance_row(2, 3, "Kim"),
            distance_row(2, 1, "Kim"),
            distance_row(2, 2, "Kim"),
            distance_row(3, 2, "Abe"),
            distance_row(4, 2, "abe"),
        ];
        let (entries, stats) = distance_pipeline(10)
            .fold(VecCursor::new(rows), distance_entry, keep_closer)
            .unwrap();
        let got: Vec<(EntityId, u32)> = entries.iter().map(|e| (e.id, e.distance)).collect();
        // 3 and 4 tie on distance and surname; the larger id leads.
        assert_eq!(got, vec![(2, 1), (4, 2), (3, 2)]);
        assert_eq!(stats.rows, 5);
        assert_eq!(stats.primary_groups, 3);
        assert_eq!(stats.sub_groups, 0);
        assert_eq!(stats.offered, 3);
        assert_eq!(stats.evicted, 0);
    }

    #[test]
    fn test_fold_offers_each_entity_once_and_evicts() {
        let rows = vec![
            distance_row(5, 3, "Lee"),
            distance_row(5, 3, "Lee"),
            distance_row(6, 1, "Lee"),
            distance_row(7, 2, "Lee"),
        ];
        let (entries, stats) = distance_pipeline(2)
            .fold(VecCursor::new(rows), distance_entry, keep_closer)
            .unwrap();
        let ids: Vec<EntityId> = entries.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![6, 7]);
        assert_eq!(stats.offered, 3);
        assert_eq!(stats.evicted, 1);
    }

    #[test]
    fn test_fold_build_error_aborts() {
        let rows = vec![distance_row(2, 1, "Kim"), RawRow::new().with(Column::PersonId, 3i64)];
        let err = distance_pipeline(10)
            .fold(VecCursor::new(rows), distance_entry, keep_closer)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedRow {
                column: Column::Distance,
                ..
            }
        ));
    }

    #[test]
    fn test_fold_empty_scan() {
        let (entries, stats) = distance_pipeline(3)
            .fold(VecCursor::new(Vec::new()), distance_entry, keep_closer)
            .unwrap();
        assert!(entries.is_empty());
        assert_eq!(stats, ScanStats::default());
    }
}
