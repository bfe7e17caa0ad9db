//! Phase-change group reader
//!
//! Turns an ordered row stream into group-boundary events by comparing each
//! row's key to the previous row's key. Nothing is buffered beyond the key
//! of the previous row.
//!
//! Two-level layouts (an entity owning zero or more child records) must cope
//! with the outer-join sentinel: a child key that is NULL or zero means "no
//! child record". The reader normalizes it to `None`, so:
//! - an entity whose only row is a sentinel still opens its own primary
//!   group (and closes the previous one) but starts no sub-group;
//! - a sentinel row inside an entity that already has children never starts
//!   a phantom sub-group.

use snb_core::{child_key, Column, Cursor, EntityId, Error, QueryKind, RawRow, Result};

/// Which columns define the grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupLayout {
    /// Primary grouping column (the ranked entity)
    pub primary: Column,
    /// Optional sub-grouping column (the entity's child record)
    pub sub: Option<Column>,
}

impl GroupLayout {
    /// One level: rows grouped by `primary` only
    pub fn single(primary: Column) -> Self {
        GroupLayout { primary, sub: None }
    }

    /// Two levels: rows grouped by `primary`, then by the nullable `sub`
    pub fn two_level(primary: Column, sub: Column) -> Self {
        GroupLayout {
            primary,
            sub: Some(sub),
        }
    }
}

/// Key of the group a row belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupKey {
    /// Primary entity
    pub primary: EntityId,
    /// Child record, `None` for single-level layouts and sentinel rows
    pub child: Option<EntityId>,
}

/// One step of the group reader
#[derive(Debug, Clone, PartialEq)]
pub enum GroupEvent {
    /// Row continues the current primary group and sub-group
    SameGroup(RawRow),
    /// Row starts a new child record within the current primary group
    NewSubGroup(RawRow),
    /// Row starts a new primary group; the previous one (if any) is complete
    NewPrimaryGroup(RawRow),
    /// The stream is exhausted; the last primary group (if any) is complete
    EndOfStream,
}

impl GroupEvent {
    /// The row carried by this event
    pub fn row(&self) -> Option<&RawRow> {
        match self {
            GroupEvent::SameGroup(row)
            | GroupEvent::NewSubGroup(row)
            | GroupEvent::NewPrimaryGroup(row) => Some(row),
            GroupEvent::EndOfStream => None,
        }
    }
}

/// Counters kept by the reader
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderStats {
    /// Rows pulled from the cursor
    pub rows: u64,
    /// Primary groups opened
    pub primary_groups: u64,
    /// Child key transitions, sentinels excluded
    ///
    /// Equals the number of distinct children only when rows arrive ordered
    /// by (primary, child); a child that reappears after another one within
    /// the same primary group is counted again.
    pub sub_groups: u64,
}

/// Pulls rows from a cursor and classifies group transitions
pub struct GroupReader<C> {
    query: QueryKind,
    cursor: C,
    layout: GroupLayout,
    current: Option<GroupKey>,
    open_child: Option<EntityId>,
    finished: bool,
    stats: ReaderStats,
}

impl<C: Cursor> GroupReader<C> {
    /// Create a reader over `cursor`
    pub fn new(query: QueryKind, cursor: C, layout: GroupLayout) -> Self {
        GroupReader {
            query,
            cursor,
            layout,
            current: None,
            open_child: None,
            finished: false,
            stats: ReaderStats::default(),
        }
    }

    /// Key of the most recently returned row
    ///
    /// The child is the row's own (normalized) child key, so a sentinel row
    /// reports `None` even inside a populated group.
    pub fn current_key(&self) -> Option<GroupKey> {
        self.current
    }

    /// Counters so far
    pub fn stats(&self) -> ReaderStats {
        self.stats
    }

    /// Pull the next row and classify it
    ///
    /// After `EndOfStream` every further call returns `EndOfStream` without
    /// touching the cursor.
    ///
    /// # Errors
    ///
    /// Propagates cursor errors, rejects rows whose key columns are missing
    /// or mistyped, and returns [`Error::UnorderedSource`] if the primary key
    /// decreases.
    pub fn next_event(&mut self) -> Result<GroupEvent> {
        if self.finished {
            return Ok(GroupEvent::EndOfStream);
        }
        let row = match self.cursor.next_row()? {
            Some(row) => row,
            None => {
                self.finished = true;
                return Ok(GroupEvent::EndOfStream);
            }
        };
        let key = self.key_of(&row)?;
        self.stats.rows += 1;

        let current = self.current;
        let event = match current {
            None => self.open_primary(row, key),
            Some(prev) if key.primary < prev.primary => {
                return Err(Error::UnorderedSource {
                    query: self.query,
                    previous: prev.primary,
                    current: key.primary,
                });
            }
            Some(prev) if key.primary != prev.primary => self.open_primary(row, key),
            Some(_) => match key.child {
                Some(child) if self.open_child != Some(child) => {
                    self.open_child = Some(child);
                    self.stats.sub_groups += 1;
                    GroupEvent::NewSubGroup(row)
                }
                // A sentinel inside a populated group is not a child record.
                _ => GroupEvent::SameGroup(row),
            },
        };

        self.current = Some(key);
        Ok(event)
    }

    fn open_primary(&mut self, row: RawRow, key: GroupKey) -> GroupEvent {
        self.stats.primary_groups += 1;
        self.open_child = key.child;
        if key.child.is_some() {
            self.stats.sub_groups += 1;
        }
        GroupEvent::NewPrimaryGroup(row)
    }

    fn key_of(&self, row: &RawRow) -> Result<GroupKey> {
        let primary = row.id(self.layout.primary)?;
        let child = match self.layout.sub {
            Some(column) => child_key(row.nullable_id(column)?),
            None => None,
        };
        Ok(GroupKey { primary, child })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snb_core::VecCursor;

    fn row(person: EntityId, post: Option<EntityId>) -> RawRow {
        RawRow::new()
            .with(Column::PersonId, person)
            .with(Column::PostId, post)
    }

    fn reader(rows: Vec<RawRow>) -> GroupReader<VecCursor> {
        GroupReader::new(
            QueryKind::FriendRecommendation,
            VecCursor::new(rows),
            GroupLayout::two_level(Column::PersonId, Column::PostId),
        )
    }

    fn kinds(reader: &mut GroupReader<VecCursor>) -> Vec<&'static str> {
        let mut out = Vec::new();
        loop {
            let kind = match reader.next_event().unwrap() {
                GroupEvent::SameGroup(_) => "same",
                GroupEvent::NewSubGroup(_) => "sub",
                GroupEvent::NewPrimaryGroup(_) => "primary",
                GroupEvent::EndOfStream => break,
            };
            out.push(kind);
        }
        out
    }

    #[test]
    fn test_empty_stream_is_end_of_stream() {
        let mut r = reader(vec![]);
        assert_eq!(r.next_event().unwrap(), GroupEvent::EndOfStream);
        assert_eq!(r.next_event().unwrap(), GroupEvent::EndOfStream);
        assert_eq!(r.stats(), ReaderStats::default());
    }

    #[test]
    fn test_two_level_transitions() {
        let mut r = reader(vec![
            row(1, Some(10)),
            row(1, Some(10)),
            row(1, Some(11)),
            row(2, Some(20)),
        ]);
        assert_eq!(kinds(&mut r), vec!["primary", "same", "sub", "primary"]);
        let stats = r.stats();
        assert_eq!(stats.rows, 4);
        assert_eq!(stats.primary_groups, 2);
        assert_eq!(stats.sub_groups, 3);
    }

    #[test]
    fn test_sentinel_only_entity_between_populated_entities() {
        let mut r = reader(vec![
            row(1, Some(10)),
            row(2, None),
            row(3, Some(30)),
        ]);
        assert_eq!(kinds(&mut r), vec!["primary", "primary", "primary"]);
        assert_eq!(r.stats().primary_groups, 3);
        assert_eq!(r.stats().sub_groups, 2);
    }

    #[test]
    fn test_consecutive_sentinel_entities_are_separate_groups() {
        let mut r = reader(vec![row(1, None), row(2, Some(0)), row(3, None)]);
        assert_eq!(kinds(&mut r), vec!["primary", "primary", "primary"]);
        assert_eq!(r.stats().sub_groups, 0);
    }

    #[test]
    fn test_sentinel_after_sentinel_with_same_post_id_zero() {
        // Both entities carry child key zero; only the primary key differs.
        let mut r = reader(vec![row(5, Some(0)), row(6, Some(0))]);
        assert_eq!(kinds(&mut r), vec!["primary", "primary"]);
    }

    #[test]
    fn test_stray_sentinel_does_not_split_child() {
        let mut r = reader(vec![row(1, Some(10)), row(1, None), row(1, Some(10))]);
        assert_eq!(kinds(&mut r), vec!["primary", "same", "same"]);
        assert_eq!(r.stats().sub_groups, 1);
    }

    #[test]
    fn test_sub_groups_count_transitions_not_distinct_children() {
        let mut r = reader(vec![row(1, Some(10)), row(1, Some(11)), row(1, Some(10))]);
        assert_eq!(kinds(&mut r), vec!["primary", "sub", "sub"]);
        assert_eq!(r.stats().sub_groups, 3);
    }

    #[test]
    fn test_single_level_layout_ignores_children() {
        let mut r = GroupReader::new(
            QueryKind::Closeness,
            VecCursor::new(vec![row(1, Some(1)), row(1, Some(2)), row(4, Some(3))]),
            GroupLayout::single(Column::PersonId),
        );
        assert_eq!(kinds(&mut r), vec!["primary", "same", "primary"]);
        assert_eq!(r.stats().sub_groups, 0);
    }

    #[test]
    fn test_decreasing_primary_key_is_rejected() {
        let mut r = reader(vec![row(5, Some(1)), row(4, Some(2))]);
        assert!(r.next_event().is_ok());
        let err = r.next_event().unwrap_err();
        assert!(matches!(
            err,
            Error::UnorderedSource {
                previous: 5,
                current: 4,
                ..
            }
        ));
    }

    #[test]
    fn test_missing_primary_column_is_malformed() {
        let mut r = reader(vec![RawRow::new().with(Column::PostId, 3i64)]);
        assert!(matches!(
            r.next_event(),
            Err(Error::MalformedRow {
                column: Column::PersonId,
                ..
            })
        ));
    }

    #[test]
    fn test_current_key_tracks_last_row() {
        let mut r = reader(vec![row(1, Some(10)), row(1, Some(0))]);
        r.next_event().unwrap();
        assert_eq!(
            r.current_key(),
            Some(GroupKey {
                primary: 1,
                child: Some(10)
            })
        );
        r.next_event().unwrap();
        assert_eq!(
            r.current_key(),
            Some(GroupKey {
                primary: 1,
                child: None
            })
        );
    }

    #[test]
    fn test_event_exposes_row() {
        let mut r = reader(vec![row(9, Some(90))]);
        let event = r.next_event().unwrap();
        assert_eq!(event.row().unwrap().id(Column::PersonId).unwrap(), 9);
        assert!(GroupEvent::EndOfStream.row().is_none());
    }
}
