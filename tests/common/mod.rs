//! Shared fixtures for the workload integration suites.
//!
//! Import via `mod common;`.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use snb_topk::{Attribute, Column, EntityId, MemorySource, QueryKind, RawRow, TagClassIndex, Value};
use std::collections::BTreeSet;
use std::sync::Once;

// ============================================================================
// Initialization
// ============================================================================

static INIT_TRACING: Once = Once::new();

/// Route `tracing` output to the test harness so `--nocapture` shows it.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

// ============================================================================
// Dataset
// ============================================================================

/// Start person of every scan in the fixture.
pub const START: EntityId = 1;

/// First country of the country pair scan.
pub const SPAIN: EntityId = 40;
/// Second country of the country pair scan.
pub const PERU: EntityId = 50;

/// Tag class containing tag 100 (through a subclass) but not tag 200.
pub const CLASS: &str = "MusicalArtist";

pub fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

pub fn tag_classes() -> TagClassIndex {
    TagClassIndex::new()
        .with_class(1, "Artist", None)
        .with_class(2, CLASS, Some(1))
        .with_class(3, "SoloArtist", Some(2))
        .with_class(9, "Country", None)
        .with_tag(100, 3)
        .with_tag(101, 2)
        .with_tag(200, 9)
}

fn person(src: MemorySource, id: EntityId, first: &str, last: &str) -> MemorySource {
    src.with_person(id, first, last, if id % 2 == 0 { "female" } else { "male" }, "Lima")
        .with_attribute(id, Attribute::Birthday, 600_000_000_000i64 + id)
        .with_attribute(id, Attribute::CreationDate, 1_300_000_000_000i64 + id)
        .with_attribute(id, Attribute::BrowserUsed, "Chrome")
        .with_attribute(id, Attribute::LocationIp, format!("10.0.0.{}", id))
        .with_attribute(id, Attribute::Languages, vec![Value::from("es"), Value::from("en")])
}

fn closeness_row(id: EntityId, distance: i64, last: &str) -> RawRow {
    RawRow::new()
        .with(Column::PersonId, id)
        .with(Column::Distance, distance)
        .with(Column::LastName, last)
}

fn message_row(id: EntityId, message: EntityId, country: EntityId) -> RawRow {
    RawRow::new()
        .with(Column::PersonId, id)
        .with(Column::MessageId, message)
        .with(Column::CountryId, country)
}

fn forum_row(forum: EntityId, post: Option<EntityId>) -> RawRow {
    RawRow::new()
        .with(Column::ForumId, forum)
        .with(Column::PostId, post)
}

fn post_row(id: EntityId, post: Option<EntityId>, tag: Option<EntityId>) -> RawRow {
    RawRow::new()
        .with(Column::PersonId, id)
        .with(Column::PostId, post)
        .with(Column::TagId, tag)
}

fn reply_row(id: EntityId, comment: EntityId, tag: EntityId) -> RawRow {
    RawRow::new()
        .with(Column::PersonId, id)
        .with(Column::CommentId, comment)
        .with(Column::TagId, tag)
}

/// Small dataset with one scan per query and a profile for every person.
pub fn dataset() -> MemorySource {
    let src = MemorySource::new()
        .with_rows(
            QueryKind::Closeness,
            vec![
                closeness_row(2, 1, "Smith"),
                closeness_row(3, 2, "adams"),
                closeness_row(3, 3, "adams"),
                closeness_row(4, 2, "Brown"),
                closeness_row(5, 3, "Adams"),
            ],
        )
        .with_rows(
            QueryKind::CountryPair,
            vec![
                message_row(2, 20, SPAIN),
                message_row(2, 21, PERU),
                message_row(3, 30, SPAIN),
                message_row(3, 31, SPAIN),
                message_row(4, 40, SPAIN),
                message_row(4, 41, PERU),
                message_row(4, 42, PERU),
            ],
        )
        .with_rows(
            QueryKind::ForumPosts,
            vec![
                forum_row(10, Some(1000)),
                forum_row(11, None),
                forum_row(12, Some(1200)),
                forum_row(12, Some(1201)),
                forum_row(13, Some(1300)),
            ],
        )
        .with_rows(
            QueryKind::FriendRecommendation,
            vec![
                post_row(3, Some(300), Some(7)),
                post_row(3, Some(300), Some(8)),
                post_row(3, Some(301), Some(7)),
                post_row(4, None, None),
                post_row(5, Some(500), Some(8)),
            ],
        )
        .with_rows(
            QueryKind::ExpertSearch,
            vec![
                reply_row(2, 70, 100),
                reply_row(2, 70, 101),
                reply_row(2, 71, 200),
                reply_row(4, 80, 100),
                reply_row(4, 81, 101),
                reply_row(5, 90, 200),
            ],
        )
        .with_attribute(START, Attribute::Interests, BTreeSet::from([7i64]))
        .with_attribute(10, Attribute::ForumTitle, "Wall of Smith")
        .with_attribute(11, Attribute::ForumTitle, "Group for Salsa")
        .with_attribute(12, Attribute::ForumTitle, "Album 2 of Brown")
        .with_attribute(13, Attribute::ForumTitle, "Wall of Adams")
        .with_attribute(100, Attribute::TagName, "Shakira")
        .with_attribute(101, Attribute::TagName, "Juanes")
        .with_attribute(200, Attribute::TagName, "Peru");

    let src = person(src, 2, "Ana", "Smith");
    let src = person(src, 3, "Ana", "adams");
    let src = person(src, 4, "Ana", "Brown");
    person(src, 5, "Ana", "Adams")
}
