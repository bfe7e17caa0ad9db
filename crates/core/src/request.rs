//! Scan requests
//!
//! A [`ScanRequest`] names the join a query needs and carries its scalar
//! inputs. How the source turns it into rows (SQL text, indexes, a graph
//! traversal) is entirely the source's business; the kernel only relies on
//! the row shape and ordering documented per variant.

use crate::types::EntityId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The ranked queries this workspace implements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    /// Friends within three steps carrying a given first name
    Closeness,
    /// Friends who posted in two given countries within a window
    CountryPair,
    /// Forums recently joined by friends, by post count
    ForumPosts,
    /// Friends of friends born near a month, by shared interests
    FriendRecommendation,
    /// Friends replying to posts tagged within a tag class
    ExpertSearch,
}

impl QueryKind {
    /// All query kinds, in benchmark order
    pub const ALL: [QueryKind; 5] = [
        QueryKind::Closeness,
        QueryKind::CountryPair,
        QueryKind::ForumPosts,
        QueryKind::FriendRecommendation,
        QueryKind::ExpertSearch,
    ];

    /// Stable snake_case name
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Closeness => "closeness",
            QueryKind::CountryPair => "country_pair",
            QueryKind::ForumPosts => "forum_posts",
            QueryKind::FriendRecommendation => "friend_recommendation",
            QueryKind::ExpertSearch => "expert_search",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of one ordered scan
#[derive(Debug, Clone, PartialEq)]
pub enum ScanRequest {
    /// Rows `(PersonId, Distance, LastName)` ordered by `(PersonId, Distance)`,
    /// one or more per person reachable within three steps whose first name
    /// matches.
    Closeness {
        /// Start person
        person: EntityId,
        /// First name to match
        first_name: String,
    },
    /// Rows `(PersonId, MessageId, CountryId)` ordered by
    /// `(PersonId, MessageId)`, one per message created inside the window in
    /// either country by a friend or friend of friend living elsewhere.
    CountryPair {
        /// Start person
        person: EntityId,
        /// First country
        country_x: EntityId,
        /// Second country
        country_y: EntityId,
        /// Window start (inclusive)
        start: DateTime<Utc>,
        /// Window end (exclusive)
        end: DateTime<Utc>,
    },
    /// Rows `(ForumId, PostId?)` ordered by `(ForumId, PostId)`; a forum with
    /// no qualifying posts appears once with a null post.
    ForumPosts {
        /// Start person
        person: EntityId,
        /// Only memberships that started after this instant count
        min_date: DateTime<Utc>,
    },
    /// Rows `(PersonId, PostId?, TagId?)` ordered by `(PersonId, PostId)`; a
    /// friend of friend without posts appears once with a null post, and a
    /// post with several tags appears once per tag.
    FriendRecommendation {
        /// Start person
        person: EntityId,
        /// Birthday month, 1 through 12
        month: u32,
    },
    /// Rows `(PersonId, CommentId, TagId)` ordered by `(PersonId, CommentId)`,
    /// one per tag of the post each friend's comment replies to.
    ExpertSearch {
        /// Start person
        person: EntityId,
    },
}

impl ScanRequest {
    /// Which query this scan serves
    pub fn kind(&self) -> QueryKind {
        match self {
            ScanRequest::Closeness { .. } => QueryKind::Closeness,
            ScanRequest::CountryPair { .. } => QueryKind::CountryPair,
            ScanRequest::ForumPosts { .. } => QueryKind::ForumPosts,
            ScanRequest::FriendRecommendation { .. } => QueryKind::FriendRecommendation,
            ScanRequest::ExpertSearch { .. } => QueryKind::ExpertSearch,
        }
    }

    /// The start person every scan is anchored on
    pub fn person(&self) -> EntityId {
        match self {
            ScanRequest::Closeness { person, .. }
            | ScanRequest::CountryPair { person, .. }
            | ScanRequest::ForumPosts { person, .. }
            | ScanRequest::FriendRecommendation { person, .. }
            | ScanRequest::ExpertSearch { person } => *person,
        }
    }
}
