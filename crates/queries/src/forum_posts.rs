//! Forum posts
//!
//! Ranks the forums that the start person's friends joined after a given
//! date by the number of posts those friends made in them. A forum joined
//! recently but without qualifying posts still ranks, with a count of 0.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use snb_core::{
    Attribute, Column, EntityId, Limit, PointLookup, QueryKind, Result, RowSource, ScanRequest,
};
use snb_rank::{
    value_desc_then_id_desc, AggregateKind, Contribution, GroupLayout, Materializer, RankPipeline,
    ValueEntry,
};
use tracing::debug;

/// Inputs of one forum ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForumPostsParams {
    /// Start person
    pub person: EntityId,
    /// Only memberships started after this instant count
    pub min_date: DateTime<Utc>,
}

impl ForumPostsParams {
    /// Create parameters
    pub fn new(person: EntityId, min_date: DateTime<Utc>) -> Self {
        ForumPostsParams { person, min_date }
    }
}

/// One forum and its post count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForumPostsResult {
    /// Forum
    pub forum_id: EntityId,
    /// Forum title
    pub title: String,
    /// Distinct posts by the friends in this forum
    pub post_count: u64,
}

/// Rank up to `k` forums by friends' post count
///
/// Order: larger count first, ties to the larger forum id.
pub fn top_k<S>(source: &S, params: &ForumPostsParams, k: Limit) -> Result<Vec<ForumPostsResult>>
where
    S: RowSource + PointLookup + ?Sized,
{
    let query = QueryKind::ForumPosts;
    let cursor = source.open(&ScanRequest::ForumPosts {
        person: params.person,
        min_date: params.min_date,
    })?;
    let pipeline = RankPipeline::new(
        query,
        GroupLayout::two_level(Column::ForumId, Column::PostId),
        k,
        value_desc_then_id_desc,
    );
    let (ranked, stats) = pipeline.run(
        cursor,
        AggregateKind::Count,
        |_| Ok(Contribution::Include(None)),
        |f| Some(ValueEntry::new(f.key, f.aggregate.rank_value(), ())),
    )?;

    let results = Materializer::new(query, source).materialize(ranked, |m, entry| {
        Ok(ForumPostsResult {
            forum_id: entry.id,
            title: m.text(entry.id, Attribute::ForumTitle)?,
            post_count: u64::try_from(entry.value).unwrap_or(0),
        })
    })?;

    debug!(
        target: "snb::query",
        query = %query,
        person = params.person,
        min_date = %params.min_date,
        forums = stats.primary_groups,
        k = %k,
        results = results.len(),
        "Query ranked"
    );
    Ok(results)
}
