//! Friend recommendation
//!
//! Ranks friends of friends born around a given month by how well their
//! posts match the start person's interests. Each post scores +1 when at
//! least one of its tags is an interest and -1 otherwise, so a person
//! without posts scores 0.

use serde::{Deserialize, Serialize};
use snb_core::{
    Attribute, Column, EntityId, Error, Limit, PointLookup, QueryKind, Result, RowSource,
    ScanRequest,
};
use snb_rank::{
    value_desc_then_id_desc, AggregateKind, Contribution, GroupLayout, Materializer,
    RankPipeline, ValueEntry,
};
use tracing::debug;

/// Inputs of one friend recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendRecommendationParams {
    /// Start person
    pub person: EntityId,
    /// Birthday month, 1 through 12
    pub month: u32,
}

impl FriendRecommendationParams {
    /// Create parameters
    pub fn new(person: EntityId, month: u32) -> Self {
        FriendRecommendationParams { person, month }
    }

    fn validate(&self) -> Result<()> {
        if !(1..=12).contains(&self.month) {
            return Err(Error::invalid_parameter(format!(
                "month {} is not between 1 and 12",
                self.month
            )));
        }
        Ok(())
    }
}

/// One recommended person
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendRecommendationResult {
    /// Recommended person
    pub person_id: EntityId,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Matching posts minus non-matching posts
    pub score: i64,
    /// Gender
    pub gender: String,
    /// Name of the city the person lives in
    pub city: String,
}

/// Rank up to `k` friends of friends by common-interest score
///
/// Order: larger score first, ties to the larger person id.
///
/// # Errors
///
/// Rejects a month outside 1..=12 before touching the source. Source and
/// consistency errors abort the whole call.
pub fn top_k<S>(
    source: &S,
    params: &FriendRecommendationParams,
    k: Limit,
) -> Result<Vec<FriendRecommendationResult>>
where
    S: RowSource + PointLookup + ?Sized,
{
    params.validate()?;
    let query = QueryKind::FriendRecommendation;
    let lookups = Materializer::new(query, source);
    let interests = lookups.id_set(params.person, Attribute::Interests)?;

    let cursor = source.open(&ScanRequest::FriendRecommendation {
        person: params.person,
        month: params.month,
    })?;
    let pipeline = RankPipeline::new(
        query,
        GroupLayout::two_level(Column::PersonId, Column::PostId),
        k,
        value_desc_then_id_desc,
    );
    let (ranked, _) = pipeline.run(
        cursor,
        AggregateKind::Score {
            interests: interests.iter().copied().collect(),
        },
        |row| Ok(Contribution::Include(row.nullable_id(Column::TagId)?)),
        |f| Some(ValueEntry::new(f.key, f.aggregate.rank_value(), ())),
    )?;

    let results = lookups.materialize(ranked, |m, entry| {
        Ok(FriendRecommendationResult {
            person_id: entry.id,
            first_name: m.text(entry.id, Attribute::FirstName)?,
            last_name: m.text(entry.id, Attribute::LastName)?,
            score: entry.value,
            gender: m.text(entry.id, Attribute::Gender)?,
            city: m.text(entry.id, Attribute::City)?,
        })
    })?;

    debug!(
        target: "snb::query",
        query = %query,
        person = params.person,
        month = params.month,
        interests = interests.len(),
        k = %k,
        results = results.len(),
        "Query ranked"
    );
    Ok(results)
}
