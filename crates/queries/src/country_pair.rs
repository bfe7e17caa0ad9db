//! Country pair
//!
//! Ranks friends and friends of friends living outside two countries by the
//! messages they created inside both of them within a time window. Only
//! people with at least one message in each country rank.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use snb_core::{
    is_sentinel, Attribute, Column, EntityId, Error, Limit, PointLookup, QueryKind, Result,
    RowSource, ScanRequest,
};
use snb_rank::{
    value_desc_then_id_desc, Aggregate, AggregateKind, Contribution, GroupLayout, Materializer,
    RankPipeline, ValueEntry,
};
use tracing::debug;

/// Inputs of one country pair ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryPairParams {
    /// Start person
    pub person: EntityId,
    /// First country
    pub country_x: EntityId,
    /// Second country
    pub country_y: EntityId,
    /// Window start (inclusive)
    pub start: DateTime<Utc>,
    /// Window end (exclusive)
    pub end: DateTime<Utc>,
}

impl CountryPairParams {
    /// Create parameters from a start instant and a length in days
    pub fn with_duration(
        person: EntityId,
        country_x: EntityId,
        country_y: EntityId,
        start: DateTime<Utc>,
        days: u32,
    ) -> Self {
        CountryPairParams {
            person,
            country_x,
            country_y,
            start,
            end: start + Duration::days(i64::from(days)),
        }
    }

    fn validate(&self) -> Result<()> {
        if is_sentinel(self.country_x) || is_sentinel(self.country_y) {
            return Err(Error::invalid_parameter("country id 0 names no country"));
        }
        if self.country_x == self.country_y {
            return Err(Error::invalid_parameter(format!(
                "countries must differ, both are {}",
                self.country_x
            )));
        }
        if self.start > self.end {
            return Err(Error::invalid_parameter(format!(
                "window start {} is after its end {}",
                self.start, self.end
            )));
        }
        Ok(())
    }
}

/// One person and their message counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryPairResult {
    /// Person
    pub person_id: EntityId,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Messages created in the first country
    pub x_count: u64,
    /// Messages created in the second country
    pub y_count: u64,
    /// Both counts together
    pub count: u64,
}

/// Rank up to `k` people by messages in the two countries
///
/// Order: larger combined count first, ties to the larger person id.
///
/// # Errors
///
/// Rejects a sentinel or repeated country and an inverted window before
/// touching the source.
pub fn top_k<S>(source: &S, params: &CountryPairParams, k: Limit) -> Result<Vec<CountryPairResult>>
where
    S: RowSource + PointLookup + ?Sized,
{
    params.validate()?;
    let query = QueryKind::CountryPair;

    let cursor = source.open(&ScanRequest::CountryPair {
        person: params.person,
        country_x: params.country_x,
        country_y: params.country_y,
        start: params.start,
        end: params.end,
    })?;
    let pipeline = RankPipeline::new(
        query,
        GroupLayout::two_level(Column::PersonId, Column::MessageId),
        k,
        value_desc_then_id_desc,
    );
    let (ranked, stats) = pipeline.run(
        cursor,
        AggregateKind::CountryPair {
            x: params.country_x,
            y: params.country_y,
        },
        |row| Ok(Contribution::Include(Some(row.id(Column::CountryId)?))),
        |f| {
            let value = f.aggregate.rank_value();
            match f.aggregate {
                Aggregate::CountryPair { x, y } if x > 0 && y > 0 => {
                    Some(ValueEntry::new(f.key, value, (x, y)))
                }
                _ => None,
            }
        },
    )?;

    let results = Materializer::new(query, source).materialize(ranked, |m, entry| {
        let (x_count, y_count) = entry.payload;
        Ok(CountryPairResult {
            person_id: entry.id,
            first_name: m.text(entry.id, Attribute::FirstName)?,
            last_name: m.text(entry.id, Attribute::LastName)?,
            x_count,
            y_count,
            count: x_count.saturating_add(y_count),
        })
    })?;

    debug!(
        target: "snb::query",
        query = %query,
        person = params.person,
        country_x = params.country_x,
        country_y = params.country_y,
        start = %params.start,
        end = %params.end,
        candidates = stats.primary_groups,
        k = %k,
        results = results.len(),
        "Query ranked"
    );
    Ok(results)
}
