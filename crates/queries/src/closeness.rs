//! Closeness
//!
//! Ranks people within three steps of the start person who share a given
//! first name, closest first. A person reachable along several paths appears
//! once per path in the scan; only the shortest distance counts.
//!
//! The scan already carries the surname, which is a tie-break field, so
//! entries are built straight from the rows and the descriptive profile is
//! looked up only for the survivors.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use snb_core::{
    Attribute, Column, EntityId, Error, Limit, PointLookup, QueryKind, RawRow, Result, RowSource,
    ScanRequest, Value,
};
use snb_rank::{
    distance_then_surname_then_id_desc, DistanceEntry, GroupLayout, Materializer, RankPipeline,
};
use tracing::debug;

/// Inputs of one closeness ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosenessParams {
    /// Start person
    pub person: EntityId,
    /// First name to match
    pub first_name: String,
}

impl ClosenessParams {
    /// Create parameters
    pub fn new(person: EntityId, first_name: impl Into<String>) -> Self {
        ClosenessParams {
            person,
            first_name: first_name.into(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.first_name.trim().is_empty() {
            return Err(Error::invalid_parameter("first name is empty"));
        }
        Ok(())
    }
}

/// A study or work place: `[name, year, place]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Affiliation {
    /// University or company name
    pub name: String,
    /// Class year or work-from year
    pub year: i64,
    /// City (universities) or country (companies)
    pub place: String,
}

/// One matching person and their profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosenessResult {
    /// Person
    pub person_id: EntityId,
    /// Last name
    pub last_name: String,
    /// Shortest distance from the start person
    pub distance: u32,
    /// Birthday
    pub birthday: DateTime<Utc>,
    /// When the profile was created
    pub creation_date: DateTime<Utc>,
    /// Gender
    pub gender: String,
    /// Browser used
    pub browser_used: String,
    /// IP address
    pub location_ip: String,
    /// Email addresses
    pub emails: Vec<String>,
    /// Spoken languages
    pub languages: Vec<String>,
    /// Name of the city the person lives in
    pub city: String,
    /// Universities attended
    pub universities: Vec<Affiliation>,
    /// Employers
    pub companies: Vec<Affiliation>,
}

/// Rank up to `k` people named `first_name` by distance
///
/// Order: smaller distance first, then surname ascending ignoring case,
/// ties to the larger person id.
///
/// # Errors
///
/// Rejects an empty first name before touching the source. Source and
/// consistency errors abort the call.
pub fn top_k<S>(source: &S, params: &ClosenessParams, k: Limit) -> Result<Vec<ClosenessResult>>
where
    S: RowSource + PointLookup + ?Sized,
{
    params.validate()?;
    let query = QueryKind::Closeness;

    let cursor = source.open(&ScanRequest::Closeness {
        person: params.person,
        first_name: params.first_name.clone(),
    })?;
    let pipeline = RankPipeline::new(
        query,
        GroupLayout::single(Column::PersonId),
        k,
        distance_then_surname_then_id_desc,
    );
    let (ranked, stats) = pipeline.fold(cursor, entry_of, |current, candidate| {
        if candidate.distance < current.distance {
            *current = candidate;
        }
    })?;

    let results = Materializer::new(query, source).materialize(ranked, |m, entry| {
        let id = entry.id;
        let birthday = m.int(id, Attribute::Birthday)?;
        let creation_date = m.int(id, Attribute::CreationDate)?;
        let universities = m.optional_list(id, Attribute::Universities)?;
        let companies = m.optional_list(id, Attribute::Companies)?;
        Ok(ClosenessResult {
            person_id: id,
            last_name: entry.last_name,
            distance: entry.distance,
            birthday: instant(id, Attribute::Birthday, birthday)?,
            creation_date: instant(id, Attribute::CreationDate, creation_date)?,
            gender: m.text(id, Attribute::Gender)?,
            browser_used: m.text(id, Attribute::BrowserUsed)?,
            location_ip: m.text(id, Attribute::LocationIp)?,
            emails: m.text_list(id, Attribute::Emails)?,
            languages: m.text_list(id, Attribute::Languages)?,
            city: m.text(id, Attribute::City)?,
            universities: affiliations(id, Attribute::Universities, universities)?,
            companies: affiliations(id, Attribute::Companies, companies)?,
        })
    })?;

    debug!(
        target: "snb::query",
        query = %query,
        person = params.person,
        first_name = %params.first_name,
        rows = stats.rows,
        offered = stats.offered,
        evicted = stats.evicted,
        k = %k,
        results = results.len(),
        "Query ranked"
    );
    Ok(results)
}

fn entry_of(row: &RawRow) -> Result<DistanceEntry> {
    let distance = row.int(Column::Distance)?;
    let distance = u32::try_from(distance)
        .map_err(|_| Error::malformed(Column::Distance, format!("is out of range: {}", distance)))?;
    Ok(DistanceEntry {
        id: row.id(Column::PersonId)?,
        distance,
        last_name: row.text(Column::LastName)?.to_string(),
    })
}

/// Epoch milliseconds to an instant
fn instant(entity: EntityId, attribute: Attribute, millis: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or(Error::MalformedAttribute {
            entity,
            attribute,
            expected: "epoch milliseconds",
        })
}

fn affiliations(
    entity: EntityId,
    attribute: Attribute,
    items: Vec<Value>,
) -> Result<Vec<Affiliation>> {
    let malformed = || Error::MalformedAttribute {
        entity,
        attribute,
        expected: "list of [name, year, place]",
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::List(parts) => match parts.as_slice() {
                [Value::Text(name), Value::Int(year), Value::Text(place)] => Ok(Affiliation {
                    name: name.clone(),
                    year: *year,
                    place: place.clone(),
                }),
                _ => Err(malformed()),
            },
            _ => Err(malformed()),
        })
        .collect()
}
