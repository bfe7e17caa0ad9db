//! snb-topk - streaming top-k analytics over a social-network benchmark dataset
//!
//! Five ranked queries share one single-pass kernel: an ordered scan is cut
//! into per-entity groups, each group is folded into an aggregate that is
//! immune to join fan-out, and a bounded heap keeps only the k best entities
//! before they are enriched by point lookup.
//!
//! # Quick Start
//!
//! ```ignore
//! use snb_topk::{ClosenessParams, MemorySource, Workload};
//!
//! let workload = Workload::new(MemorySource::new());
//! let closest = workload.closeness(&ClosenessParams::new(933, "Chen"))?;
//! ```
//!
//! # Architecture
//!
//! - `snb-core`: ids, rows, the source contracts and the error taxonomy
//! - `snb-rank`: group reader, partial aggregator, bounded heap, materializer
//! - `snb-queries`: the five queries and their configuration
//!
//! [`Workload`] binds one source to one [`QueryConfig`] and runs each query
//! with its configured limit. It adds no ranking behavior of its own.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub use snb_core::{
    Attribute, Column, Cursor, EntityId, Error, ErrorCategory, Limit, MemorySource, PointLookup,
    QueryKind, RawRow, Result, RowSource, ScanRequest, TagId, Value,
};
pub use snb_queries::{
    closeness, country_pair, expert_search, forum_posts, friend_recommendation, Affiliation,
    ClassMembers, ClosenessParams, ClosenessResult, CountryPairParams, CountryPairResult,
    ExpertSearchParams, ExpertSearchResult, ForumPostsParams, ForumPostsResult,
    FriendRecommendationParams, FriendRecommendationResult, QueryConfig, QueryLimits,
    TagClassIndex, TagClassPredicate, CONFIG_FILE_NAME,
};
pub use snb_rank::{BoundedHeap, ScanStats};

use std::path::Path;
use tracing::info;

/// One source plus the limits to query it with
#[derive(Debug)]
pub struct Workload<S> {
    source: S,
    config: QueryConfig,
}

impl<S> Workload<S>
where
    S: RowSource + PointLookup,
{
    /// Bind `source` with the standard limits
    pub fn new(source: S) -> Self {
        Self::with_config(source, QueryConfig::default())
    }

    /// Bind `source` with explicit limits
    pub fn with_config(source: S, config: QueryConfig) -> Self {
        Workload { source, config }
    }

    /// Bind `source` with the limits in `dir`/`snb.toml`
    ///
    /// A default file is written first if none exists.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file cannot be written, read or
    /// parsed.
    pub fn open<P: AsRef<Path>>(source: S, dir: P) -> Result<Self> {
        let path = dir.as_ref().join(CONFIG_FILE_NAME);
        QueryConfig::write_default_if_missing(&path)?;
        let config = QueryConfig::from_file(&path)?;
        info!(target: "snb::workload", path = %path.display(), "Workload configured");
        Ok(Self::with_config(source, config))
    }

    /// The bound source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The active configuration
    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Limit used for `query`
    pub fn limit(&self, query: QueryKind) -> Limit {
        self.config.limit(query)
    }

    /// Change the limit used for `query`
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLimit`] for zero or negative `k`; the previous
    /// limit stays in place.
    pub fn set_limit(&mut self, query: QueryKind, k: i64) -> Result<()> {
        let k = Limit::try_from(k)?;
        let limits = &mut self.config.limits;
        match query {
            QueryKind::Closeness => limits.closeness = k,
            QueryKind::CountryPair => limits.country_pair = k,
            QueryKind::ForumPosts => limits.forum_posts = k,
            QueryKind::FriendRecommendation => limits.friend_recommendation = k,
            QueryKind::ExpertSearch => limits.expert_search = k,
        }
        Ok(())
    }

    /// People sharing a first name, closest first
    pub fn closeness(&self, params: &ClosenessParams) -> Result<Vec<ClosenessResult>> {
        closeness::top_k(&self.source, params, self.limit(QueryKind::Closeness))
    }

    /// People posting in two countries, most messages first
    pub fn country_pair(&self, params: &CountryPairParams) -> Result<Vec<CountryPairResult>> {
        country_pair::top_k(&self.source, params, self.limit(QueryKind::CountryPair))
    }

    /// Recently joined forums, most friends' posts first
    pub fn forum_posts(&self, params: &ForumPostsParams) -> Result<Vec<ForumPostsResult>> {
        forum_posts::top_k(&self.source, params, self.limit(QueryKind::ForumPosts))
    }

    /// Friends of friends, best common-interest score first
    pub fn friend_recommendation(
        &self,
        params: &FriendRecommendationParams,
    ) -> Result<Vec<FriendRecommendationResult>> {
        friend_recommendation::top_k(
            &self.source,
            params,
            self.limit(QueryKind::FriendRecommendation),
        )
    }

    /// Friends replying within a tag class, most replies first
    pub fn expert_search<P>(
        &self,
        params: &ExpertSearchParams,
        within_class: &P,
    ) -> Result<Vec<ExpertSearchResult>>
    where
        P: TagClassPredicate + ?Sized,
    {
        expert_search::top_k(
            &self.source,
            params,
            within_class,
            self.limit(QueryKind::ExpertSearch),
        )
    }
}
