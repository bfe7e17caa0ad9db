//! Ranked social-network queries
//!
//! Each module exposes one `top_k` entry point over a [`RowSource`] that also
//! answers [`PointLookup`]s:
//! - closeness: people sharing a first name, by distance
//! - country_pair: people posting in two countries, by message count
//! - forum_posts: recently joined forums, by friends' post count
//! - friend_recommendation: friends of friends, by common-interest score
//! - expert_search: friends replying within a tag class, by reply count
//!
//! Parameters are validated and the limit is a [`Limit`], so nothing invalid
//! reaches the source. Results come back in ranked order, fully materialized.
//!
//! [`RowSource`]: snb_core::RowSource
//! [`PointLookup`]: snb_core::PointLookup
//! [`Limit`]: snb_core::Limit

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod closeness;
pub mod config;
pub mod country_pair;
pub mod expert_search;
pub mod forum_posts;
pub mod friend_recommendation;

pub use closeness::{Affiliation, ClosenessParams, ClosenessResult};
pub use config::{QueryConfig, QueryLimits, CONFIG_FILE_NAME};
pub use country_pair::{CountryPairParams, CountryPairResult};
pub use expert_search::{
    ClassMembers, ExpertSearchParams, ExpertSearchResult, TagClassIndex, TagClassPredicate,
};
pub use forum_posts::{ForumPostsParams, ForumPostsResult};
pub use friend_recommendation::{FriendRecommendationParams, FriendRecommendationResult};
