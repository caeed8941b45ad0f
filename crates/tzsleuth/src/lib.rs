//! tzsleuth - adaptive activity aggregation for GitHub accounts.
//!
//! Given an account login, this library collects as many timestamped user
//! actions as a small request budget allows: commits, pull requests, issues,
//! comments, gists, stars and public events. Structured data comes from the
//! GraphQL API when a credential is configured and from REST otherwise, and
//! a link-less bio is enriched from the public profile page.
//!
//! # Features
//!
//! - `scrape` (default) - HTML link extraction for profile-page enrichment.
//!   Without it enrichment still runs but finds no links unless a custom
//!   [`LinkExtractor`] is supplied.
//!
//! # Example
//!
//! ```ignore
//! use tokio_util::sync::CancellationToken;
//! use tzsleuth::{ActivityAggregator, ClientContext};
//!
//! let ctx = ClientContext::builder()
//!     .token(std::env::var("GITHUB_TOKEN").ok().as_deref())
//!     .build()?;
//! let report = ActivityAggregator::new(ctx)
//!     .fetch_activity("octocat", &CancellationToken::new())
//!     .await?;
//!
//! for record in &report.records {
//!     println!("{} {} {}", record.timestamp(), record.kind(), record.provenance());
//! }
//! ```

pub mod aggregator;
pub mod client;
pub mod config;
pub mod context;
pub mod credential;
pub mod dedup;
pub mod error;
pub mod graphql;
pub mod http;
pub mod model;
pub mod normalize;
pub mod pagination;
pub mod progress;
pub mod rate_limit;
pub mod rest;
pub mod scrape;

pub use aggregator::{ActivityAggregator, ActivityReport, AggregationWarning};
pub use client::{ApiClient, FetchStatsSnapshot};
pub use config::{AggregatorConfig, EndpointConfig, EnrichmentConfig, PaginationConfig};
pub use context::{ClientContext, ClientContextBuilder};
pub use credential::{Credential, is_valid_token, validate_login};
pub use dedup::{SeenKeySet, merge};
pub use error::{ActivityError, Result, short_error_message};
pub use http::{
    HttpError, HttpHeaders, HttpMethod, HttpRequest, HttpResponse, HttpTransport, header_get,
};
pub use model::{
    ActivityRecord, Comment, Issue, Profile, ProvenanceKey, PullRequest, Repository, SourceKind,
};
pub use normalize::extract_repository;
pub use pagination::{BudgetTier, BudgetTiers, PaginationState};
pub use progress::{AggregationProgress, DataSource, ProgressCallback, Protocol};
pub use rate_limit::{ApiRateLimiter, rate_limits};
pub use scrape::{LinkExtractor, NoopLinkExtractor};
