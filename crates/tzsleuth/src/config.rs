//! Aggregator configuration.
//!
//! Every field has a default, so an empty TOML table or `{}` deserializes to
//! the standard public GitHub setup.

use serde::{Deserialize, Serialize};

use crate::pagination::BudgetTiers;
use crate::rate_limit::rate_limits;

/// Default page size for REST endpoints and graph connections.
pub const DEFAULT_PER_PAGE: u32 = 100;
/// Default number of activity data points considered "enough".
pub const DEFAULT_TARGET_DATA_POINTS: usize = 200;
/// Default bound on the HTML profile page body.
pub const DEFAULT_MAX_PROFILE_BYTES: usize = 2 * 1024 * 1024;

/// Top-level aggregator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    pub endpoints: EndpointConfig,
    pub pagination: PaginationConfig,
    pub enrichment: EnrichmentConfig,
    /// Proactive request pacing. `None` disables the limiter.
    pub requests_per_second: Option<u32>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            endpoints: EndpointConfig::default(),
            pagination: PaginationConfig::default(),
            enrichment: EnrichmentConfig::default(),
            requests_per_second: Some(rate_limits::GITHUB_DEFAULT_RPS),
        }
    }
}

/// Where requests go and how they identify themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// REST API root, without a trailing slash.
    pub api_base_url: String,
    /// Graph query endpoint.
    pub graphql_url: String,
    /// Web root used for permalinks and the profile page.
    pub web_base_url: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.github.com".to_string(),
            graphql_url: "https://api.github.com/graphql".to_string(),
            web_base_url: "https://github.com".to_string(),
            user_agent: format!("tzsleuth/{}", env!("CARGO_PKG_VERSION")),
            request_timeout_secs: 30,
        }
    }
}

impl EndpointConfig {
    /// Web root with exactly one trailing slash, as used for repository
    /// extraction.
    pub fn web_prefix(&self) -> String {
        format!("{}/", self.web_base_url.trim_end_matches('/'))
    }

    pub(crate) fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url.trim_end_matches('/'), path)
    }

    pub(crate) fn web_url(&self, path: &str) -> String {
        format!("{}{}", self.web_base_url.trim_end_matches('/'), path)
    }
}

/// Page sizes, the adaptive budget and per-source hard caps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub per_page: u32,
    /// Data points after which the adaptive loop stops early.
    pub target_data_points: usize,
    pub budget: BudgetTiers,
    pub events_max_pages: u32,
    /// Cap for REST pull request and issue search.
    pub search_max_pages: u32,
    /// Total commit-search pages, including the first.
    pub commit_max_pages: u32,
    pub gist_max_pages: u32,
    pub star_max_pages: u32,
    pub repo_max_pages: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            per_page: DEFAULT_PER_PAGE,
            target_data_points: DEFAULT_TARGET_DATA_POINTS,
            budget: BudgetTiers::default(),
            events_max_pages: 3,
            search_max_pages: 2,
            commit_max_pages: 5,
            gist_max_pages: 2,
            star_max_pages: 2,
            repo_max_pages: 1,
        }
    }
}

/// Profile-page enrichment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    pub enabled: bool,
    pub max_profile_bytes: usize,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_profile_bytes: DEFAULT_MAX_PROFILE_BYTES,
        }
    }
}
