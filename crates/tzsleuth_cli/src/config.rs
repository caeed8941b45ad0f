//! Configuration file support for tzsleuth.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `TZSLEUTH_`, sections split by `__`,
//!    e.g., `TZSLEUTH_GITHUB__TOKEN`, `TZSLEUTH_AGGREGATE__PER_PAGE`)
//! 3. Config file (~/.config/tzsleuth/config.toml or ./tzsleuth.toml)
//! 4. Built-in defaults
//!
//! The plain `GITHUB_TOKEN` variable is honoured when no token is configured.
//!
//! Example config file:
//! ```toml
//! [github]
//! token = "ghp_..."  # or use TZSLEUTH_GITHUB__TOKEN / GITHUB_TOKEN
//! api_url = "https://api.github.com"
//! graphql_url = "https://api.github.com/graphql"
//! web_url = "https://github.com"
//!
//! [aggregate]
//! target = 200
//! per_page = 100
//! requests_per_second = 10
//! no_rate_limit = false
//! enrich = true
//! timeout_secs = 30
//! ```

use std::path::PathBuf;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;
use tzsleuth::AggregatorConfig;
use tzsleuth::rate_limits;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// GitHub endpoints and credential.
    pub github: GitHubConfig,
    /// Default aggregation options.
    pub aggregate: AggregateConfig,
}

/// GitHub configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// GitHub API token.
    /// Can also be set via TZSLEUTH_GITHUB__TOKEN or GITHUB_TOKEN.
    pub token: Option<String>,
    /// REST API root (GitHub Enterprise installs differ).
    pub api_url: Option<String>,
    /// GraphQL endpoint.
    pub graphql_url: Option<String>,
    /// Web root used for permalinks and profile pages.
    pub web_url: Option<String>,
}

/// Default aggregation options.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AggregateConfig {
    /// Data points to aim for before the adaptive loop stops.
    pub target: usize,
    /// Page size for every paged request.
    pub per_page: u32,
    /// Proactive request rate.
    pub requests_per_second: u32,
    /// Whether to disable proactive rate limiting.
    pub no_rate_limit: bool,
    /// Whether to scrape the profile page for links.
    pub enrich: bool,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            target: tzsleuth::config::DEFAULT_TARGET_DATA_POINTS,
            per_page: tzsleuth::config::DEFAULT_PER_PAGE,
            requests_per_second: rate_limits::GITHUB_DEFAULT_RPS,
            no_rate_limit: false,
            enrich: true,
            timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/tzsleuth/config.toml)
    /// 3. Local config file (./tzsleuth.toml)
    /// 4. Environment variables with TZSLEUTH_ prefix
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = Self::default_config_path()
            && path.exists()
        {
            tracing::debug!("Loading config from {:?}", path);
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
        }

        let local_config = PathBuf::from("tzsleuth.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./tzsleuth.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // e.g., TZSLEUTH_GITHUB__TOKEN -> github.token
        builder = builder.add_source(
            Environment::with_prefix("TZSLEUTH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to build config: {}", e);
                Config::default()
            }
        }
    }

    /// Get the GitHub token, falling back to the plain `GITHUB_TOKEN` variable.
    pub fn github_token(&self) -> Option<String> {
        self.github
            .token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
    }

    /// Library configuration with these settings applied.
    pub fn aggregator_config(&self) -> AggregatorConfig {
        let mut config = AggregatorConfig::default();

        if let Some(url) = &self.github.api_url {
            config.endpoints.api_base_url = url.clone();
        }
        if let Some(url) = &self.github.graphql_url {
            config.endpoints.graphql_url = url.clone();
        }
        if let Some(url) = &self.github.web_url {
            config.endpoints.web_base_url = url.clone();
        }
        config.endpoints.request_timeout_secs = self.aggregate.timeout_secs;

        config.pagination.target_data_points = self.aggregate.target;
        config.pagination.per_page = self.aggregate.per_page;
        config.enrichment.enabled = self.aggregate.enrich;
        config.requests_per_second =
            (!self.aggregate.no_rate_limit).then_some(self.aggregate.requests_per_second);

        config
    }

    /// Path of the XDG config file.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "tzsleuth").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
