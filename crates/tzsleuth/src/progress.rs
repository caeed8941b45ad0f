//! Progress reporting for aggregation runs.
//!
//! The aggregator emits [`AggregationProgress`] events through an optional
//! callback so front ends can render progress without the library knowing
//! how.

use std::fmt;

use serde::Serialize;

use crate::pagination::PaginationState;

/// Which query surface served a piece of data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    Graph,
    Rest,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Protocol::Graph => "graphql",
            Protocol::Rest => "rest",
        })
    }
}

/// Logical data source the aggregator pulls from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Profile,
    PullRequests,
    Issues,
    Comments,
    Events,
    Commits,
    Gists,
    Stars,
    Repositories,
    ProfilePage,
}

impl DataSource {
    pub fn as_str(self) -> &'static str {
        match self {
            DataSource::Profile => "profile",
            DataSource::PullRequests => "pull_requests",
            DataSource::Issues => "issues",
            DataSource::Comments => "comments",
            DataSource::Events => "events",
            DataSource::Commits => "commits",
            DataSource::Gists => "gists",
            DataSource::Stars => "stars",
            DataSource::Repositories => "repositories",
            DataSource::ProfilePage => "profile_page",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress events emitted during one aggregation call.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum AggregationProgress {
    /// Aggregation started for a subject.
    Started {
        login: String,
        /// Whether a usable credential is configured.
        authenticated: bool,
    },

    /// The structured-data tier was chosen.
    TierSelected { protocol: Protocol },

    /// The graph tier failed on its first call; falling back to REST.
    FallingBack { reason: String },

    /// Started fetching a source.
    SourceStarted { source: DataSource },

    /// The adaptive graph loop finished.
    GraphPaginated {
        state: PaginationState,
        additional_pages: u32,
        max_pages: u32,
    },

    /// Finished a source.
    SourceComplete { source: DataSource, count: usize },

    /// A source failed; the failure is kept as a warning.
    SourceFailed { source: DataSource, message: String },

    /// Profile-page enrichment added links to the bio.
    Enriched { links: usize },

    /// Aggregation finished.
    Finished {
        records: usize,
        warnings: usize,
        requests: u64,
        cache_hits: u64,
    },
}

/// Callback type for progress reporting.
pub type ProgressCallback = Box<dyn Fn(AggregationProgress) + Send + Sync>;

/// Helper to emit progress events.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: AggregationProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}
