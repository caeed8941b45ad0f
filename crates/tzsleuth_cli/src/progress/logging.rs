use tzsleuth::AggregationProgress;

/// Logging reporter using tracing for structured output.
pub struct LoggingReporter;

impl LoggingReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, event: AggregationProgress) {
        match event {
            AggregationProgress::Started {
                login,
                authenticated,
            } => {
                tracing::info!(login = %login, authenticated, "Collecting activity");
            }

            AggregationProgress::TierSelected { protocol } => {
                tracing::info!(protocol = %protocol, "Structured data tier selected");
            }

            AggregationProgress::FallingBack { reason } => {
                tracing::warn!(reason = %reason, "GraphQL unavailable, falling back to REST");
            }

            AggregationProgress::SourceStarted { source } => {
                tracing::debug!(source = %source, "Fetching source");
            }

            AggregationProgress::GraphPaginated {
                state,
                additional_pages,
                max_pages,
            } => {
                tracing::info!(state = ?state, additional_pages, max_pages, "GraphQL pagination finished");
            }

            AggregationProgress::SourceComplete { source, count } => {
                tracing::info!(source = %source, count, "Source complete");
            }

            AggregationProgress::SourceFailed { source, message } => {
                tracing::warn!(source = %source, error = %message, "Source failed");
            }

            AggregationProgress::Enriched { links } => {
                tracing::info!(links, "Profile links added");
            }

            AggregationProgress::Finished {
                records,
                warnings,
                requests,
                cache_hits,
            } => {
                tracing::info!(records, warnings, requests, cache_hits, "Aggregation finished");
            }

            _ => {}
        }
    }
}

impl Default for LoggingReporter {
    fn default() -> Self {
        Self::new()
    }
}
