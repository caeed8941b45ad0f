//! Progress reporting for aggregation runs.
//!
//! Two modes:
//! - Interactive mode (TTY): a spinner using indicatif
//! - Logging mode (non-TTY): structured logging using tracing

mod interactive;
mod logging;

use std::sync::Arc;

use console::Term;
use tzsleuth::{AggregationProgress, ProgressCallback};

pub use interactive::InteractiveReporter;
pub use logging::LoggingReporter;

/// Renders aggregation progress as a spinner on a terminal, as log lines elsewhere.
pub enum ProgressReporter {
    /// Interactive spinner for TTY.
    Interactive(InteractiveReporter),
    /// One tracing event per progress event.
    Logging(LoggingReporter),
}

impl ProgressReporter {
    /// Pick the spinner when stdout is a terminal.
    pub fn new() -> Self {
        if Term::stdout().is_term() {
            Self::Interactive(InteractiveReporter::new())
        } else {
            Self::Logging(LoggingReporter::new())
        }
    }

    /// Render one event.
    pub fn handle(&self, event: AggregationProgress) {
        match self {
            Self::Interactive(r) => r.handle(event),
            Self::Logging(r) => r.handle(event),
        }
    }

    /// Convert to a callback for the library.
    pub fn as_callback(self: &Arc<Self>) -> ProgressCallback {
        let reporter = Arc::clone(self);
        Box::new(move |event| reporter.handle(event))
    }

    /// Finish the spinner (interactive mode only).
    pub fn finish(&self) {
        if let Self::Interactive(r) = self {
            r.finish();
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tzsleuth::DataSource;

    #[test]
    fn test_callback_forwards_to_logging_reporter() {
        let reporter = Arc::new(ProgressReporter::Logging(LoggingReporter::new()));
        let callback = reporter.as_callback();
        callback(AggregationProgress::SourceStarted {
            source: DataSource::Events,
        });
        callback(AggregationProgress::Finished {
            records: 3,
            warnings: 0,
            requests: 4,
            cache_hits: 1,
        });
        reporter.finish();
    }

    #[test]
    fn test_interactive_reporter_handles_full_run() {
        let reporter = ProgressReporter::Interactive(InteractiveReporter::hidden());
        reporter.handle(AggregationProgress::Started {
            login: "octocat".to_string(),
            authenticated: false,
        });
        reporter.handle(AggregationProgress::SourceFailed {
            source: DataSource::Gists,
            message: "HTTP 404: Not Found".to_string(),
        });
        reporter.handle(AggregationProgress::SourceComplete {
            source: DataSource::Commits,
            count: 12,
        });
        reporter.finish();
    }
}
