use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tzsleuth::AggregationProgress;

/// Spinner-based reporter for terminals.
pub struct InteractiveReporter {
    bar: ProgressBar,
}

impl InteractiveReporter {
    pub fn new() -> Self {
        Self::with_bar(ProgressBar::new_spinner())
    }

    /// Reporter that draws nowhere.
    #[cfg(test)]
    pub fn hidden() -> Self {
        Self::with_bar(ProgressBar::with_draw_target(
            None,
            indicatif::ProgressDrawTarget::hidden(),
        ))
    }

    fn with_bar(bar: ProgressBar) -> Self {
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    pub fn handle(&self, event: AggregationProgress) {
        match event {
            AggregationProgress::Started {
                login,
                authenticated,
            } => {
                let mode = if authenticated {
                    "authenticated"
                } else {
                    "anonymous"
                };
                self.bar
                    .set_message(format!("Collecting activity for {login} ({mode})"));
            }

            AggregationProgress::TierSelected { protocol } => {
                self.bar.println(format!(
                    "{} Structured data via {}",
                    style("→").cyan(),
                    protocol
                ));
            }

            AggregationProgress::FallingBack { reason } => {
                self.bar.println(format!(
                    "{} GraphQL unavailable ({}), falling back to REST",
                    style("!").yellow(),
                    reason
                ));
            }

            AggregationProgress::SourceStarted { source } => {
                self.bar.set_message(format!("Fetching {source}"));
            }

            AggregationProgress::GraphPaginated {
                state,
                additional_pages,
                max_pages,
            } => {
                self.bar.println(format!(
                    "{} GraphQL pagination {:?} after {}/{} extra pages",
                    style("·").dim(),
                    state,
                    additional_pages,
                    max_pages
                ));
            }

            AggregationProgress::SourceComplete { source, count } => {
                self.bar.println(format!(
                    "{} {:<14} {}",
                    style("✓").green(),
                    source.as_str(),
                    count
                ));
            }

            AggregationProgress::SourceFailed { source, message } => {
                self.bar.println(format!(
                    "{} {:<14} {}",
                    style("✗").red(),
                    source.as_str(),
                    style(message).dim()
                ));
            }

            AggregationProgress::Enriched { links } => {
                self.bar.println(format!(
                    "{} Added {} link(s) from the profile page",
                    style("+").cyan(),
                    links
                ));
            }

            AggregationProgress::Finished {
                records,
                requests,
                cache_hits,
                ..
            } => {
                self.bar.set_message(format!(
                    "{records} records from {requests} requests ({cache_hits} cached)"
                ));
            }

            _ => {}
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for InteractiveReporter {
    fn default() -> Self {
        Self::new()
    }
}
