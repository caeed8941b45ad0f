use std::sync::Arc;

use chrono::FixedOffset;
use console::style;
use tokio_util::sync::CancellationToken;
use tzsleuth::{ActivityRecord, ActivityReport};

use crate::commands::shared::{
    ConnectionOptions, OutputFormat, build_aggregator, print_rows, truncate,
};
use crate::config::Config;
use crate::progress::ProgressReporter;

/// Longest link shown in the table.
const MAX_LINK_CHARS: usize = 72;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ActivityArgs {
    /// Account login to collect activity for
    pub login: String,

    /// Data points to aim for (default from config or 200)
    #[arg(short = 'T', long)]
    pub target: Option<usize>,

    /// Don't scrape the profile page for links
    #[arg(long)]
    pub no_enrich: bool,

    /// Show at most this many records in table output
    #[arg(short = 'l', long)]
    pub limit: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    #[command(flatten)]
    pub connection: ConnectionOptions,
}

/// One record for display.
#[derive(Debug, Clone, serde::Serialize, tabled::Tabled)]
pub(crate) struct RecordRow {
    #[tabled(rename = "When")]
    pub when: String,
    #[tabled(rename = "Kind")]
    pub kind: String,
    #[tabled(rename = "Repository")]
    pub repository: String,
    #[tabled(rename = "Link")]
    pub link: String,
}

impl RecordRow {
    /// Local time when the source kept the author's offset, UTC otherwise.
    pub(crate) fn from_record(record: &ActivityRecord) -> Self {
        let when = match record
            .utc_offset_seconds()
            .and_then(FixedOffset::east_opt)
        {
            Some(offset) => record
                .timestamp()
                .with_timezone(&offset)
                .format("%Y-%m-%d %H:%M %:z")
                .to_string(),
            None => record.timestamp().format("%Y-%m-%d %H:%M UTC").to_string(),
        };
        Self {
            when,
            kind: record.kind().to_string(),
            repository: record.repository().unwrap_or("-").to_string(),
            link: truncate(record.provenance(), MAX_LINK_CHARS),
        }
    }
}

pub(crate) async fn handle_activity(
    args: ActivityArgs,
    config: &Config,
    cancel: &CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    let aggregator = build_aggregator(&args.connection, config, |c| {
        if let Some(target) = args.target {
            c.pagination.target_data_points = target;
        }
        if args.no_enrich {
            c.enrichment.enabled = false;
        }
    })?;

    let reporter = Arc::new(ProgressReporter::new());
    let callback = reporter.as_callback();
    let result = aggregator
        .fetch_activity_with_progress(&args.login, cancel, Some(&callback))
        .await;
    reporter.finish();
    let report = result?;

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Table => print_report(&report, args.limit)?,
    }
    Ok(())
}

fn print_report(report: &ActivityReport, limit: Option<usize>) -> Result<(), serde_json::Error> {
    let mut records: Vec<&ActivityRecord> = report.records.iter().collect();
    records.sort_by_key(|r| std::cmp::Reverse(r.timestamp()));
    let shown = limit.unwrap_or(records.len()).min(records.len());
    let rows: Vec<RecordRow> = records[..shown]
        .iter()
        .map(|r| RecordRow::from_record(r))
        .collect();
    print_rows(rows, OutputFormat::Table)?;

    println!(
        "{} {} records ({} shown) via {} · {} requests, {:.0}% cached",
        style("Σ").bold(),
        report.records.len(),
        shown,
        report.protocol,
        report.stats.requests,
        report.stats.hit_ratio() * 100.0
    );
    if let Some(profile) = &report.profile
        && let Some(location) = &profile.location
    {
        println!("{} Location: {}", style("⌂").bold(), location);
    }
    for warning in &report.warnings {
        eprintln!(
            "{} {}: {}",
            style("warning:").yellow().bold(),
            warning.source,
            warning.message
        );
    }
    Ok(())
}
