use clap::ValueEnum;
use console::style;
use tzsleuth::{ActivityAggregator, ClientContext, is_valid_token};

use crate::config::Config;

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Display as a formatted table (default)
    #[default]
    Table,
    /// Display as JSON
    Json,
}

/// Options shared by every command that talks to GitHub.
#[derive(Debug, Clone, Default, clap::Args)]
pub(crate) struct ConnectionOptions {
    /// GitHub token (overrides config and environment)
    #[arg(short = 't', long, env = "TZSLEUTH_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Ignore any configured token and query anonymously
    #[arg(short = 'A', long, conflicts_with = "token")]
    pub anonymous: bool,

    /// Disable proactive rate limiting (may cause API throttling)
    #[arg(short = 'R', long)]
    pub no_rate_limit: bool,
}

/// Resolve the token: flag, then config/environment, unless anonymous.
pub(crate) fn resolve_token(opts: &ConnectionOptions, config: &Config) -> Option<String> {
    if opts.anonymous {
        return None;
    }
    let token = opts.token.clone().or_else(|| config.github_token())?;
    if !is_valid_token(token.trim()) {
        tracing::warn!("Configured token is malformed; continuing without authentication");
        eprintln!(
            "{} Ignoring malformed token; results will be limited to public REST data.",
            style("warning:").yellow().bold()
        );
        return None;
    }
    Some(token.trim().to_string())
}

/// Build an aggregator from the loaded config and command-line options.
pub(crate) fn build_aggregator(
    opts: &ConnectionOptions,
    config: &Config,
    customize: impl FnOnce(&mut tzsleuth::AggregatorConfig),
) -> Result<ActivityAggregator, Box<dyn std::error::Error>> {
    let mut lib_config = config.aggregator_config();
    if opts.no_rate_limit {
        lib_config.requests_per_second = None;
    }
    customize(&mut lib_config);

    let token = resolve_token(opts, config);
    let ctx = ClientContext::builder()
        .config(lib_config)
        .token(token.as_deref())
        .build()?;
    Ok(ActivityAggregator::new(ctx))
}

/// Print rows as a rounded table or as pretty JSON.
pub(crate) fn print_rows<T>(rows: Vec<T>, format: OutputFormat) -> Result<(), serde_json::Error>
where
    T: tabled::Tabled + serde::Serialize,
{
    match format {
        OutputFormat::Table => {
            let mut table = tabled::Table::new(rows);
            table.with(tabled::settings::Style::rounded());
            println!("{table}");
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
    }
    Ok(())
}

/// Shorten a string for table display.
pub(crate) fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut out: String = value.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}
