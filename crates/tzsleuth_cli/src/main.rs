//! tzsleuth CLI - collect timestamped activity for a GitHub account.

mod commands;
mod config;
mod progress;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::Term;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::commands::activity::ActivityArgs;
use crate::commands::profile::ProfileArgs;

#[derive(Parser)]
#[command(name = "tzsleuth")]
#[command(version)]
#[command(about = "Collect timestamped activity for a GitHub account")]
#[command(
    long_about = "tzsleuth gathers as many timestamped actions (commits, pull requests, \
issues, comments, gists, stars, events) for one account as a small request budget allows. \
It uses GraphQL when a token is available, falls back to REST, and reads links from the \
public profile page when the bio has none."
)]
#[command(after_long_help = r#"EXAMPLES
    Collect activity anonymously (REST only):
        $ tzsleuth activity octocat --anonymous

    Aim for more data points and emit JSON:
        $ tzsleuth activity octocat --target 400 --output json > octocat.json

    Show a profile:
        $ tzsleuth profile octocat

    Generate shell completions:
        $ tzsleuth completions bash > ~/.local/share/bash-completion/completions/tzsleuth

CONFIGURATION
    tzsleuth reads configuration from:
      1. ~/.config/tzsleuth/config.toml (or $XDG_CONFIG_HOME/tzsleuth/config.toml)
      2. ./tzsleuth.toml
      3. Environment variables (TZSLEUTH_ prefix, e.g., TZSLEUTH_GITHUB__TOKEN)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    TZSLEUTH_TOKEN            GitHub token for this invocation
    TZSLEUTH_GITHUB__TOKEN    GitHub token (config layer)
    GITHUB_TOKEN              Used when no other token is configured
    RUST_LOG                  Log filter for non-interactive output
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect activity records for an account
    Activity(ActivityArgs),
    /// Show an account profile
    Profile(ProfileArgs),
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
    /// Generate man page(s)
    Man {
        /// Output directory for man pages (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Structured logging only when stdout is not a terminal
    if !Term::stdout().is_term() {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new("tzsleuth=info,tzsleuth_cli=info"),
        };

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    let config = config::Config::load();
    let cli = Cli::parse();

    let cancel = CancellationToken::new();

    match cli.command {
        Commands::Activity(args) => {
            shutdown::setup_shutdown_handler(cancel.clone());
            commands::activity::handle_activity(args, &config, &cancel).await?;
        }
        Commands::Profile(args) => {
            shutdown::setup_shutdown_handler(cancel.clone());
            commands::profile::handle_profile(args, &config, &cancel).await?;
        }
        Commands::Completions { shell } => {
            commands::meta::handle_completions(shell)?;
        }
        Commands::Man { output } => {
            commands::meta::handle_man(output.as_deref())?;
        }
    }

    Ok(())
}
