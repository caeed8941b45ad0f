use tokio_util::sync::CancellationToken;
use tzsleuth::Profile;

use crate::commands::shared::{ConnectionOptions, OutputFormat, build_aggregator, print_rows};
use crate::config::Config;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ProfileArgs {
    /// Account login
    pub login: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    #[command(flatten)]
    pub connection: ConnectionOptions,
}

/// One profile field for display.
#[derive(Debug, Clone, serde::Serialize, tabled::Tabled)]
pub(crate) struct FieldRow {
    #[tabled(rename = "Field")]
    pub field: &'static str,
    #[tabled(rename = "Value")]
    pub value: String,
}

/// Populated fields of a profile, in display order.
pub(crate) fn profile_rows(profile: &Profile) -> Vec<FieldRow> {
    let date = |d: Option<chrono::DateTime<chrono::Utc>>| d.map(|d| d.format("%Y-%m-%d").to_string());
    let fields: [(&'static str, Option<String>); 11] = [
        ("Login", Some(profile.login.clone())),
        ("Name", profile.name.clone()),
        ("Bio", profile.bio.clone()),
        ("Company", profile.company.clone()),
        ("Location", profile.location.clone()),
        ("Website", profile.website.clone()),
        ("Twitter", profile.twitter_username.clone()),
        ("Profile", Some(profile.html_url.clone()).filter(|u| !u.is_empty())),
        ("Created", date(profile.created_at)),
        ("Public repos", profile.public_repos.map(|n| n.to_string())),
        ("Followers", profile.followers.map(|n| n.to_string())),
    ];
    fields
        .into_iter()
        .filter_map(|(field, value)| value.map(|value| FieldRow { field, value }))
        .collect()
}

pub(crate) async fn handle_profile(
    args: ProfileArgs,
    config: &Config,
    cancel: &CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    let aggregator = build_aggregator(&args.connection, config, |_| {})?;
    let profile = aggregator.fetch_profile(&args.login, cancel).await?;

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&profile)?),
        OutputFormat::Table => print_rows(profile_rows(&profile), OutputFormat::Table)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_rows_skip_missing_fields() {
        let profile = Profile {
            login: "octocat".to_string(),
            location: Some("San Francisco".to_string()),
            followers: Some(20),
            ..Profile::default()
        };
        let rows = profile_rows(&profile);
        let fields: Vec<&str> = rows.iter().map(|r| r.field).collect();
        assert_eq!(fields, vec!["Login", "Location", "Followers"]);
        assert_eq!(rows[1].value, "San Francisco");
    }
}
