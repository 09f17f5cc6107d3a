//! Settings command: local preferences and the remote email digest.
//!
//! Location recording is a local setting persisted in the database and
//! reconciled during sync. The weekly email digest lives on the server
//! only, so toggling it needs a configured API token.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Subcommand, ValueEnum};

use mt_api::ApiClient;
use mt_core::{Settings, format_timestamp};
use mt_db::Database;

use crate::Config;

#[derive(Debug, Args)]
pub struct SettingsArgs {
    #[command(subcommand)]
    action: SettingsAction,
}

#[derive(Debug, Subcommand)]
enum SettingsAction {
    /// Print the current settings
    Show,
    /// Toggle location recording on new moods
    Location { state: Toggle },
    /// Toggle the weekly email digest on the server
    WeeklyEmails { state: Toggle },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Toggle {
    On,
    Off,
}

impl Toggle {
    const fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

const fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    config: &Config,
    args: &SettingsArgs,
) -> Result<()> {
    match &args.action {
        SettingsAction::Show => show(writer, db, config),
        SettingsAction::Location { state } => set_location(writer, db, *state),
        SettingsAction::WeeklyEmails { state } => set_weekly_emails(writer, config, *state),
    }
}

fn show<W: Write>(writer: &mut W, db: &Database, config: &Config) -> Result<()> {
    let settings = db.settings()?;
    let record_location = settings
        .as_ref()
        .is_some_and(|settings| settings.record_location);

    writeln!(writer, "Location recording: {}", on_off(record_location))?;
    if let Some(settings) = &settings {
        writeln!(writer, "Updated:            {}", settings.updated_at)?;
    }
    writeln!(writer, "Weekly emails:      {}", weekly_emails_status(config))?;
    Ok(())
}

/// Queries the digest state from the server; degrades to a placeholder
/// when there is no token or the request fails.
fn weekly_emails_status(config: &Config) -> String {
    let Some(token) = config
        .api_token
        .as_deref()
        .map(str::trim)
        .filter(|token| !token.is_empty())
    else {
        return "(requires an API token)".to_string();
    };

    let status = ApiClient::new(config.api_url.clone(), token)
        .map_err(anyhow::Error::from)
        .and_then(|client| {
            let runtime = tokio::runtime::Runtime::new()?;
            Ok(runtime.block_on(client.weekly_emails_enabled())?)
        });
    match status {
        Ok(enabled) => on_off(enabled).to_string(),
        Err(error) => {
            tracing::warn!(error = %error, "failed to query weekly email settings");
            "(unavailable)".to_string()
        }
    }
}

fn set_location<W: Write>(writer: &mut W, db: &mut Database, state: Toggle) -> Result<()> {
    let settings = Settings {
        updated_at: format_timestamp(Utc::now()),
        record_location: state.is_on(),
    };
    db.put_settings(&settings)?;
    writeln!(
        writer,
        "Location recording is now {}.",
        on_off(settings.record_location)
    )?;
    Ok(())
}

fn set_weekly_emails<W: Write>(writer: &mut W, config: &Config, state: Toggle) -> Result<()> {
    let token = config
        .api_token
        .as_deref()
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| anyhow::anyhow!("missing API token (set MT_API_TOKEN or config.toml)"))?;
    let client = ApiClient::new(config.api_url.clone(), token)?;

    let runtime = tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;
    match state {
        Toggle::On => runtime.block_on(client.enable_weekly_emails())?,
        Toggle::Off => runtime.block_on(client.disable_weekly_emails())?,
    }
    writeln!(writer, "Weekly emails are now {}.", on_off(state.is_on()))?;
    Ok(())
}
