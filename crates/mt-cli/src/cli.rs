use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::{delete, edit, events, import, log, settings, stats, status, sync};

/// Event-sourced mood and meditation tracker.
#[derive(Debug, Parser)]
#[command(name = "mt", version, about)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Path to a configuration file, layered over the default one
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Record a mood or meditation
    Log(log::LogArgs),
    /// Amend an existing mood entry
    Edit(edit::EditArgs),
    /// Remove an entry
    Delete(delete::DeleteArgs),
    /// Import events from JSON lines on stdin
    Import(import::ImportArgs),
    /// Dump stored events as JSON lines
    Events(events::EventsArgs),
    /// Aggregate views over the history
    Stats(stats::StatsArgs),
    /// Synchronize with the remote API
    Sync(sync::SyncArgs),
    /// Manage account settings
    Settings(settings::SettingsArgs),
    /// Show database and sync status
    Status(status::StatusArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
