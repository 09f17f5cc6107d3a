use std::io::Write;

use anyhow::Context;
use chrono::Utc;
use clap::{Args, Subcommand};

use mt_core::{Event, EventKind, Meditation, Mood};
use mt_db::Database;

use super::util::validate_mood;

#[derive(Debug, Args)]
pub struct LogArgs {
    #[command(subcommand)]
    entry: LogEntry,
}

#[derive(Debug, Subcommand)]
enum LogEntry {
    /// Record how you feel right now
    Mood {
        /// Mood on the 0 to 10 scale
        #[arg(long)]
        mood: f64,
        /// Free-text notes; words become tags in the statistics
        #[arg(long)]
        description: Option<String>,
    },
    /// Record a finished meditation session
    Meditation {
        /// Session length in seconds
        #[arg(long)]
        seconds: u32,
    },
}

pub fn run<W: Write>(writer: &mut W, db: &mut Database, args: &LogArgs) -> anyhow::Result<()> {
    let event = match &args.entry {
        LogEntry::Mood { mood, description } => {
            validate_mood(*mood)?;
            Event {
                created_at: Utc::now(),
                kind: EventKind::MoodCreate(Mood {
                    mood: *mood,
                    description: description.clone(),
                    updated_at: None,
                }),
            }
        }
        LogEntry::Meditation { seconds } => Event {
            created_at: Utc::now(),
            kind: EventKind::MeditationCreate(Meditation { seconds: *seconds }),
        },
    };

    let id = event.id();
    db.insert_events(std::slice::from_ref(&event))
        .context("failed to store the event")?;

    match &event.kind {
        EventKind::MoodCreate(mood) => writeln!(writer, "Logged mood {} as {id}", mood.mood)?,
        _ => writeln!(writer, "Logged meditation as {id}")?,
    }
    Ok(())
}
