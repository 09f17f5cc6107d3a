use std::io::Write;

use anyhow::Context;
use chrono::Utc;
use clap::{Args, Subcommand};

use mt_core::{Event, EventKind, project};
use mt_db::Database;

#[derive(Debug, Args)]
pub struct DeleteArgs {
    #[command(subcommand)]
    target: DeleteTarget,
}

#[derive(Debug, Subcommand)]
enum DeleteTarget {
    /// Delete a mood entry
    Mood {
        /// Id (creation timestamp) of the mood
        id: String,
    },
    /// Delete a meditation entry
    Meditation {
        /// Id (creation timestamp) of the meditation
        id: String,
    },
}

pub fn run<W: Write>(writer: &mut W, db: &mut Database, args: &DeleteArgs) -> anyhow::Result<()> {
    let events = db.list_events().context("failed to read the event log")?;
    let projections = project(&events);

    let (id, kind, known) = match &args.target {
        DeleteTarget::Mood { id } => (
            id,
            EventKind::MoodDelete(id.clone()),
            projections.moods.get(id).is_some(),
        ),
        DeleteTarget::Meditation { id } => (
            id,
            EventKind::MeditationDelete(id.clone()),
            projections.meditations.get(id).is_some(),
        ),
    };

    // A tombstone for an id another device created is still worth keeping.
    if !known {
        tracing::warn!(id = %id, "deleting an entry this database does not know");
    }

    let event = Event {
        created_at: Utc::now(),
        kind,
    };
    db.insert_events(std::slice::from_ref(&event))
        .context("failed to store the event")?;

    writeln!(writer, "Deleted {id}")?;
    Ok(())
}
