use std::io::Write;

use anyhow::{Context, bail};
use chrono::Utc;
use clap::Args;

use mt_core::{Event, EventKind, MoodUpdate, project};
use mt_db::Database;

use super::util::validate_mood;

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Id (creation timestamp) of the mood to amend
    id: String,

    /// New mood on the 0 to 10 scale
    #[arg(long)]
    mood: Option<f64>,

    /// New description, replacing the old one
    #[arg(long)]
    description: Option<String>,
}

pub fn run<W: Write>(writer: &mut W, db: &mut Database, args: &EditArgs) -> anyhow::Result<()> {
    if args.mood.is_none() && args.description.is_none() {
        bail!("nothing to change, pass --mood and/or --description");
    }
    if let Some(mood) = args.mood {
        validate_mood(mood)?;
    }

    // The log is shared between devices, so an id we have never seen may
    // still exist elsewhere. Warn instead of refusing.
    let events = db.list_events().context("failed to read the event log")?;
    if project(&events).moods.get(&args.id).is_none() {
        tracing::warn!(id = %args.id, "editing a mood this database does not know");
    }

    let event = Event {
        created_at: Utc::now(),
        kind: EventKind::MoodUpdate(MoodUpdate {
            id: args.id.clone(),
            mood: args.mood,
            description: args.description.clone(),
        }),
    };
    db.insert_events(std::slice::from_ref(&event))
        .context("failed to store the event")?;

    writeln!(writer, "Updated mood {}", args.id)?;
    Ok(())
}
