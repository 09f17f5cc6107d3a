//! Status command: where the data lives and how much of it there is.

use std::io::Write;

use anyhow::Result;
use clap::Args;

use mt_core::project;
use mt_db::Database;

use super::sync::SyncState;
use crate::{Config, config};

#[derive(Debug, Args)]
pub struct StatusArgs {}

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    config: &Config,
    _args: &StatusArgs,
) -> Result<()> {
    let state = match config::sync_state_path() {
        Some(path) => SyncState::load(&path)?,
        None => SyncState::default(),
    };
    report(writer, db, config, &state)
}

fn report<W: Write>(
    writer: &mut W,
    db: &Database,
    config: &Config,
    state: &SyncState,
) -> Result<()> {
    writeln!(writer, "Database:  {}", config.database_path.display())?;
    writeln!(
        writer,
        "Last sync: {}",
        state.last_synced_at.as_deref().unwrap_or("never")
    )?;

    let unpushed = match state.watermark.as_deref() {
        Some(watermark) => db.list_events_after(watermark)?.len(),
        // Nothing has ever been pushed.
        None => db.list_events()?.len(),
    };
    writeln!(writer, "Unpushed:  {unpushed} events")?;

    let total = db.event_count()?;
    writeln!(writer)?;
    if total == 0 {
        writeln!(writer, "No events stored.")?;
        return Ok(());
    }

    writeln!(writer, "Events: {total}")?;
    for (kind, count) in db.counts_by_kind()? {
        writeln!(writer, "- {kind}: {count}")?;
    }

    let projections = project(&db.list_events()?);
    writeln!(writer)?;
    writeln!(
        writer,
        "Entries: {} moods, {} meditations",
        projections.moods.len(),
        projections.meditations.len()
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mt_core::{Event, EventKind, Meditation, Mood, parse_timestamp};

    fn seeded_db() -> Database {
        let mut db = Database::open_in_memory().unwrap();
        db.insert_events(&[
            Event {
                created_at: parse_timestamp("2021-01-01T00:00:00.000Z").unwrap(),
                kind: EventKind::MoodCreate(Mood {
                    mood: 5.0,
                    description: None,
                    updated_at: None,
                }),
            },
            Event {
                created_at: parse_timestamp("2021-01-02T00:00:00.000Z").unwrap(),
                kind: EventKind::MeditationCreate(Meditation { seconds: 300 }),
            },
        ])
        .unwrap();
        db
    }

    fn test_config() -> Config {
        Config {
            database_path: "/tmp/mt-test.db".into(),
            ..Config::default()
        }
    }

    #[test]
    fn report_counts_events_and_entries() {
        let db = seeded_db();
        let mut out = Vec::new();

        report(&mut out, &db, &test_config(), &SyncState::default()).unwrap();

        let output = String::from_utf8(out).unwrap();
        assert!(output.contains("Database:  /tmp/mt-test.db"));
        assert!(output.contains("Last sync: never"));
        assert!(output.contains("Unpushed:  2 events"));
        assert!(output.contains("Events: 2"));
        assert!(output.contains("- v1/meditations/create: 1"));
        assert!(output.contains("- v1/moods/create: 1"));
        assert!(output.contains("Entries: 1 moods, 1 meditations"));
    }

    #[test]
    fn report_uses_the_watermark_for_unpushed() {
        let db = seeded_db();
        let state = SyncState {
            watermark: Some("2021-01-01T00:00:00.000Z".to_string()),
            last_synced_at: Some("2021-01-02T12:00:00.000Z".to_string()),
            ..SyncState::default()
        };
        let mut out = Vec::new();

        report(&mut out, &db, &test_config(), &state).unwrap();

        let output = String::from_utf8(out).unwrap();
        assert!(output.contains("Last sync: 2021-01-02T12:00:00.000Z"));
        assert!(output.contains("Unpushed:  1 events"));
    }

    #[test]
    fn report_with_an_empty_database_says_so() {
        let db = Database::open_in_memory().unwrap();
        let mut out = Vec::new();

        report(&mut out, &db, &test_config(), &SyncState::default()).unwrap();

        let output = String::from_utf8(out).unwrap();
        assert!(output.contains("Unpushed:  0 events"));
        assert!(output.contains("No events stored."));
    }
}
