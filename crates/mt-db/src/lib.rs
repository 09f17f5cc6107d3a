//! SQLite-backed persistence for the mood tracker event log.
//!
//! # Thread Safety
//!
//! [`Database`] wraps a single `rusqlite` connection and is not `Sync`.
//! Open one handle per thread; SQLite serializes writers itself.
//!
//! # Schema
//!
//! - `events`: append-only log rows (`id`, `type`, `payload`). The id is
//!   the event's canonical creation timestamp, so the primary key both
//!   deduplicates replicated events and keeps `ORDER BY id` chronological.
//! - `settings`: a single row (`id = 0`) holding the account settings as
//!   JSON, with the modification time broken out for comparisons.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Params, params};
use thiserror::Error;

use mt_core::{Event, EventKind, Settings, parse_timestamp};

/// Errors from the storage layer.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to encode payload for event {event_id}")]
    PayloadEncode {
        event_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to decode payload for event {event_id}")]
    PayloadDecode {
        event_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("event id {id:?} is not a valid timestamp")]
    InvalidEventId {
        id: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("failed to encode settings")]
    SettingsEncode(#[source] serde_json::Error),

    #[error("failed to decode stored settings")]
    SettingsDecode(#[source] serde_json::Error),
}

/// Raw row shape of the `events` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub id: String,
    pub kind: String,
    pub payload: String,
}

impl TryFrom<&Event> for EventRecord {
    type Error = DbError;

    fn try_from(event: &Event) -> Result<Self, DbError> {
        let id = event.id();
        let payload = match &event.kind {
            EventKind::MoodCreate(mood) => serde_json::to_string(mood),
            EventKind::MoodUpdate(update) => serde_json::to_string(update),
            EventKind::MeditationCreate(meditation) => serde_json::to_string(meditation),
            EventKind::MoodDelete(target) | EventKind::MeditationDelete(target) => {
                serde_json::to_string(target)
            }
        }
        .map_err(|source| DbError::PayloadEncode {
            event_id: id.clone(),
            source,
        })?;

        Ok(Self {
            id,
            kind: event.kind.type_str().to_string(),
            payload,
        })
    }
}

impl TryFrom<EventRecord> for Event {
    type Error = DbError;

    fn try_from(record: EventRecord) -> Result<Self, DbError> {
        let created_at =
            parse_timestamp(&record.id).map_err(|source| DbError::InvalidEventId {
                id: record.id.clone(),
                source,
            })?;

        let payload: serde_json::Value =
            serde_json::from_str(&record.payload).map_err(|source| DbError::PayloadDecode {
                event_id: record.id.clone(),
                source,
            })?;
        let kind = serde_json::from_value(serde_json::json!({
            "type": record.kind,
            "payload": payload,
        }))
        .map_err(|source| DbError::PayloadDecode {
            event_id: record.id.clone(),
            source,
        })?;

        Ok(Self { created_at, kind })
    }
}

/// Handle to the mood tracker database.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens (creating if necessary) the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Opens an in-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self, DbError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, DbError> {
        // Idempotent; safe to run on every open.
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS events (
                id      TEXT PRIMARY KEY,
                type    TEXT NOT NULL,
                payload TEXT NOT NULL
            ) WITHOUT ROWID;

            CREATE TABLE IF NOT EXISTS settings (
                id         INTEGER PRIMARY KEY CHECK (id = 0),
                updated_at TEXT NOT NULL,
                payload    TEXT NOT NULL
            );",
        )?;
        Ok(Self { conn })
    }

    /// Inserts events, skipping ids already present. Returns how many rows
    /// were actually added.
    pub fn insert_events(&mut self, events: &[Event]) -> Result<usize, DbError> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO events (id, type, payload) VALUES (?1, ?2, ?3)",
            )?;
            for event in events {
                let record = EventRecord::try_from(event)?;
                inserted += stmt.execute(params![record.id, record.kind, record.payload])?;
            }
        }
        tx.commit()?;

        tracing::debug!(total = events.len(), inserted, "inserted events");
        Ok(inserted)
    }

    /// All events in chronological order.
    pub fn list_events(&self) -> Result<Vec<Event>, DbError> {
        self.query_events(
            "SELECT id, type, payload FROM events ORDER BY id ASC",
            [],
        )
    }

    /// Events strictly after `id`, in chronological order. Pass the push
    /// watermark to get the local events a sync still has to upload.
    pub fn list_events_after(&self, id: &str) -> Result<Vec<Event>, DbError> {
        self.query_events(
            "SELECT id, type, payload FROM events WHERE id > ?1 ORDER BY id ASC",
            [id],
        )
    }

    /// Events between the optional bounds (both exclusive), in
    /// chronological order.
    pub fn list_events_in_range(
        &self,
        after: Option<&str>,
        before: Option<&str>,
    ) -> Result<Vec<Event>, DbError> {
        match (after, before) {
            (Some(after), Some(before)) => self.query_events(
                "SELECT id, type, payload FROM events
                 WHERE id > ?1 AND id < ?2 ORDER BY id ASC",
                params![after, before],
            ),
            (Some(after), None) => self.list_events_after(after),
            (None, Some(before)) => self.query_events(
                "SELECT id, type, payload FROM events WHERE id < ?1 ORDER BY id ASC",
                [before],
            ),
            (None, None) => self.list_events(),
        }
    }

    fn query_events<P: Params>(&self, sql: &str, params: P) -> Result<Vec<Event>, DbError> {
        let mut stmt = self.conn.prepare(sql)?;
        let records = stmt.query_map(params, |row| {
            Ok(EventRecord {
                id: row.get(0)?,
                kind: row.get(1)?,
                payload: row.get(2)?,
            })
        })?;

        let mut events = Vec::new();
        for record in records {
            events.push(Event::try_from(record?)?);
        }
        Ok(events)
    }

    /// Id of the most recent event, if any.
    pub fn latest_event_id(&self) -> Result<Option<String>, DbError> {
        let id = self
            .conn
            .query_row("SELECT MAX(id) FROM events", [], |row| row.get(0))?;
        Ok(id)
    }

    /// Number of events in the log.
    pub fn event_count(&self) -> Result<u64, DbError> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Event counts per wire type, alphabetically.
    pub fn counts_by_kind(&self) -> Result<Vec<(String, u64)>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT type, COUNT(*) FROM events GROUP BY type ORDER BY type ASC")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;

        let mut counts = Vec::new();
        for row in rows {
            counts.push(row?);
        }
        Ok(counts)
    }

    /// The stored settings, if any were ever written.
    pub fn settings(&self) -> Result<Option<Settings>, DbError> {
        let payload: Option<String> = self
            .conn
            .query_row("SELECT payload FROM settings WHERE id = 0", [], |row| {
                row.get(0)
            })
            .optional()?;

        match payload {
            Some(payload) => serde_json::from_str(&payload)
                .map(Some)
                .map_err(DbError::SettingsDecode),
            None => Ok(None),
        }
    }

    /// Replaces the stored settings.
    pub fn put_settings(&mut self, settings: &Settings) -> Result<(), DbError> {
        let payload = serde_json::to_string(settings).map_err(DbError::SettingsEncode)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO settings (id, updated_at, payload) VALUES (0, ?1, ?2)",
            params![settings.updated_at, payload],
        )?;
        Ok(())
    }
}
