use std::io::{BufRead, Write};

use anyhow::Context;
use clap::Args;

use mt_core::Event;
use mt_db::Database;

#[derive(Debug, Args)]
pub struct ImportArgs {}

/// Reads wire-format events, one JSON object per line, and inserts them in
/// a single transaction. Nothing is stored when any line fails to parse.
pub fn run<W: Write, R: BufRead>(
    writer: &mut W,
    reader: R,
    db: &mut Database,
    _args: &ImportArgs,
) -> anyhow::Result<()> {
    let mut events = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.context("failed to read input")?;
        if line.trim().is_empty() {
            continue;
        }
        let event: Event = serde_json::from_str(&line)
            .with_context(|| format!("invalid event on line {}", index + 1))?;
        events.push(event);
    }

    let inserted = db
        .insert_events(&events)
        .context("failed to store the events")?;
    writeln!(
        writer,
        "Imported {inserted} events ({} already present)",
        events.len() - inserted
    )?;
    Ok(())
}
