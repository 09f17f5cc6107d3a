use std::io::Write;

use anyhow::Context;
use clap::Args;

use mt_db::Database;

use super::util::parse_datetime;

#[derive(Debug, Args)]
pub struct EventsArgs {
    /// Only events after this time (RFC 3339, YYYY-MM-DD, or 7d style)
    #[arg(long, value_name = "TIME")]
    after: Option<String>,

    /// Only events before this time
    #[arg(long, value_name = "TIME")]
    before: Option<String>,
}

/// Dumps stored events as JSON lines, in chronological order. The output
/// is the wire format, so it feeds straight back into `import`.
pub fn run<W: Write>(writer: &mut W, db: &Database, args: &EventsArgs) -> anyhow::Result<()> {
    let after = args
        .after
        .as_deref()
        .map(parse_datetime)
        .transpose()
        .context("invalid --after")?
        .map(mt_core::format_timestamp);
    let before = args
        .before
        .as_deref()
        .map(parse_datetime)
        .transpose()
        .context("invalid --before")?
        .map(mt_core::format_timestamp);

    let events = db
        .list_events_in_range(after.as_deref(), before.as_deref())
        .context("failed to read the event log")?;

    for event in &events {
        let json = serde_json::to_string(event).context("failed to serialize event")?;
        writeln!(writer, "{json}")?;
    }
    Ok(())
}
