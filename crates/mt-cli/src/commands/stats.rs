//! Stats command: aggregate views over the logged history.
//!
//! `mt stats` defaults to the summary view; `averages`, `meditation`, and
//! `trend` pick the others. Each view renders a text report, or a JSON
//! document with `--json`.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use serde::Serialize;

use mt_core::{
    MEDITATION_STATS_HOURS_RANGE, MOOD_RANGE, MeditationStats, Mood, Normalized, Period,
    Projections, TrendPoint, average_in_interval, bucket_by_period, format_seconds,
    format_timestamp, mean, meditation_effect_stats, parse_timestamp, project,
    seconds_meditated_in_interval, std_deviation, trendline_points,
};
use mt_db::Database;

use super::util::parse_datetime;

#[derive(Debug, Args)]
pub struct StatsArgs {
    #[command(subcommand)]
    view: Option<StatsView>,

    /// Print the view as JSON instead of a report
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Debug, Subcommand)]
enum StatsView {
    /// Counts, range, and overall averages (the default)
    Summary,
    /// Average mood per calendar period
    Averages {
        /// Bucket size
        #[arg(long, default_value = "day")]
        period: Period,
    },
    /// Mood changes and word frequencies around meditation
    Meditation,
    /// Smoothed trendline points across a window
    Trend {
        /// Start of the window (defaults to the first mood)
        #[arg(long, value_name = "TIME")]
        from: Option<String>,

        /// End of the window (defaults to the last mood)
        #[arg(long, value_name = "TIME")]
        to: Option<String>,
    },
}

// ========== Summary ==========

#[derive(Debug)]
struct SummaryData {
    moods: usize,
    meditations: usize,
    range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    average_mood: Option<f64>,
    mean_mood: Option<f64>,
    std_deviation: f64,
    seconds_meditated: u64,
}

fn summary_data(projections: &Projections) -> SummaryData {
    let moods = &projections.moods;
    let meditations = &projections.meditations;

    // Ids are canonical timestamps, so lexical min and max pick the
    // chronologically first and last entry across both kinds.
    let first_id = [moods.all_ids.first(), meditations.all_ids.first()]
        .into_iter()
        .flatten()
        .min();
    let last_id = [moods.all_ids.last(), meditations.all_ids.last()]
        .into_iter()
        .flatten()
        .max();
    let range = first_id
        .zip(last_id)
        .and_then(|(first, last)| parse_timestamp(first).ok().zip(parse_timestamp(last).ok()));

    let values: Vec<f64> = moods
        .all_ids
        .iter()
        .filter_map(|id| moods.get(id))
        .map(|mood| mood.mood)
        .collect();

    let (average_mood, seconds_meditated) = range.map_or((None, 0), |(from, to)| {
        // The ids are ordered, so the range is never inverted.
        let seconds = seconds_meditated_in_interval(meditations, from, to).unwrap_or(0);
        (average_in_interval(moods, from, to), seconds)
    });

    SummaryData {
        moods: moods.len(),
        meditations: meditations.len(),
        range,
        average_mood,
        mean_mood: mean(&values),
        std_deviation: std_deviation(&values),
        seconds_meditated,
    }
}

fn format_summary(data: &SummaryData) -> String {
    let mut output = String::new();
    writeln!(output, "MOOD SUMMARY").unwrap();
    writeln!(output, "────────────").unwrap();

    if data.moods == 0 && data.meditations == 0 {
        writeln!(output).unwrap();
        writeln!(output, "No entries logged yet.").unwrap();
        writeln!(output).unwrap();
        writeln!(
            output,
            "Hint: Run 'mt log mood --mood 7' to record your first mood."
        )
        .unwrap();
        return output;
    }

    writeln!(output, "Moods:           {}", data.moods).unwrap();
    writeln!(output, "Meditations:     {}", data.meditations).unwrap();
    if let Some((first, last)) = data.range {
        writeln!(
            output,
            "Range:           {} to {}",
            first.format("%b %-d, %Y"),
            last.format("%b %-d, %Y")
        )
        .unwrap();
    }
    match data.average_mood {
        Some(average) => {
            writeln!(output, "Average mood:    {average:.1} (time-weighted)").unwrap();
        }
        None => writeln!(output, "Average mood:    n/a").unwrap(),
    }
    if let Some(mean_mood) = data.mean_mood {
        writeln!(
            output,
            "Mean mood:       {mean_mood:.1} (std dev {:.2})",
            data.std_deviation
        )
        .unwrap();
    }
    writeln!(
        output,
        "Time meditated:  {}",
        format_seconds(data.seconds_meditated)
    )
    .unwrap();
    output
}

#[derive(Debug, Serialize)]
struct JsonSummary {
    moods: usize,
    meditations: usize,
    first_entry_at: Option<String>,
    last_entry_at: Option<String>,
    average_mood: Option<f64>,
    mean_mood: Option<f64>,
    std_deviation: f64,
    seconds_meditated: u64,
}

fn format_summary_json(data: &SummaryData) -> Result<String> {
    let report = JsonSummary {
        moods: data.moods,
        meditations: data.meditations,
        first_entry_at: data.range.map(|(first, _)| format_timestamp(first)),
        last_entry_at: data.range.map(|(_, last)| format_timestamp(last)),
        average_mood: data.average_mood,
        mean_mood: data.mean_mood,
        std_deviation: data.std_deviation,
        seconds_meditated: data.seconds_meditated,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

// ========== Per-period Averages ==========

fn format_averages(period: Period, buckets: &Normalized<f64>) -> String {
    let mut output = String::new();
    let header = format!("AVERAGE MOOD BY {}", period.as_str().to_uppercase());
    writeln!(output, "{header}").unwrap();
    writeln!(output, "{}", "─".repeat(header.chars().count())).unwrap();

    if buckets.is_empty() {
        writeln!(output).unwrap();
        writeln!(output, "No moods logged yet.").unwrap();
        return output;
    }

    for key in &buckets.all_ids {
        if let Some(average) = buckets.get(key) {
            writeln!(output, "{key}  {average:>4.1}  {}", mood_bar(*average)).unwrap();
        }
    }
    output
}

#[derive(Debug, Serialize)]
struct JsonAverages {
    period: String,
    buckets: Vec<JsonBucket>,
}

#[derive(Debug, Serialize)]
struct JsonBucket {
    start: String,
    average: f64,
}

fn format_averages_json(period: Period, buckets: &Normalized<f64>) -> Result<String> {
    let report = JsonAverages {
        period: period.as_str().to_string(),
        buckets: buckets
            .all_ids
            .iter()
            .filter_map(|key| {
                buckets.get(key).map(|average| JsonBucket {
                    start: key.clone(),
                    average: *average,
                })
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

// ========== Meditation Effect ==========

#[derive(Debug)]
struct MeditationData {
    sessions: usize,
    seconds_meditated: u64,
    stats: MeditationStats,
}

fn meditation_data(projections: &Projections) -> MeditationData {
    let meditations = &projections.meditations;
    let seconds_meditated = meditations
        .all_ids
        .iter()
        .filter_map(|id| meditations.get(id))
        .map(|meditation| u64::from(meditation.seconds))
        .sum();
    MeditationData {
        sessions: meditations.len(),
        seconds_meditated,
        stats: meditation_effect_stats(meditations, &projections.moods),
    }
}

fn format_meditation(data: &MeditationData) -> String {
    let mut output = String::new();
    writeln!(output, "MEDITATION EFFECT").unwrap();
    writeln!(output, "─────────────────").unwrap();

    if data.sessions == 0 {
        writeln!(output).unwrap();
        writeln!(output, "No meditations logged yet.").unwrap();
        return output;
    }

    writeln!(
        output,
        "Sessions:            {} ({} meditated)",
        data.sessions,
        format_seconds(data.seconds_meditated)
    )
    .unwrap();
    match data.stats.average_mood_change {
        Some(change) => writeln!(output, "Average mood change: {change:+.2}").unwrap(),
        None => writeln!(
            output,
            "Average mood change: n/a (no moods within {MEDITATION_STATS_HOURS_RANGE} hours of a session)"
        )
        .unwrap(),
    }

    for (title, words) in [
        ("Distinctive words before", &data.stats.filtered_words_before),
        ("Distinctive words after", &data.stats.filtered_words_after),
    ] {
        writeln!(output).unwrap();
        writeln!(output, "{title}:").unwrap();
        let counts = sorted_word_counts(words);
        if counts.is_empty() {
            writeln!(output, "  (none)").unwrap();
            continue;
        }
        let width = counts
            .iter()
            .map(|(word, _)| word.chars().count())
            .max()
            .unwrap_or(0);
        for (word, count) in counts {
            writeln!(output, "  {word:<width$}  {count}").unwrap();
        }
    }
    output
}

/// Orders word counts by frequency, then alphabetically for stable output.
fn sorted_word_counts(words: &HashMap<String, usize>) -> Vec<(String, usize)> {
    let mut counts: Vec<_> = words
        .iter()
        .map(|(word, count)| (word.clone(), *count))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

#[derive(Debug, Serialize)]
struct JsonMeditation {
    sessions: usize,
    seconds_meditated: u64,
    average_mood_change: Option<f64>,
    words_before: Vec<JsonWordCount>,
    words_after: Vec<JsonWordCount>,
    filtered_words_before: Vec<JsonWordCount>,
    filtered_words_after: Vec<JsonWordCount>,
}

#[derive(Debug, Serialize)]
struct JsonWordCount {
    word: String,
    count: usize,
}

fn json_word_counts(words: &HashMap<String, usize>) -> Vec<JsonWordCount> {
    sorted_word_counts(words)
        .into_iter()
        .map(|(word, count)| JsonWordCount { word, count })
        .collect()
}

fn format_meditation_json(data: &MeditationData) -> Result<String> {
    let report = JsonMeditation {
        sessions: data.sessions,
        seconds_meditated: data.seconds_meditated,
        average_mood_change: data.stats.average_mood_change,
        words_before: json_word_counts(&data.stats.words_before),
        words_after: json_word_counts(&data.stats.words_after),
        filtered_words_before: json_word_counts(&data.stats.filtered_words_before),
        filtered_words_after: json_word_counts(&data.stats.filtered_words_after),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

// ========== Trendline ==========

/// Resolves the trend window, defaulting each open bound to the matching
/// end of the logged moods. `None` when there are no moods to bound by.
fn trend_window(
    moods: &Normalized<Mood>,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>> {
    let earliest = moods
        .all_ids
        .first()
        .and_then(|id| parse_timestamp(id).ok());
    let latest = moods.all_ids.last().and_then(|id| parse_timestamp(id).ok());

    let from = match from {
        Some(raw) => Some(parse_datetime(raw).context("invalid --from")?),
        None => earliest,
    };
    let to = match to {
        Some(raw) => Some(parse_datetime(raw).context("invalid --to")?),
        None => latest,
    };
    Ok(from.zip(to))
}

fn format_trend(points: &[TrendPoint]) -> String {
    let mut output = String::new();
    writeln!(output, "MOOD TREND").unwrap();
    writeln!(output, "──────────").unwrap();

    if points.is_empty() {
        writeln!(output).unwrap();
        writeln!(output, "No trend points inside this window.").unwrap();
        return output;
    }

    for point in points {
        writeln!(
            output,
            "{}  {:>4.1}  {}",
            format_timestamp(point.at),
            point.mood,
            mood_bar(point.mood)
        )
        .unwrap();
    }
    output
}

#[derive(Debug, Serialize)]
struct JsonTrend {
    from: String,
    to: String,
    points: Vec<JsonTrendPoint>,
}

#[derive(Debug, Serialize)]
struct JsonTrendPoint {
    at: String,
    mood: f64,
}

fn format_trend_json(
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    points: &[TrendPoint],
) -> Result<String> {
    let report = JsonTrend {
        from: format_timestamp(from),
        to: format_timestamp(to),
        points: points
            .iter()
            .map(|point| JsonTrendPoint {
                at: format_timestamp(point.at),
                mood: point.mood,
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

// ========== Bar Rendering ==========

/// Renders a ten-slot bar for a value on the mood scale.
/// Nonzero values below half a slot still get one block.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn mood_bar(average: f64) -> String {
    let ratio = (average / MOOD_RANGE.1).clamp(0.0, 1.0);
    let filled = if ratio > 0.0 && ratio < 0.05 {
        1
    } else {
        (ratio * 10.0).round() as usize
    };
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

// ========== Public Interface ==========

/// Runs the stats command against the current event log.
pub fn run<W: Write>(writer: &mut W, db: &Database, args: &StatsArgs) -> Result<()> {
    let events = db.list_events().context("failed to read the event log")?;
    let projections = project(&events);

    match args.view.as_ref().unwrap_or(&StatsView::Summary) {
        StatsView::Summary => {
            let data = summary_data(&projections);
            if args.json {
                writeln!(writer, "{}", format_summary_json(&data)?)?;
            } else {
                write!(writer, "{}", format_summary(&data))?;
            }
        }
        StatsView::Averages { period } => {
            let buckets = bucket_by_period(&projections.moods, *period);
            if args.json {
                writeln!(writer, "{}", format_averages_json(*period, &buckets)?)?;
            } else {
                write!(writer, "{}", format_averages(*period, &buckets))?;
            }
        }
        StatsView::Meditation => {
            let data = meditation_data(&projections);
            if args.json {
                writeln!(writer, "{}", format_meditation_json(&data)?)?;
            } else {
                write!(writer, "{}", format_meditation(&data))?;
            }
        }
        StatsView::Trend { from, to } => {
            let Some((from, to)) = trend_window(&projections.moods, from.as_deref(), to.as_deref())?
            else {
                writeln!(writer, "No moods logged yet.")?;
                return Ok(());
            };
            let points = trendline_points(&projections.moods, from, to)?;
            if args.json {
                writeln!(writer, "{}", format_trend_json(from, to, &points)?)?;
            } else {
                write!(writer, "{}", format_trend(&points))?;
            }
        }
    }
    Ok(())
}
