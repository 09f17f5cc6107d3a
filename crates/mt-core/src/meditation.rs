//! Meditation-effect statistics over paired mood samples.
//!
//! Each meditation is paired with the nearest mood logged before its start
//! and the nearest mood logged after it finished, provided both fall
//! within [`MEDITATION_STATS_HOURS_RANGE`] hours of the session. Paired
//! samples contribute a mood delta and their description words to the
//! before/after frequency maps.

use std::collections::HashMap;

use chrono::TimeDelta;
use serde::Serialize;

use crate::event::{Meditation, Mood, key_time};
use crate::projection::Normalized;
use crate::stats::{mean, normalized_words};

/// Hours on either side of a meditation within which mood samples count.
pub const MEDITATION_STATS_HOURS_RANGE: i64 = 4;

const SECONDS_PER_HOUR: i64 = 3600;

/// Mood deltas and word frequencies around meditation sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MeditationStats {
    /// Mean of `after - before` mood across paired meditations.
    pub average_mood_change: Option<f64>,
    pub words_before: HashMap<String, usize>,
    pub words_after: HashMap<String, usize>,
    /// Word counts with the frequency mass common to both sides removed.
    pub filtered_words_before: HashMap<String, usize>,
    pub filtered_words_after: HashMap<String, usize>,
}

/// Pairs meditations with their surrounding moods and aggregates the
/// effect statistics.
///
/// Both projections must be in ascending key order. A single cursor walks
/// the moods across all meditations: a mood used as an "after" sample
/// stays available for the next meditation, but the cursor never rewinds,
/// so each mood is considered at most once as a fresh candidate. The first
/// mood in the sequence is never an "after" sample since it has no
/// predecessor to pair with.
#[must_use]
pub fn meditation_effect_stats(
    meditations: &Normalized<Meditation>,
    moods: &Normalized<Mood>,
) -> MeditationStats {
    let window = MEDITATION_STATS_HOURS_RANGE * SECONDS_PER_HOUR;

    let mut mood_changes = Vec::new();
    let mut before_words: Vec<String> = Vec::new();
    let mut after_words: Vec<String> = Vec::new();

    let mut cursor = 0;
    for meditation_id in &meditations.all_ids {
        while cursor < moods.all_ids.len() {
            let after_id = &moods.all_ids[cursor];
            if after_id < meditation_id || cursor == 0 {
                cursor += 1;
                continue;
            }
            let before_id = &moods.all_ids[cursor - 1];

            let Some(meditation) = meditations.get(meditation_id) else {
                break;
            };
            let (Some(logged), Some(before_time), Some(after_time)) = (
                key_time(meditation_id),
                key_time(before_id),
                key_time(after_id),
            ) else {
                break;
            };
            // The meditation key records when the session ended; it began
            // `seconds` earlier.
            let started = logged - TimeDelta::seconds(i64::from(meditation.seconds));

            let gap_before = (started - before_time).num_seconds();
            let gap_after = (after_time - logged).num_seconds();
            if gap_before > window || gap_after > window {
                break;
            }

            let (Some(before), Some(after)) = (moods.get(before_id), moods.get(after_id)) else {
                break;
            };
            mood_changes.push(after.mood - before.mood);
            if let Some(description) = &before.description {
                before_words.extend(normalized_words(description));
            }
            if let Some(description) = &after.description {
                after_words.extend(normalized_words(description));
            }
            break;
        }
    }

    let words_before = word_counts(&before_words);
    let words_after = word_counts(&after_words);
    let (filtered_words_before, filtered_words_after) =
        subtract_common_counts(&words_before, &words_after);

    MeditationStats {
        average_mood_change: mean(&mood_changes),
        words_before,
        words_after,
        filtered_words_before,
        filtered_words_after,
    }
}

fn word_counts(words: &[String]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for word in words {
        *counts.entry(word.clone()).or_insert(0) += 1;
    }
    counts
}

/// Removes the frequency mass each word has on both sides, leaving only
/// words whose usage changed across meditations.
fn subtract_common_counts(
    before: &HashMap<String, usize>,
    after: &HashMap<String, usize>,
) -> (HashMap<String, usize>, HashMap<String, usize>) {
    let mut filtered_before = before.clone();
    let mut filtered_after = after.clone();

    for (word, &before_count) in before {
        let Some(&after_count) = after.get(word) else {
            continue;
        };
        let common = before_count.min(after_count);

        if before_count == common {
            filtered_before.remove(word);
        } else if let Some(count) = filtered_before.get_mut(word) {
            *count -= common;
        }
        if after_count == common {
            filtered_after.remove(word);
        } else if let Some(count) = filtered_after.get_mut(word) {
            *count -= common;
        }
    }

    (filtered_before, filtered_after)
}
