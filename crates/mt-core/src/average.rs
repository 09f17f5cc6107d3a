//! Time-weighted mood averaging over arbitrary windows.
//!
//! Moods form a piecewise-linear signal over time. The average over a
//! window is the area under that signal, clipped to the window, divided by
//! the area a maximal-mood signal would cover. That weights each sample by
//! how long it was in effect instead of treating samples as equal votes.
//!
//! All arithmetic runs in f64 milliseconds since the epoch. Timestamps stay
//! well below 2^53, so the integer-valued inputs are exact and equality
//! checks against window bounds are meaningful.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::event::{Mood, key_time};
use crate::interval::enveloping_range;
use crate::projection::Normalized;
use crate::stats::trapezoid_area;

/// Inclusive bounds of the mood scale.
pub const MOOD_RANGE: (f64, f64) = (0.0, 10.0);

/// Computes the time-weighted average mood over `[from, to]`.
///
/// Returns `None` when there is nothing to interpolate: an empty
/// projection, an inverted window, or a window that does not overlap the
/// sampled range. A projection holding a single mood reports that mood's
/// raw value for any overlapping window.
#[must_use]
pub fn average_in_interval(
    moods: &Normalized<Mood>,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Option<f64> {
    average_over_ids(&moods.all_ids, &moods.by_id, from, to)
}

/// Average over an explicit id subsequence. The trendline restricts the
/// sequence to an enveloping range before sampling, so the subsequence and
/// the lookup map are passed separately.
#[expect(
    clippy::float_cmp,
    reason = "bound checks compare exact integer millisecond values"
)]
pub(crate) fn average_over_ids(
    all_ids: &[String],
    by_id: &HashMap<String, Mood>,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Option<f64> {
    let (Some(first_id), Some(last_id)) = (all_ids.first(), all_ids.last()) else {
        tracing::warn!("no moods to average");
        return None;
    };

    let d0 = to_millis(from);
    let d1 = to_millis(to);
    if d1 < d0 {
        tracing::warn!("average window start is after its end");
        return None;
    }

    let earliest = id_millis(first_id)?;
    let latest = id_millis(last_id)?;
    if d0 > latest || d1 < earliest {
        return None;
    }
    if all_ids.len() == 1 {
        return by_id.get(first_id).map(|mood| mood.mood);
    }
    // Windows that merely touch the sampled range collapse to the boundary
    // sample's raw value.
    if d1 == earliest {
        return by_id.get(first_id).map(|mood| mood.mood);
    }
    if d0 == latest {
        return by_id.get(last_id).map(|mood| mood.mood);
    }

    let max_area = (d1.min(latest) - d0.max(earliest)) * (MOOD_RANGE.1 - MOOD_RANGE.0);

    let envelope = enveloping_range(all_ids, from, to).ok()?;

    let mut area = 0.0;
    for pair in envelope.windows(2) {
        let t0 = id_millis(&pair[0])?;
        let t1 = id_millis(&pair[1])?;
        let mood0 = by_id.get(&pair[0])?.mood;
        let mood1 = by_id.get(&pair[1])?.mood;

        if t0 < d0 && t1 > d1 {
            // The whole window sits inside this one segment.
            area += trapezoid_area(
                mood0 + ((mood1 - mood0) * (d0 - t0)) / (t1 - t0),
                mood0 + ((mood1 - mood0) * (d1 - t0)) / (t1 - t0),
                d1 - d0,
            );
            continue;
        }
        if t0 < d0 {
            // Segment hangs out past the window start; clip on the left.
            area += trapezoid_area(
                mood1 + ((mood0 - mood1) * (t1 - d0)) / (t1 - t0),
                mood1,
                t1 - d0,
            );
            continue;
        }
        if t1 > d1 {
            // Segment hangs out past the window end; clip and stop.
            area += trapezoid_area(
                mood0,
                mood0 + ((mood1 - mood0) * (d1 - t0)) / (t1 - t0),
                d1 - t0,
            );
            break;
        }
        area += trapezoid_area(mood0, mood1, t1 - t0);
    }

    Some((area / max_area) * (MOOD_RANGE.1 - MOOD_RANGE.0))
}

fn id_millis(id: &str) -> Option<f64> {
    key_time(id).map(to_millis)
}

#[expect(
    clippy::cast_precision_loss,
    reason = "millisecond timestamps are far below f64's exact integer range"
)]
fn to_millis(timestamp: DateTime<Utc>) -> f64 {
    timestamp.timestamp_millis() as f64
}
