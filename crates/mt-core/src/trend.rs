//! Trendline sampling for mood charts.

use chrono::{DateTime, Utc};
use rayon::prelude::*;

use crate::average::average_over_ids;
use crate::event::{Mood, key_time};
use crate::interval::{InvalidRangeError, enveloping_range};
use crate::projection::Normalized;

/// Number of equal intervals the window is divided into. The trendline has
/// at most one more point than this.
pub const TRENDLINE_INTERVALS: usize = 32;

/// Each point averages over this many point-intervals, centered on it.
const MOVING_AVERAGE_INTERVALS: f64 = 3.0;

/// A smoothed sample on the trendline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendPoint {
    pub at: DateTime<Utc>,
    pub mood: f64,
}

/// Samples a smoothed mood trendline across `[from, to]`.
///
/// Each point is the time-weighted average over a moving window of three
/// point-intervals centered on it, computed against the enveloping id run
/// for the whole window rather than the full projection. Points whose
/// center falls outside the enveloping samples are dropped, so sparse data
/// yields a shorter line instead of flat tails.
pub fn trendline_points(
    moods: &Normalized<Mood>,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<TrendPoint>, InvalidRangeError> {
    let envelope = enveloping_range(&moods.all_ids, from, to)?;
    let (Some(first_id), Some(last_id)) = (envelope.first(), envelope.last()) else {
        return Ok(Vec::new());
    };
    let (Some(earliest), Some(latest)) = (key_time(first_id), key_time(last_id)) else {
        return Ok(Vec::new());
    };
    let earliest = to_millis(earliest);
    let latest = to_millis(latest);

    let d0 = to_millis(from);
    let d1 = to_millis(to);
    #[expect(
        clippy::cast_precision_loss,
        reason = "the interval count is a small constant"
    )]
    let interval = (d1 - d0) / TRENDLINE_INTERVALS as f64;

    let points = (0..=TRENDLINE_INTERVALS)
        .into_par_iter()
        .filter_map(|index| {
            #[expect(
                clippy::cast_precision_loss,
                reason = "point indexes stop at the interval count"
            )]
            let offset = index as f64 - MOVING_AVERAGE_INTERVALS / 2.0;
            let t0 = d0 + offset * interval;
            let t1 = t0 + MOVING_AVERAGE_INTERVALS * interval;
            let center = f64::midpoint(t0, t1);
            if center < earliest || center > latest {
                return None;
            }

            let window_from = from_millis(t0)?;
            let window_to = from_millis(t1)?;
            let mood = average_over_ids(envelope, &moods.by_id, window_from, window_to)?;
            Some(TrendPoint {
                at: from_millis(center)?,
                mood,
            })
        })
        .collect();

    Ok(points)
}

#[expect(
    clippy::cast_precision_loss,
    reason = "millisecond timestamps are far below f64's exact integer range"
)]
fn to_millis(timestamp: DateTime<Utc>) -> f64 {
    timestamp.timestamp_millis() as f64
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "values come from in-range timestamps; the cast saturates"
)]
fn from_millis(millis: f64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::parse_timestamp;

    fn at(iso: &str) -> DateTime<Utc> {
        parse_timestamp(iso).unwrap()
    }

    fn moods(samples: &[(&str, f64)]) -> Normalized<Mood> {
        let mut moods = Normalized::default();
        for &(iso, mood) in samples {
            moods.insert(
                iso.to_string(),
                Mood {
                    mood,
                    description: None,
                    updated_at: None,
                },
            );
        }
        moods
    }

    #[test]
    fn empty_projection_yields_no_points() {
        let points = trendline_points(
            &Normalized::default(),
            at("2021-01-01T00:00:00Z"),
            at("2021-01-02T00:00:00Z"),
        )
        .unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn inverted_window_is_an_error() {
        let moods = moods(&[("2021-01-01T00:00:00.000Z", 5.0)]);
        let result = trendline_points(
            &moods,
            at("2021-01-02T00:00:00Z"),
            at("2021-01-01T00:00:00Z"),
        );
        assert!(result.is_err());
    }

    #[test]
    fn full_coverage_yields_a_point_per_boundary() {
        let moods = moods(&[
            ("2021-01-01T00:00:00.000Z", 0.0),
            ("2021-01-02T00:00:00.000Z", 10.0),
        ]);
        let points = trendline_points(
            &moods,
            at("2021-01-01T00:00:00Z"),
            at("2021-01-02T00:00:00Z"),
        )
        .unwrap();

        assert_eq!(points.len(), TRENDLINE_INTERVALS + 1);
        assert_eq!(points[0].at, at("2021-01-01T00:00:00Z"));
        assert_eq!(
            points[TRENDLINE_INTERVALS].at,
            at("2021-01-02T00:00:00Z")
        );
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "the midpoint average is exact")]
    fn interior_points_follow_the_signal() {
        let moods = moods(&[
            ("2021-01-01T00:00:00.000Z", 0.0),
            ("2021-01-02T00:00:00.000Z", 10.0),
        ]);
        let points = trendline_points(
            &moods,
            at("2021-01-01T00:00:00Z"),
            at("2021-01-02T00:00:00Z"),
        )
        .unwrap();

        // A linear signal averaged over a symmetric interior window equals
        // the value at the window center.
        assert_eq!(points[16].at, at("2021-01-01T12:00:00Z"));
        assert_eq!(points[16].mood, 5.0);
    }

    #[test]
    fn points_ascend_in_time() {
        let moods = moods(&[
            ("2021-01-01T00:00:00.000Z", 3.0),
            ("2021-01-03T00:00:00.000Z", 8.0),
            ("2021-01-05T00:00:00.000Z", 4.0),
        ]);
        let points = trendline_points(
            &moods,
            at("2021-01-01T00:00:00Z"),
            at("2021-01-05T00:00:00Z"),
        )
        .unwrap();

        assert!(!points.is_empty());
        for pair in points.windows(2) {
            assert!(pair[0].at < pair[1].at);
        }
    }

    #[test]
    fn centers_outside_the_sampled_range_are_dropped() {
        // Samples cover only the middle day of a five-day window.
        let moods = moods(&[
            ("2021-01-03T00:00:00.000Z", 4.0),
            ("2021-01-04T00:00:00.000Z", 6.0),
        ]);
        let from = at("2021-01-01T00:00:00Z");
        let to = at("2021-01-06T00:00:00Z");
        let points = trendline_points(&moods, from, to).unwrap();

        assert!(!points.is_empty());
        assert!(points.len() < TRENDLINE_INTERVALS + 1);
        for point in &points {
            assert!(point.at >= at("2021-01-03T00:00:00Z"));
            assert!(point.at <= at("2021-01-04T00:00:00Z"));
        }
    }
}
