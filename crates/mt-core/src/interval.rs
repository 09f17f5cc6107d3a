//! Range selection over ascending timestamp keys.
//!
//! Ids are canonical RFC 3339 strings (see
//! [`format_timestamp`](crate::event::format_timestamp)), so lexicographic
//! comparison against a formatted bound is equivalent to comparing the
//! instants themselves. Both selectors return borrowed subslices: the
//! matching ids are always contiguous in an ascending sequence.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::event::{Meditation, format_timestamp};
use crate::projection::Normalized;

/// The window start was after the window end.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid range: {from} is after {to}")]
pub struct InvalidRangeError {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

/// Selects the minimal contiguous run of `ids` needed to interpolate across
/// `[from, to]`: every id inside the window plus the nearest id on each
/// side when one exists. The run extends exactly one id past `to`, never
/// further.
pub fn enveloping_range<'a>(
    ids: &'a [String],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<&'a [String], InvalidRangeError> {
    if from > to {
        return Err(InvalidRangeError { from, to });
    }

    let from_key = format_timestamp(from);
    let to_key = format_timestamp(to);

    // First id at or after the window start; the id before it, when there
    // is one, becomes the left boundary point.
    let first_inside = ids.partition_point(|id| id.as_str() < from_key.as_str());
    let start = first_inside.saturating_sub(1);

    // One past the first id beyond the window end, capped at the input.
    let first_beyond = ids.partition_point(|id| id.as_str() <= to_key.as_str());
    let end = ids.len().min(first_beyond + 1);

    Ok(&ids[start..end])
}

/// Selects the contiguous run of `ids` inside the closed window
/// `[from, to]`.
pub fn ids_in_interval<'a>(
    ids: &'a [String],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<&'a [String], InvalidRangeError> {
    if from > to {
        return Err(InvalidRangeError { from, to });
    }

    let from_key = format_timestamp(from);
    let to_key = format_timestamp(to);

    let start = ids.partition_point(|id| id.as_str() < from_key.as_str());
    let end = ids.partition_point(|id| id.as_str() <= to_key.as_str());
    Ok(&ids[start..end])
}

/// Total seconds meditated across sessions logged inside `[from, to]`.
pub fn seconds_meditated_in_interval(
    meditations: &Normalized<Meditation>,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<u64, InvalidRangeError> {
    let ids = ids_in_interval(&meditations.all_ids, from, to)?;
    Ok(ids
        .iter()
        .filter_map(|id| meditations.get(id))
        .map(|meditation| u64::from(meditation.seconds))
        .sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::parse_timestamp;

    fn at(iso: &str) -> DateTime<Utc> {
        parse_timestamp(iso).unwrap()
    }

    fn ids(keys: &[&str]) -> Vec<String> {
        keys.iter().map(ToString::to_string).collect()
    }

    const DAYS: [&str; 5] = [
        "2021-01-01T00:00:00.000Z",
        "2021-01-02T00:00:00.000Z",
        "2021-01-03T00:00:00.000Z",
        "2021-01-04T00:00:00.000Z",
        "2021-01-05T00:00:00.000Z",
    ];

    #[test]
    fn envelope_keeps_one_neighbor_on_each_side() {
        let ids = ids(&DAYS);
        let range = enveloping_range(
            &ids,
            at("2021-01-02T12:00:00Z"),
            at("2021-01-03T12:00:00Z"),
        )
        .unwrap();
        assert_eq!(range, &ids[1..4]);
    }

    #[test]
    fn envelope_overshoots_right_by_exactly_one() {
        let ids = ids(&DAYS);
        let range = enveloping_range(
            &ids,
            at("2021-01-01T00:00:00Z"),
            at("2021-01-03T00:00:00Z"),
        )
        .unwrap();
        // Ids at the bounds are inside; one more id past the end is kept.
        assert_eq!(range, &ids[0..4]);
    }

    #[test]
    fn envelope_before_all_ids_keeps_first() {
        let ids = ids(&DAYS);
        let range = enveloping_range(
            &ids,
            at("2020-12-01T00:00:00Z"),
            at("2020-12-15T00:00:00Z"),
        )
        .unwrap();
        assert_eq!(range, &ids[0..1]);
    }

    #[test]
    fn envelope_after_all_ids_keeps_last() {
        let ids = ids(&DAYS);
        let range = enveloping_range(
            &ids,
            at("2021-02-01T00:00:00Z"),
            at("2021-02-15T00:00:00Z"),
        )
        .unwrap();
        assert_eq!(range, &ids[4..5]);
    }

    #[test]
    fn envelope_of_empty_sequence_is_empty() {
        let range = enveloping_range(
            &[],
            at("2021-01-01T00:00:00Z"),
            at("2021-01-02T00:00:00Z"),
        )
        .unwrap();
        assert!(range.is_empty());
    }

    #[test]
    fn inverted_window_is_an_error() {
        let ids = ids(&DAYS);
        let from = at("2021-01-03T00:00:00Z");
        let to = at("2021-01-02T00:00:00Z");
        assert_eq!(
            enveloping_range(&ids, from, to),
            Err(InvalidRangeError { from, to })
        );
        assert_eq!(
            ids_in_interval(&ids, from, to),
            Err(InvalidRangeError { from, to })
        );
    }

    #[test]
    fn interval_bounds_are_inclusive() {
        let ids = ids(&DAYS);
        let range = ids_in_interval(
            &ids,
            at("2021-01-02T00:00:00Z"),
            at("2021-01-04T00:00:00Z"),
        )
        .unwrap();
        assert_eq!(range, &ids[1..4]);
    }

    #[test]
    fn interval_excludes_ids_outside_the_window() {
        let ids = ids(&DAYS);
        let range = ids_in_interval(
            &ids,
            at("2021-01-02T12:00:00Z"),
            at("2021-01-03T12:00:00Z"),
        )
        .unwrap();
        assert_eq!(range, &ids[2..3]);
    }

    #[test]
    fn seconds_meditated_sums_only_inside_the_window() {
        let mut meditations = Normalized::default();
        meditations.insert("2021-01-01T00:00:00.000Z".to_string(), Meditation { seconds: 300 });
        meditations.insert("2021-01-02T00:00:00.000Z".to_string(), Meditation { seconds: 600 });
        meditations.insert("2021-01-03T00:00:00.000Z".to_string(), Meditation { seconds: 900 });

        let total = seconds_meditated_in_interval(
            &meditations,
            at("2021-01-01T12:00:00Z"),
            at("2021-01-03T12:00:00Z"),
        )
        .unwrap();
        assert_eq!(total, 1500);
    }
}
