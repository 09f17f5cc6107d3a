//! Argument parsing helpers shared across commands.

use anyhow::{Context, bail};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};

use mt_core::{MOOD_RANGE, parse_timestamp};

/// Parses a point in time from one of three forms: a full RFC 3339
/// timestamp, a plain `YYYY-MM-DD` date (UTC midnight), or an offset back
/// from now like `90m`, `4h`, `7d`, or `2w`.
pub(crate) fn parse_datetime(input: &str) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(timestamp) = parse_timestamp(input) {
        return Ok(timestamp);
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }
    parse_relative(input).with_context(|| format!("unrecognized time {input:?}"))
}

fn parse_relative(input: &str) -> anyhow::Result<DateTime<Utc>> {
    let mut chars = input.chars();
    let Some(unit) = chars.next_back() else {
        bail!("expected RFC 3339, YYYY-MM-DD, or an offset like 7d");
    };
    let value: i64 = chars
        .as_str()
        .parse()
        .context("expected RFC 3339, YYYY-MM-DD, or an offset like 7d")?;

    let delta = match unit {
        'm' => TimeDelta::minutes(value),
        'h' => TimeDelta::hours(value),
        'd' => TimeDelta::days(value),
        'w' => TimeDelta::weeks(value),
        other => bail!("unknown offset unit {other:?}, expected m, h, d, or w"),
    };
    Ok(Utc::now() - delta)
}

/// Rejects moods outside the scale.
pub(crate) fn validate_mood(mood: f64) -> anyhow::Result<()> {
    if !(MOOD_RANGE.0..=MOOD_RANGE.1).contains(&mood) {
        bail!("mood must be between {} and {}", MOOD_RANGE.0, MOOD_RANGE.1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_timestamps() {
        let parsed = parse_datetime("2021-06-15T09:30:00.000Z").unwrap();
        assert_eq!(mt_core::format_timestamp(parsed), "2021-06-15T09:30:00.000Z");
    }

    #[test]
    fn parses_plain_dates_as_utc_midnight() {
        let parsed = parse_datetime("2021-06-15").unwrap();
        assert_eq!(mt_core::format_timestamp(parsed), "2021-06-15T00:00:00.000Z");
    }

    #[test]
    fn parses_relative_offsets_back_from_now() {
        let parsed = parse_datetime("2h").unwrap();
        let expected = Utc::now() - TimeDelta::hours(2);
        assert!((parsed - expected).num_seconds().abs() < 5);
    }

    #[test]
    fn rejects_unknown_forms() {
        assert!(parse_datetime("yesterday").is_err());
        assert!(parse_datetime("10x").is_err());
        assert!(parse_datetime("").is_err());
    }

    #[test]
    fn moods_must_stay_on_the_scale() {
        assert!(validate_mood(0.0).is_ok());
        assert!(validate_mood(10.0).is_ok());
        assert!(validate_mood(7.5).is_ok());
        assert!(validate_mood(-0.1).is_err());
        assert!(validate_mood(10.1).is_err());
        assert!(validate_mood(f64::NAN).is_err());
    }
}
