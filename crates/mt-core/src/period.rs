//! Calendar-period bucketing of mood averages.
//!
//! Buckets are aligned to UTC calendar boundaries. Weeks start on Monday.
//! The bucket sequence runs from the period containing the first sample
//! through the period containing the last, with one closing boundary past
//! the end so the final period has a right edge to average against.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, Months, NaiveTime, TimeDelta, Timelike, Utc};
use thiserror::Error;

use crate::average::average_in_interval;
use crate::event::{Mood, key_time};
use crate::projection::Normalized;

/// Calendar granularity for bucketed averages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    Hour,
    Day,
    Week,
    Month,
    Year,
}

/// Error for unrecognized period names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown period {0:?}, expected one of: hour, day, week, month, year")]
pub struct UnknownPeriod(String);

impl Period {
    pub const ALL: [Self; 5] = [Self::Hour, Self::Day, Self::Week, Self::Month, Self::Year];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    /// First instant of the period containing `date`.
    #[must_use]
    pub fn floor(self, date: DateTime<Utc>) -> DateTime<Utc> {
        let day = date.date_naive();
        let midnight = match self {
            Self::Hour => {
                let hour = NaiveTime::from_hms_opt(date.hour(), 0, 0).unwrap_or(NaiveTime::MIN);
                return day.and_time(hour).and_utc();
            }
            Self::Day => day,
            Self::Week => day - Days::new(u64::from(day.weekday().num_days_from_monday())),
            Self::Month => day.with_day(1).unwrap_or(day),
            Self::Year => day
                .with_day(1)
                .and_then(|first| first.with_month(1))
                .unwrap_or(day),
        };
        midnight.and_time(NaiveTime::MIN).and_utc()
    }

    /// First instant of the period after the one starting at `start`.
    #[must_use]
    pub fn next_start(self, start: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Hour => start + TimeDelta::hours(1),
            Self::Day => start + Days::new(1),
            Self::Week => start + Days::new(7),
            Self::Month => start + Months::new(1),
            Self::Year => start + Months::new(12),
        }
    }

    /// Aggregate key for the period starting at `start`. Hour keys keep the
    /// full timestamp form; coarser periods use the date alone.
    #[must_use]
    pub fn format_key(self, start: DateTime<Utc>) -> String {
        match self {
            Self::Hour => start.format("%Y-%m-%dT%H:00:00.000Z").to_string(),
            Self::Day | Self::Week | Self::Month | Self::Year => {
                start.format("%Y-%m-%d").to_string()
            }
        }
    }

    /// Period starts from the one containing `first` through the one
    /// containing `last`, inclusive.
    fn starts_through(self, first: DateTime<Utc>, last: DateTime<Utc>) -> Vec<DateTime<Utc>> {
        let mut starts = Vec::new();
        let mut current = self.floor(first);
        while current <= last {
            starts.push(current);
            current = self.next_start(current);
        }
        starts
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = UnknownPeriod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            other => Err(UnknownPeriod(other.to_string())),
        }
    }
}

/// Buckets the mood projection into consecutive periods, each holding the
/// time-weighted average of the signal across it.
///
/// Keys ascend chronologically. A projection with exactly one sample
/// yields a single bucket holding that sample's raw value; periods whose
/// average comes back empty are omitted.
#[must_use]
pub fn bucket_by_period(moods: &Normalized<Mood>, period: Period) -> Normalized<f64> {
    let mut averages = Normalized::default();

    let (Some(first_id), Some(last_id)) = (moods.all_ids.first(), moods.all_ids.last()) else {
        return averages;
    };
    let (Some(first), Some(last)) = (key_time(first_id), key_time(last_id)) else {
        return averages;
    };

    let mut starts = period.starts_through(first, last);
    let Some(&last_start) = starts.last() else {
        return averages;
    };

    if moods.all_ids.len() == 1 {
        if let Some(sample) = moods.get(first_id) {
            averages.insert(period.format_key(last_start), sample.mood);
        }
        return averages;
    }

    starts.push(period.next_start(last_start));

    for bounds in starts.windows(2) {
        if let Some(average) = average_in_interval(moods, bounds[0], bounds[1]) {
            averages.insert(period.format_key(bounds[0]), average);
        }
    }

    averages
}
