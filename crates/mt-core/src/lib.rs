//! Core domain logic for the mood tracker.
//!
//! This crate holds the event-sourced engine, independent of storage and
//! transport:
//!
//! - **Events**: the append-only log entries and their wire shape
//! - **Projection**: folding the log into normalized current state
//! - **Averaging**: time-weighted mood averages over arbitrary windows
//! - **Bucketing**: calendar-period aggregates and trendline sampling
//! - **Meditation statistics**: mood deltas and word-frequency differences
//!   around meditation sessions

pub mod average;
pub mod cache;
pub mod event;
pub mod interval;
pub mod meditation;
pub mod period;
pub mod projection;
pub mod settings;
pub mod stats;
pub mod trend;

pub use average::{MOOD_RANGE, average_in_interval};
pub use cache::DerivedCache;
pub use event::{
    Event, EventKind, Meditation, Mood, MoodUpdate, format_timestamp, parse_timestamp,
};
pub use interval::{
    InvalidRangeError, enveloping_range, ids_in_interval, seconds_meditated_in_interval,
};
pub use meditation::{MEDITATION_STATS_HOURS_RANGE, MeditationStats, meditation_effect_stats};
pub use period::{Period, UnknownPeriod, bucket_by_period};
pub use projection::{Normalized, Projections, project};
pub use settings::Settings;
pub use stats::{format_seconds, mean, normalized_words, std_deviation};
pub use trend::{TRENDLINE_INTERVALS, TrendPoint, trendline_points};
