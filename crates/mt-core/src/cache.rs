//! Explicit memoization of state derived from the event log.

use std::collections::HashMap;

use crate::event::Event;
use crate::period::{Period, bucket_by_period};
use crate::projection::{Normalized, Projections, project};

/// Caches projections and per-period aggregates against a version counter.
///
/// The cache never observes the log itself: the owner passes the current
/// snapshot into each lookup and must call [`DerivedCache::invalidate`]
/// after every append, merge, or deletion. A lookup whose stored version
/// is stale recomputes; anything else returns the memoized value without
/// touching the events.
#[derive(Debug, Default)]
pub struct DerivedCache {
    version: u64,
    projections: Option<(u64, Projections)>,
    averages: HashMap<Period, (u64, Normalized<f64>)>,
}

impl DerivedCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks every cached value stale. Call after any log mutation.
    pub fn invalidate(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    /// Projections folded from `events`, recomputed only when stale.
    pub fn projections(&mut self, events: &[Event]) -> &Projections {
        if !matches!(&self.projections, Some((version, _)) if *version == self.version) {
            self.projections = None;
        }
        let version = self.version;
        let (_, projections) = self
            .projections
            .get_or_insert_with(|| (version, project(events)));
        projections
    }

    /// Bucketed averages for `period`, recomputed only when stale.
    pub fn averages_by_period(&mut self, events: &[Event], period: Period) -> &Normalized<f64> {
        let version = self.version;
        if !matches!(self.averages.get(&period), Some((cached, _)) if *cached == version) {
            let averages = bucket_by_period(&self.projections(events).moods, period);
            self.averages.insert(period, (version, averages));
        }
        let (_, averages) = self
            .averages
            .entry(period)
            .or_insert_with(|| (version, Normalized::default()));
        averages
    }
}
