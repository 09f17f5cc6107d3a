//! Account-level settings reconciled by last write.

use serde::{Deserialize, Serialize};

/// User preferences shared across devices.
///
/// Unlike events, settings are not an append-only log: replicas exchange
/// whole values and keep whichever was modified most recently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Canonical timestamp of the last modification.
    pub updated_at: String,
    /// Whether new mood entries should record the device location.
    pub record_location: bool,
}

impl Settings {
    /// Last-write-wins comparison on canonical timestamps.
    #[must_use]
    pub fn newer_than(&self, other: &Self) -> bool {
        self.updated_at > other.updated_at
    }
}
