//! Folding the event log into normalized current-state projections.

use std::collections::HashMap;

use serde::Serialize;

use crate::event::{Event, EventKind, Meditation, Mood};

/// An ordered collection of entities keyed by canonical timestamp strings.
///
/// `all_ids` preserves the order entities were created in; for a log
/// appended in creation order that is ascending chronological order, which
/// the range selectors require. Every id in `all_ids` has an entry in
/// `by_id`. The reverse does not always hold: an update event naming an id
/// that was never created leaves a merged entry reachable by lookup only.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Normalized<T> {
    pub all_ids: Vec<String>,
    pub by_id: HashMap<String, T>,
}

impl<T> Normalized<T> {
    /// Appends a new entity under `id`.
    pub fn insert(&mut self, id: String, value: T) {
        self.all_ids.push(id.clone());
        self.by_id.insert(id, value);
    }

    /// Removes the entity under `id`, scanning the id sequence from the
    /// end. Returns false, removing nothing, when the id is not present.
    pub fn remove(&mut self, id: &str) -> bool {
        let Some(index) = self.all_ids.iter().rposition(|existing| existing == id) else {
            return false;
        };
        self.all_ids.remove(index);
        self.by_id.remove(id);
        true
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&T> {
        self.by_id.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.all_ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.all_ids.is_empty()
    }
}

/// Current state derived from the event log.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Projections {
    pub moods: Normalized<Mood>,
    pub meditations: Normalized<Meditation>,
}

/// Folds the event log, in append order, into normalized projections.
///
/// The fold never fails: a delete naming an unknown id is logged and
/// skipped, and an update naming an unknown id merges into a default entry
/// (see [`Normalized`]).
#[must_use]
pub fn project(events: &[Event]) -> Projections {
    let mut projections = Projections::default();

    for event in events {
        match &event.kind {
            EventKind::MoodCreate(mood) => {
                projections.moods.insert(event.id(), mood.clone());
            }
            EventKind::MoodUpdate(update) => {
                let entry = projections.moods.by_id.entry(update.id.clone()).or_default();
                if let Some(mood) = update.mood {
                    entry.mood = mood;
                }
                if let Some(description) = &update.description {
                    entry.description = Some(description.clone());
                }
                entry.updated_at = Some(event.id());
            }
            EventKind::MoodDelete(id) => {
                if !projections.moods.remove(id) {
                    tracing::warn!(id = %id, "mood delete references an unknown id");
                }
            }
            EventKind::MeditationCreate(meditation) => {
                projections.meditations.insert(event.id(), *meditation);
            }
            EventKind::MeditationDelete(id) => {
                if !projections.meditations.remove(id) {
                    tracing::warn!(id = %id, "meditation delete references an unknown id");
                }
            }
        }
    }

    projections
}
