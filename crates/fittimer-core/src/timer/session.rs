//! Session store: the only owner of the [`TimerState`].
//!
//! Every operation builds an [`Action`], runs it through [`reduce`], derives
//! the resulting [`Event`]s and, if anything changed, hands a [`Transition`]
//! to each registered [`SessionObserver`] (persistence, feedback, ...).
//! Operations take `&mut self`, so actions are applied strictly in call
//! order.

use chrono::Utc;

use super::engine::{reduce, Action};
use super::state::{
    SequenceConfig, SequencePatch, SetPatch, TabataSet, TimerMode, TimerState,
};
use crate::error::ValidationError;
use crate::events::{self, Event};
use crate::storage::PersistedState;

/// One applied action, as seen by observers.
#[derive(Debug)]
pub struct Transition<'a> {
    pub action: &'a Action,
    pub previous: &'a TimerState,
    pub current: &'a TimerState,
    pub events: &'a [Event],
}

/// Reacts to state changes. Observers get read-only access; they cannot
/// feed actions back into the store.
pub trait SessionObserver {
    fn on_transition(&mut self, transition: &Transition<'_>);
}

pub struct SessionStore {
    state: TimerState,
    observers: Vec<Box<dyn SessionObserver>>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("state", &self.state)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(TimerState::default())
    }
}

impl SessionStore {
    pub fn new(state: TimerState) -> Self {
        Self {
            state,
            observers: Vec::new(),
        }
    }

    /// Start from `base`, overlaid with a persisted snapshot if one exists.
    pub fn restore(base: TimerState, persisted: Option<PersistedState>) -> Self {
        let state = match persisted {
            Some(snapshot) => snapshot.hydrate(base),
            None => base,
        };
        Self::new(state)
    }

    pub fn add_observer(&mut self, observer: Box<dyn SessionObserver>) {
        self.observers.push(observer);
    }

    pub fn with_observer(mut self, observer: Box<dyn SessionObserver>) -> Self {
        self.add_observer(observer);
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn snapshot(&self) -> Event {
        Event::snapshot(&self.state)
    }

    // ── Dispatch ─────────────────────────────────────────────────────

    /// Apply one action and notify observers. Returns the derived events;
    /// an empty list means the action was a no-op.
    pub fn dispatch(&mut self, action: Action) -> Vec<Event> {
        let next = reduce(&self.state, &action);
        if next == self.state {
            tracing::trace!(action = action.kind(), "no-op action");
            return Vec::new();
        }
        let previous = std::mem::replace(&mut self.state, next);
        let events = events::derive(&previous, &self.state, &action);
        if action != Action::Tick {
            tracing::debug!(
                action = action.kind(),
                phase = %self.state.current_phase,
                time = self.state.current_time,
                "applied action"
            );
        }

        let transition = Transition {
            action: &action,
            previous: &previous,
            current: &self.state,
            events: &events,
        };
        for observer in &mut self.observers {
            observer.on_transition(&transition);
        }
        events
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Vec<Event> {
        self.dispatch(Action::Start)
    }

    pub fn pause(&mut self) -> Vec<Event> {
        self.dispatch(Action::Pause)
    }

    pub fn reset(&mut self) -> Vec<Event> {
        self.dispatch(Action::Reset)
    }

    pub fn tick(&mut self) -> Vec<Event> {
        self.dispatch(Action::Tick)
    }

    pub fn next_phase(&mut self) -> Vec<Event> {
        self.dispatch(Action::NextPhase)
    }

    pub fn set_mode(&mut self, mode: TimerMode) -> Vec<Event> {
        self.dispatch(Action::SetMode(mode))
    }

    /// Append a new sequence and return its generated id.
    ///
    /// # Errors
    /// Returns a validation error if any duration is zero or the name is empty.
    pub fn add_sequence(&mut self, config: SequenceConfig) -> Result<String, ValidationError> {
        config.validate()?;
        let id = uuid::Uuid::new_v4().to_string();
        self.dispatch(Action::AddSequence(config.into_sequence(id.clone())));
        Ok(id)
    }

    /// # Errors
    /// Returns `NotFound` for an unknown id or a validation error if the
    /// patched sequence would be invalid.
    pub fn update_sequence(
        &mut self,
        id: &str,
        patch: SequencePatch,
    ) -> Result<Vec<Event>, ValidationError> {
        let Some(existing) = self.state.tabata_sequences.iter().find(|s| s.id == id) else {
            return Err(not_found("sequence", id));
        };
        let mut updated = existing.clone();
        updated.apply(&patch);
        updated.validate()?;
        Ok(self.dispatch(Action::UpdateSequence {
            id: id.to_string(),
            patch,
        }))
    }

    pub fn delete_sequence(&mut self, id: &str) -> Vec<Event> {
        self.dispatch(Action::DeleteSequence(id.to_string()))
    }

    pub fn clear_sequences(&mut self) -> Vec<Event> {
        self.dispatch(Action::ClearSequences)
    }

    /// Replace the working list with a copy of a catalog set.
    ///
    /// # Errors
    /// Returns `NotFound` if no set with `set_id` is in the catalog.
    pub fn load_set(&mut self, set_id: &str) -> Result<Vec<Event>, ValidationError> {
        if !self.state.tabata_sets.iter().any(|s| s.id == set_id) {
            return Err(not_found("set", set_id));
        }
        Ok(self.dispatch(Action::LoadSet(set_id.to_string())))
    }

    /// Save a copy of the working list into the in-memory catalog.
    ///
    /// # Errors
    /// Rejects an empty name or an empty working list.
    pub fn save_set(
        &mut self,
        name: &str,
        description: Option<&str>,
    ) -> Result<String, ValidationError> {
        if name.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "name".into(),
                message: "set name is required".into(),
            });
        }
        if self.state.tabata_sequences.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "sequences".into(),
                message: "there are no sequences to save".into(),
            });
        }
        let now = Utc::now();
        let set = TabataSet {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            description: description.map(str::to_string).filter(|d| !d.is_empty()),
            sequences: self.state.tabata_sequences.clone(),
            created_at: now,
            updated_at: now,
        };
        let id = set.id.clone();
        self.dispatch(Action::AddSet(set));
        Ok(id)
    }

    /// # Errors
    /// Returns `NotFound` for an unknown id or a validation error for the patch.
    pub fn update_set(&mut self, id: &str, patch: SetPatch) -> Result<Vec<Event>, ValidationError> {
        if !self.state.tabata_sets.iter().any(|s| s.id == id) {
            return Err(not_found("set", id));
        }
        patch.validate()?;
        Ok(self.dispatch(Action::UpdateSet {
            id: id.to_string(),
            patch,
            at: Utc::now(),
        }))
    }

    pub fn delete_set(&mut self, id: &str) -> Vec<Event> {
        self.dispatch(Action::DeleteSet(id.to_string()))
    }

    /// Replace the in-memory catalog, e.g. with what a `SetCatalog` listed.
    pub fn replace_sets(&mut self, sets: Vec<TabataSet>) -> Vec<Event> {
        self.dispatch(Action::ReplaceSets(sets))
    }

    pub fn toggle_audio(&mut self) -> Vec<Event> {
        self.dispatch(Action::ToggleAudio)
    }

    pub fn toggle_vibration(&mut self) -> Vec<Event> {
        self.dispatch(Action::ToggleVibration)
    }

    /// # Errors
    /// Rejects a zero duration.
    pub fn set_countdown(&mut self, secs: u64) -> Result<Vec<Event>, ValidationError> {
        if secs == 0 {
            return Err(ValidationError::InvalidValue {
                field: "countdown".into(),
                message: "countdown must be at least 1 second".into(),
            });
        }
        Ok(self.dispatch(Action::SetCountdown(secs)))
    }

    pub fn complete(&mut self) -> Vec<Event> {
        self.dispatch(Action::Complete)
    }

    pub fn reset_stats(&mut self) -> Vec<Event> {
        self.dispatch(Action::ResetStats)
    }
}

fn not_found(collection: &str, id: &str) -> ValidationError {
    ValidationError::NotFound {
        collection: collection.into(),
        id: id.into(),
    }
}
