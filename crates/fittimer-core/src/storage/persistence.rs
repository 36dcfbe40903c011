//! Durable snapshot of the session.
//!
//! Only a subset of [`TimerState`] is written: the run flags and the set
//! catalog are left out, so a restored session always comes back stopped.
//! Saving is best-effort. A failed write is logged and the in-memory state
//! stays as it is.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::Database;
use crate::error::DatabaseError;
use crate::timer::{
    SessionObserver, SessionStats, TabataSequence, TimerMode, TimerPhase, TimerState, Transition,
};

/// Key the snapshot lives under in the kv table.
pub const STATE_KEY: &str = "fittimer-pro-state";

/// The persisted subset of [`TimerState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    pub current_mode: TimerMode,
    pub current_time: u64,
    pub current_phase: TimerPhase,
    pub current_sequence_index: usize,
    pub current_set: u32,
    pub current_set_cycle: u32,
    pub tabata_sequences: Vec<TabataSequence>,
    pub audio_enabled: bool,
    pub vibration_enabled: bool,
    pub session_stats: SessionStats,
    #[serde(default = "default_countdown")]
    pub countdown_duration: u64,
    #[serde(default)]
    pub is_completed: bool,
}

fn default_countdown() -> u64 {
    crate::timer::DEFAULT_COUNTDOWN_SECS
}

impl From<&TimerState> for PersistedState {
    fn from(state: &TimerState) -> Self {
        Self {
            current_mode: state.current_mode,
            current_time: state.current_time,
            current_phase: state.current_phase,
            current_sequence_index: state.current_sequence_index,
            current_set: state.current_set,
            current_set_cycle: state.current_set_cycle,
            tabata_sequences: state.tabata_sequences.clone(),
            audio_enabled: state.audio_enabled,
            vibration_enabled: state.vibration_enabled,
            session_stats: state.session_stats,
            countdown_duration: state.countdown_duration,
            is_completed: state.is_completed,
        }
    }
}

impl PersistedState {
    /// Overlay this snapshot on `base`. The result is never running.
    pub fn hydrate(self, base: TimerState) -> TimerState {
        let mut state = TimerState {
            is_running: false,
            is_paused: false,
            current_mode: self.current_mode,
            current_time: self.current_time,
            current_phase: self.current_phase,
            current_sequence_index: self.current_sequence_index,
            current_set: self.current_set,
            current_set_cycle: self.current_set_cycle,
            tabata_sequences: self.tabata_sequences,
            audio_enabled: self.audio_enabled,
            vibration_enabled: self.vibration_enabled,
            session_stats: self.session_stats,
            countdown_duration: self.countdown_duration.max(1),
            is_completed: self.is_completed,
            ..base
        };
        state.current_sequence_index = state
            .current_sequence_index
            .min(state.tabata_sequences.len().saturating_sub(1));
        state.sync_sequence_total();
        state
    }

    /// Reject snapshots that could not have been produced by the engine.
    fn is_consistent(&self) -> bool {
        let phase_fits_mode = match self.current_mode {
            TimerMode::Chronometer => self.current_phase == TimerPhase::Chronometer,
            TimerMode::SimpleCountdown => self.current_phase == TimerPhase::SimpleCountdown,
            TimerMode::Tabata => matches!(
                self.current_phase,
                TimerPhase::Work | TimerPhase::Rest | TimerPhase::LongRest
            ),
        };
        phase_fits_mode
            && self
                .tabata_sequences
                .iter()
                .all(|s| s.validate().is_ok())
    }
}

/// Where snapshots are kept.
pub trait StatePersistence {
    /// Missing or unreadable data yields `None`.
    fn load(&self) -> Option<PersistedState>;

    /// # Errors
    /// Returns an error if the snapshot could not be written.
    fn save(&self, state: &PersistedState) -> Result<(), DatabaseError>;

    /// # Errors
    /// Returns an error if the snapshot could not be removed.
    fn clear(&self) -> Result<(), DatabaseError>;
}

/// Snapshot stored as JSON in the SQLite kv table.
pub struct DatabasePersistence {
    db: Database,
}

impl DatabasePersistence {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl StatePersistence for DatabasePersistence {
    fn load(&self) -> Option<PersistedState> {
        let json = match self.db.kv_get(STATE_KEY) {
            Ok(Some(json)) => json,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read persisted timer state");
                return None;
            }
        };
        decode(&json)
    }

    fn save(&self, state: &PersistedState) -> Result<(), DatabaseError> {
        let json = serde_json::to_string(state)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        self.db.kv_set(STATE_KEY, &json)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), DatabaseError> {
        self.db.kv_delete(STATE_KEY)?;
        Ok(())
    }
}

/// In-process storage; clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    slot: Rc<RefCell<Option<String>>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put raw text in the slot, as if another writer had left it there.
    pub fn put_raw(&self, raw: &str) {
        *self.slot.borrow_mut() = Some(raw.to_string());
    }
}

impl StatePersistence for MemoryPersistence {
    fn load(&self) -> Option<PersistedState> {
        decode(self.slot.borrow().as_deref()?)
    }

    fn save(&self, state: &PersistedState) -> Result<(), DatabaseError> {
        let json = serde_json::to_string(state)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        *self.slot.borrow_mut() = Some(json);
        Ok(())
    }

    fn clear(&self) -> Result<(), DatabaseError> {
        self.slot.borrow_mut().take();
        Ok(())
    }
}

fn decode(json: &str) -> Option<PersistedState> {
    match serde_json::from_str::<PersistedState>(json) {
        Ok(state) if state.is_consistent() => Some(state),
        Ok(_) => {
            tracing::warn!("persisted timer state is inconsistent, starting fresh");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "persisted timer state is corrupt, starting fresh");
            None
        }
    }
}

/// Writes a snapshot after every state change.
pub struct PersistenceObserver {
    backend: Box<dyn StatePersistence>,
}

impl PersistenceObserver {
    pub fn new(backend: Box<dyn StatePersistence>) -> Self {
        Self { backend }
    }
}

impl SessionObserver for PersistenceObserver {
    fn on_transition(&mut self, transition: &Transition<'_>) {
        let snapshot = PersistedState::from(transition.current);
        if snapshot == PersistedState::from(transition.previous) {
            return;
        }
        if let Err(e) = self.backend.save(&snapshot) {
            tracing::warn!(
                error = %e,
                action = transition.action.kind(),
                "failed to persist timer state"
            );
        }
    }
}
