//! Phase engine.
//!
//! A pure transition function over [`TimerState`]. It performs no I/O and
//! owns no clock: the session store feeds it one [`Action`] at a time and the
//! clock source turns wall-clock seconds into [`Action::Tick`].
//!
//! ## Tabata phases
//!
//! ```text
//! work -> rest -> work -> rest ... (sets cycles)
//!                               \-> longrest -> work (next sequence)
//!                               \-> completed (last sequence)
//! ```
//!
//! Every action is total: inputs that make no sense in the current state
//! (a tick while paused, a skip on the chronometer, an empty sequence list)
//! return the state unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::{
    SequencePatch, SetPatch, TabataSequence, TabataSet, TimerMode, TimerPhase, TimerState,
};

/// Everything that can change a [`TimerState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Start,
    Pause,
    Reset,
    Tick,
    NextPhase,
    SetMode(TimerMode),
    AddSequence(TabataSequence),
    UpdateSequence { id: String, patch: SequencePatch },
    DeleteSequence(String),
    ClearSequences,
    LoadSet(String),
    ToggleAudio,
    ToggleVibration,
    SetCountdown(u64),
    Complete,
    AddSet(TabataSet),
    UpdateSet {
        id: String,
        patch: SetPatch,
        at: DateTime<Utc>,
    },
    DeleteSet(String),
    ReplaceSets(Vec<TabataSet>),
    ResetStats,
}

impl Action {
    /// Short name used in logs and events.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Pause => "pause",
            Action::Reset => "reset",
            Action::Tick => "tick",
            Action::NextPhase => "next_phase",
            Action::SetMode(_) => "set_mode",
            Action::AddSequence(_) => "add_sequence",
            Action::UpdateSequence { .. } => "update_sequence",
            Action::DeleteSequence(_) => "delete_sequence",
            Action::ClearSequences => "clear_sequences",
            Action::LoadSet(_) => "load_set",
            Action::ToggleAudio => "toggle_audio",
            Action::ToggleVibration => "toggle_vibration",
            Action::SetCountdown(_) => "set_countdown",
            Action::Complete => "complete",
            Action::AddSet(_) => "add_set",
            Action::UpdateSet { .. } => "update_set",
            Action::DeleteSet(_) => "delete_set",
            Action::ReplaceSets(_) => "replace_sets",
            Action::ResetStats => "reset_stats",
        }
    }
}

/// Apply `action` to `state`, returning the next state.
pub fn reduce(state: &TimerState, action: &Action) -> TimerState {
    let mut next = state.clone();
    apply(&mut next, action);
    next
}

fn apply(state: &mut TimerState, action: &Action) {
    match action {
        Action::Start => {
            if state.is_running || state.is_completed {
                return;
            }
            state.is_running = true;
            state.is_paused = false;
        }
        Action::Pause => {
            if !state.is_running {
                return;
            }
            state.is_running = false;
            state.is_paused = true;
        }
        Action::Reset => reset_position(state),
        Action::Tick => tick(state),
        Action::NextPhase => next_phase(state),
        Action::SetMode(mode) => {
            state.current_mode = *mode;
            reset_position(state);
            state.sync_sequence_total();
        }
        Action::AddSequence(sequence) => {
            if sequence.validate().is_err()
                || state.tabata_sequences.iter().any(|s| s.id == sequence.id)
            {
                return;
            }
            state.tabata_sequences.push(sequence.clone());
            state.sync_sequence_total();
        }
        Action::UpdateSequence { id, patch } => {
            let Some(existing) = state.tabata_sequences.iter_mut().find(|s| &s.id == id) else {
                return;
            };
            let mut updated = existing.clone();
            updated.apply(patch);
            if updated.validate().is_ok() {
                *existing = updated;
            }
        }
        Action::DeleteSequence(id) => {
            let before = state.tabata_sequences.len();
            state.tabata_sequences.retain(|s| &s.id != id);
            if state.tabata_sequences.len() == before {
                return;
            }
            state.current_sequence_index = state
                .current_sequence_index
                .min(state.tabata_sequences.len().saturating_sub(1));
            state.sync_sequence_total();
        }
        Action::ClearSequences => {
            state.tabata_sequences.clear();
            state.current_sequence_index = 0;
            state.current_set = 0;
            state.current_set_cycle = 0;
            state.sync_sequence_total();
        }
        Action::LoadSet(set_id) => {
            let Some(set) = state.tabata_sets.iter().find(|s| &s.id == set_id) else {
                return;
            };
            state.tabata_sequences = set.sequences.clone();
            state.current_mode = TimerMode::Tabata;
            reset_position(state);
            state.sync_sequence_total();
        }
        Action::ToggleAudio => state.audio_enabled = !state.audio_enabled,
        Action::ToggleVibration => state.vibration_enabled = !state.vibration_enabled,
        Action::SetCountdown(secs) => {
            if *secs == 0 {
                return;
            }
            state.countdown_duration = *secs;
            if state.current_mode == TimerMode::SimpleCountdown {
                reset_position(state);
            }
        }
        Action::Complete => {
            if state.current_mode != TimerMode::SimpleCountdown || state.is_completed {
                return;
            }
            finish_countdown(state);
        }
        Action::AddSet(set) => {
            if state.tabata_sets.iter().any(|s| s.id == set.id) {
                return;
            }
            state.tabata_sets.push(set.clone());
        }
        Action::UpdateSet { id, patch, at } => {
            if patch.validate().is_err() {
                return;
            }
            if let Some(set) = state.tabata_sets.iter_mut().find(|s| &s.id == id) {
                set.apply(patch, *at);
            }
        }
        Action::DeleteSet(id) => state.tabata_sets.retain(|s| &s.id != id),
        Action::ReplaceSets(sets) => state.tabata_sets = sets.clone(),
        Action::ResetStats => state.session_stats = Default::default(),
    }
}

/// Stop the run and rewind every position counter. Stats are kept.
fn reset_position(state: &mut TimerState) {
    state.is_running = false;
    state.is_paused = false;
    state.is_completed = false;
    state.current_time = 0;
    state.current_sequence_index = 0;
    state.current_set = 0;
    state.current_set_cycle = 0;
    state.current_phase = state.current_mode.initial_phase();
}

fn tick(state: &mut TimerState) {
    if !state.should_tick() || state.is_completed {
        return;
    }
    let boundary = match state.current_mode {
        TimerMode::Chronometer => None,
        TimerMode::SimpleCountdown => Some(state.countdown_duration),
        TimerMode::Tabata => {
            let Some(sequence) = state.current_sequence() else {
                return;
            };
            match sequence.phase_duration(state.current_phase) {
                Some(duration) => Some(duration),
                None => return,
            }
        }
    };

    state.current_time += 1;
    state.session_stats.total_time += 1;

    let Some(boundary) = boundary else {
        return;
    };
    if state.current_time < boundary {
        return;
    }
    match state.current_mode {
        TimerMode::SimpleCountdown => finish_countdown(state),
        TimerMode::Tabata => advance_tabata(state),
        TimerMode::Chronometer => {}
    }
}

fn next_phase(state: &mut TimerState) {
    if state.current_mode != TimerMode::Tabata || state.is_completed {
        return;
    }
    let in_tabata_phase = state
        .current_sequence()
        .and_then(|s| s.phase_duration(state.current_phase))
        .is_some();
    if !in_tabata_phase {
        return;
    }
    advance_tabata(state);
}

/// One step of the Tabata state machine: the active phase's boundary has
/// been reached (by elapsed time or by a manual skip).
fn advance_tabata(state: &mut TimerState) {
    let Some(sets) = state.current_sequence().map(|s| s.sets) else {
        return;
    };
    state.current_time = 0;
    match state.current_phase {
        TimerPhase::Work => state.current_phase = TimerPhase::Rest,
        TimerPhase::Rest => {
            state.current_set_cycle += 1;
            if state.current_set_cycle < sets {
                state.current_phase = TimerPhase::Work;
                return;
            }
            state.session_stats.completed_sets += 1;
            if has_next_sequence(state) {
                state.current_phase = TimerPhase::LongRest;
                state.current_set += 1;
            } else {
                finish_list(state);
            }
        }
        // The following sequence may have been deleted during the long rest.
        TimerPhase::LongRest if !has_next_sequence(state) => finish_list(state),
        TimerPhase::LongRest => {
            state.current_sequence_index += 1;
            state.current_set_cycle = 0;
            state.current_phase = TimerPhase::Work;
        }
        TimerPhase::Chronometer | TimerPhase::SimpleCountdown => {}
    }
}

fn has_next_sequence(state: &TimerState) -> bool {
    state.current_sequence_index + 1 < state.tabata_sequences.len()
}

fn finish_list(state: &mut TimerState) {
    state.is_running = false;
    state.is_completed = true;
    state.session_stats.completed_sequences += 1;
}

fn finish_countdown(state: &mut TimerState) {
    state.current_time = state.countdown_duration;
    state.is_running = false;
    state.is_completed = true;
}
