use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Action, TimerMode, TimerPhase, TimerState};

/// Every state change in the system produces one or more Events.
/// The CLI prints them; observers receive them alongside the states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        mode: TimerMode,
        phase: TimerPhase,
        at: DateTime<Utc>,
    },
    TimerPaused {
        current_time: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        mode: TimerMode,
        at: DateTime<Utc>,
    },
    PhaseChanged {
        from: TimerPhase,
        to: TimerPhase,
        sequence_index: usize,
        set_cycle: u32,
        skipped: bool,
        at: DateTime<Utc>,
    },
    /// The last cycle of the last sequence finished.
    WorkoutCompleted {
        completed_sequences: u64,
        total_time: u64,
        at: DateTime<Utc>,
    },
    CountdownCompleted {
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    ModeChanged {
        from: TimerMode,
        to: TimerMode,
        at: DateTime<Utc>,
    },
    SequencesChanged {
        sequence_total: usize,
        at: DateTime<Utc>,
    },
    SetLoaded {
        set_id: String,
        sequence_total: usize,
        at: DateTime<Utc>,
    },
    CatalogChanged {
        set_count: usize,
        at: DateTime<Utc>,
    },
    FeedbackToggled {
        audio_enabled: bool,
        vibration_enabled: bool,
        at: DateTime<Utc>,
    },
    CountdownConfigured {
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    StatsReset {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        mode: TimerMode,
        phase: TimerPhase,
        is_running: bool,
        is_paused: bool,
        is_completed: bool,
        current_time: u64,
        remaining_secs: Option<u64>,
        phase_progress: f64,
        sequence_index: usize,
        sequence_total: usize,
        set_cycle: u32,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Build a full state snapshot event.
    pub fn snapshot(state: &TimerState) -> Self {
        Event::StateSnapshot {
            mode: state.current_mode,
            phase: state.current_phase,
            is_running: state.is_running,
            is_paused: state.is_paused,
            is_completed: state.is_completed,
            current_time: state.current_time,
            remaining_secs: state.remaining_secs(),
            phase_progress: state.phase_progress(),
            sequence_index: state.current_sequence_index,
            sequence_total: state.sequence_total,
            set_cycle: state.current_set_cycle,
            at: Utc::now(),
        }
    }
}

/// Describe the difference between two states produced by `action`.
///
/// Returns nothing when the action was a no-op.
pub fn derive(previous: &TimerState, current: &TimerState, action: &Action) -> Vec<Event> {
    if previous == current {
        return Vec::new();
    }
    let at = Utc::now();
    let mut events = Vec::new();

    match action {
        Action::Start => events.push(Event::TimerStarted {
            mode: current.current_mode,
            phase: current.current_phase,
            at,
        }),
        Action::Pause => events.push(Event::TimerPaused {
            current_time: current.current_time,
            at,
        }),
        Action::Reset => events.push(Event::TimerReset {
            mode: current.current_mode,
            at,
        }),
        Action::SetMode(_) => events.push(Event::ModeChanged {
            from: previous.current_mode,
            to: current.current_mode,
            at,
        }),
        Action::AddSequence(_)
        | Action::UpdateSequence { .. }
        | Action::DeleteSequence(_)
        | Action::ClearSequences => events.push(Event::SequencesChanged {
            sequence_total: current.tabata_sequences.len(),
            at,
        }),
        Action::LoadSet(id) => events.push(Event::SetLoaded {
            set_id: id.clone(),
            sequence_total: current.sequence_total,
            at,
        }),
        Action::AddSet(_) | Action::UpdateSet { .. } | Action::DeleteSet(_) | Action::ReplaceSets(_) => {
            events.push(Event::CatalogChanged {
                set_count: current.tabata_sets.len(),
                at,
            });
        }
        Action::ToggleAudio | Action::ToggleVibration => events.push(Event::FeedbackToggled {
            audio_enabled: current.audio_enabled,
            vibration_enabled: current.vibration_enabled,
            at,
        }),
        Action::SetCountdown(secs) => events.push(Event::CountdownConfigured {
            duration_secs: *secs,
            at,
        }),
        Action::ResetStats => events.push(Event::StatsReset { at }),
        Action::Tick | Action::NextPhase | Action::Complete => {}
    }

    if matches!(action, Action::Tick | Action::NextPhase)
        && previous.current_phase != current.current_phase
    {
        events.push(Event::PhaseChanged {
            from: previous.current_phase,
            to: current.current_phase,
            sequence_index: current.current_sequence_index,
            set_cycle: current.current_set_cycle,
            skipped: matches!(action, Action::NextPhase),
            at,
        });
    }

    if !previous.is_completed && current.is_completed {
        events.push(match current.current_mode {
            TimerMode::SimpleCountdown => Event::CountdownCompleted {
                duration_secs: current.countdown_duration,
                at,
            },
            _ => Event::WorkoutCompleted {
                completed_sequences: current.session_stats.completed_sequences,
                total_time: current.session_stats.total_time,
                at,
            },
        });
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::reduce;

    #[test]
    fn noop_produces_no_events() {
        let state = TimerState::default();
        let next = reduce(&state, &Action::Tick);
        assert!(derive(&state, &next, &Action::Tick).is_empty());
    }

    #[test]
    fn plain_tick_has_no_event() {
        let state = reduce(&TimerState::default(), &Action::Start);
        let next = reduce(&state, &Action::Tick);
        assert!(derive(&state, &next, &Action::Tick).is_empty());
    }

    #[test]
    fn countdown_completion_event() {
        let state = reduce(&TimerState::default(), &Action::SetMode(TimerMode::SimpleCountdown));
        let state = reduce(&state, &Action::SetCountdown(1));
        let state = reduce(&state, &Action::Start);
        let next = reduce(&state, &Action::Tick);
        let events = derive(&state, &next, &Action::Tick);
        assert!(matches!(
            events.as_slice(),
            [Event::CountdownCompleted { duration_secs: 1, .. }]
        ));
    }

    #[test]
    fn snapshot_returns_valid_event() {
        match Event::snapshot(&TimerState::default()) {
            Event::StateSnapshot {
                mode,
                current_time,
                remaining_secs,
                ..
            } => {
                assert_eq!(mode, TimerMode::Chronometer);
                assert_eq!(current_time, 0);
                assert_eq!(remaining_secs, None);
            }
            _ => panic!("Expected StateSnapshot"),
        }
    }
}
