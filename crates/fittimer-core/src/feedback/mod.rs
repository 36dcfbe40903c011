//! Audio and vibration feedback.
//!
//! [`FeedbackDispatcher`] is a [`SessionObserver`]: it looks at each
//! transition, decides which [`Cue`]s apply and forwards them to a
//! [`FeedbackSink`]. It never touches the timer state. The audio and
//! vibration switches are checked here, not in the engine.

mod cue;

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use cue::{Cue, Tone};

use crate::timer::{Action, SessionObserver, TimerMode, TimerPhase, TimerState, Transition};

/// Feedback switches for one mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeFeedback {
    /// Chime when the phase changes.
    #[serde(default)]
    pub phase_chimes: bool,
    /// Beep at 3, 2 and 1 seconds remaining.
    #[serde(default)]
    pub countdown_cues: bool,
}

/// Which automatic cues each mode gets. Start/pause/next/completion cues
/// are not affected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackPolicy {
    #[serde(default = "chronometer_default")]
    pub chronometer: ModeFeedback,
    #[serde(default = "tabata_default")]
    pub tabata: ModeFeedback,
    #[serde(default = "countdown_default")]
    pub simple_countdown: ModeFeedback,
}

fn chronometer_default() -> ModeFeedback {
    ModeFeedback {
        phase_chimes: false,
        countdown_cues: false,
    }
}

fn tabata_default() -> ModeFeedback {
    ModeFeedback {
        phase_chimes: true,
        countdown_cues: true,
    }
}

fn countdown_default() -> ModeFeedback {
    ModeFeedback {
        phase_chimes: false,
        countdown_cues: true,
    }
}

impl Default for FeedbackPolicy {
    fn default() -> Self {
        Self {
            chronometer: chronometer_default(),
            tabata: tabata_default(),
            simple_countdown: countdown_default(),
        }
    }
}

impl FeedbackPolicy {
    pub fn for_mode(&self, mode: TimerMode) -> ModeFeedback {
        match mode {
            TimerMode::Chronometer => self.chronometer,
            TimerMode::Tabata => self.tabata,
            TimerMode::SimpleCountdown => self.simple_countdown,
        }
    }
}

#[derive(Error, Debug)]
pub enum FeedbackError {
    /// The platform has no such output
    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),

    /// The output exists but refused to play
    #[error("feedback device failed: {0}")]
    Device(String),
}

/// Where cues end up: a speaker, a vibration motor, a terminal bell, a log.
pub trait FeedbackSink {
    /// # Errors
    /// Returns an error if the tones could not be played.
    fn play(&mut self, cue: Cue, tones: &[Tone]) -> Result<(), FeedbackError>;

    /// # Errors
    /// Returns an error if the pattern could not be played.
    fn vibrate(&mut self, cue: Cue, pattern: &[u32]) -> Result<(), FeedbackError>;
}

/// Identity of a last-seconds cue: one per phase instance and second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CountdownKey {
    sequence_index: usize,
    set_cycle: u32,
    phase: TimerPhase,
    remaining: u64,
}

/// Turns transitions into cues and emits them.
///
/// The store only notifies observers of actions that changed the state, so
/// start, pause and next cues fire only for effective actions. In particular
/// a skip outside Tabata mode, or on a completed list, is a no-op and stays
/// silent.
pub struct FeedbackDispatcher<S> {
    sink: S,
    policy: FeedbackPolicy,
    last_countdown: Option<CountdownKey>,
}

impl<S: FeedbackSink> FeedbackDispatcher<S> {
    pub fn new(sink: S, policy: FeedbackPolicy) -> Self {
        Self {
            sink,
            policy,
            last_countdown: None,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Decide which cues a transition calls for, ignoring the enable flags.
    pub fn decide(&mut self, transition: &Transition<'_>) -> Vec<Cue> {
        let previous = transition.previous;
        let current = transition.current;
        let action = transition.action;
        let mut cues = Vec::new();

        match action {
            Action::Start if current.is_running && !previous.is_running => cues.push(Cue::Start),
            Action::Pause if previous.is_running && !current.is_running => cues.push(Cue::Pause),
            Action::NextPhase => cues.push(Cue::Next),
            _ => {}
        }

        let completed = !previous.is_completed && current.is_completed;
        let phase_changed = previous.current_phase != current.current_phase;
        let mode_policy = self.policy.for_mode(current.current_mode);

        if phase_changed
            || matches!(
                action,
                Action::Reset | Action::SetMode(_) | Action::LoadSet(_) | Action::SetCountdown(_)
            )
        {
            self.last_countdown = None;
        }

        if completed {
            cues.push(Cue::Completion);
        } else if phase_changed
            && matches!(action, Action::Tick | Action::NextPhase)
            && previous.current_mode == current.current_mode
            && mode_policy.phase_chimes
        {
            cues.push(Cue::Phase {
                phase: current.current_phase,
            });
        }

        if matches!(action, Action::Tick) && current.should_tick() && mode_policy.countdown_cues {
            if let Some(cue) = self.countdown_cue(current) {
                cues.push(cue);
            }
        }

        cues
    }

    fn countdown_cue(&mut self, state: &TimerState) -> Option<Cue> {
        let remaining = state.remaining_secs()?;
        if !(1..=3).contains(&remaining) {
            return None;
        }
        let key = CountdownKey {
            sequence_index: state.current_sequence_index,
            set_cycle: state.current_set_cycle,
            phase: state.current_phase,
            remaining,
        };
        if self.last_countdown == Some(key) {
            return None;
        }
        self.last_countdown = Some(key);
        Some(Cue::Countdown { remaining })
    }

    /// Send one cue to the sink, honouring the enable flags.
    pub fn emit(&mut self, cue: Cue, audio_enabled: bool, vibration_enabled: bool) {
        let tones = cue.tones();
        if audio_enabled && !tones.is_empty() {
            if let Err(e) = self.sink.play(cue, tones) {
                tracing::warn!(error = %e, cue = %cue.label(), "failed to play tone");
            }
        }
        let pattern = cue.vibration();
        if vibration_enabled && !pattern.is_empty() {
            if let Err(e) = self.sink.vibrate(cue, pattern) {
                tracing::warn!(error = %e, cue = %cue.label(), "failed to vibrate");
            }
        }
    }
}

impl<S: FeedbackSink> SessionObserver for FeedbackDispatcher<S> {
    fn on_transition(&mut self, transition: &Transition<'_>) {
        let current = transition.current;
        for cue in self.decide(transition) {
            self.emit(cue, current.audio_enabled, current.vibration_enabled);
        }
    }
}

/// What a [`MemorySink`] saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emission {
    Tone(Cue),
    Vibration(Cue),
}

/// Records emissions instead of playing them. Clones share the record.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    emissions: Rc<RefCell<Vec<Emission>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emissions(&self) -> Vec<Emission> {
        self.emissions.borrow().clone()
    }

    pub fn tones(&self) -> Vec<Cue> {
        self.emissions
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Emission::Tone(cue) => Some(*cue),
                Emission::Vibration(_) => None,
            })
            .collect()
    }

    pub fn vibrations(&self) -> Vec<Cue> {
        self.emissions
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Emission::Vibration(cue) => Some(*cue),
                Emission::Tone(_) => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.emissions.borrow_mut().clear();
    }
}

impl FeedbackSink for MemorySink {
    fn play(&mut self, cue: Cue, _tones: &[Tone]) -> Result<(), FeedbackError> {
        self.emissions.borrow_mut().push(Emission::Tone(cue));
        Ok(())
    }

    fn vibrate(&mut self, cue: Cue, _pattern: &[u32]) -> Result<(), FeedbackError> {
        self.emissions.borrow_mut().push(Emission::Vibration(cue));
        Ok(())
    }
}
