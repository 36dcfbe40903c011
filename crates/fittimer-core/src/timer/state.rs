use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Which set of phase-transition rules applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TimerMode {
    #[default]
    Chronometer,
    Tabata,
    SimpleCountdown,
}

impl TimerMode {
    /// Phase a fresh run starts in.
    pub fn initial_phase(self) -> TimerPhase {
        match self {
            TimerMode::Chronometer => TimerPhase::Chronometer,
            TimerMode::Tabata => TimerPhase::Work,
            TimerMode::SimpleCountdown => TimerPhase::SimpleCountdown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimerMode::Chronometer => "chronometer",
            TimerMode::Tabata => "tabata",
            TimerMode::SimpleCountdown => "simple-countdown",
        }
    }
}

impl std::fmt::Display for TimerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TimerMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chronometer" => Ok(TimerMode::Chronometer),
            "tabata" => Ok(TimerMode::Tabata),
            "simple-countdown" | "countdown" => Ok(TimerMode::SimpleCountdown),
            other => Err(ValidationError::InvalidValue {
                field: "mode".into(),
                message: format!("unknown timer mode '{other}'"),
            }),
        }
    }
}

/// What the elapsed-time counter is currently measuring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimerPhase {
    Work,
    Rest,
    #[serde(rename = "longrest")]
    LongRest,
    Chronometer,
    SimpleCountdown,
}

impl TimerPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            TimerPhase::Work => "work",
            TimerPhase::Rest => "rest",
            TimerPhase::LongRest => "longrest",
            TimerPhase::Chronometer => "chronometer",
            TimerPhase::SimpleCountdown => "simple-countdown",
        }
    }
}

impl std::fmt::Display for TimerPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Durations of a sequence, without its id. Input to `ADD_SEQUENCE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceConfig {
    pub name: String,
    /// Seconds of work per cycle.
    pub work_time: u64,
    /// Seconds of rest per cycle.
    pub rest_time: u64,
    /// Seconds of rest between this sequence and the next.
    pub long_rest_time: u64,
    /// Number of work/rest cycles.
    pub sets: u32,
}

impl SequenceConfig {
    /// Check every duration is positive and the name is present.
    ///
    /// # Errors
    /// Returns the first field that violates its bound.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(invalid("name", "name is required"));
        }
        if self.work_time == 0 {
            return Err(invalid("work_time", "work time must be greater than 0"));
        }
        if self.rest_time == 0 {
            return Err(invalid("rest_time", "rest time must be greater than 0"));
        }
        if self.long_rest_time == 0 {
            return Err(invalid(
                "long_rest_time",
                "long rest time must be greater than 0",
            ));
        }
        if self.sets == 0 {
            return Err(invalid("sets", "there must be at least 1 set"));
        }
        Ok(())
    }

    pub fn into_sequence(self, id: impl Into<String>) -> TabataSequence {
        TabataSequence {
            id: id.into(),
            name: self.name,
            work_time: self.work_time,
            rest_time: self.rest_time,
            long_rest_time: self.long_rest_time,
            sets: self.sets,
        }
    }
}

/// One interval-training block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabataSequence {
    pub id: String,
    pub name: String,
    pub work_time: u64,
    pub rest_time: u64,
    pub long_rest_time: u64,
    pub sets: u32,
}

impl TabataSequence {
    pub fn config(&self) -> SequenceConfig {
        SequenceConfig {
            name: self.name.clone(),
            work_time: self.work_time,
            rest_time: self.rest_time,
            long_rest_time: self.long_rest_time,
            sets: self.sets,
        }
    }

    /// # Errors
    /// See [`SequenceConfig::validate`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(invalid("id", "sequence id is required"));
        }
        self.config().validate()
    }

    /// Length in seconds of `phase` for this sequence, if it is a Tabata phase.
    pub fn phase_duration(&self, phase: TimerPhase) -> Option<u64> {
        match phase {
            TimerPhase::Work => Some(self.work_time),
            TimerPhase::Rest => Some(self.rest_time),
            TimerPhase::LongRest => Some(self.long_rest_time),
            TimerPhase::Chronometer | TimerPhase::SimpleCountdown => None,
        }
    }

    /// Work plus rest over every cycle, long rest excluded.
    pub fn active_duration_secs(&self) -> u64 {
        self.work_time
            .saturating_add(self.rest_time)
            .saturating_mul(u64::from(self.sets))
    }

    /// Apply the fields present in `patch`.
    pub fn apply(&mut self, patch: &SequencePatch) {
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
        }
        if let Some(v) = patch.work_time {
            self.work_time = v;
        }
        if let Some(v) = patch.rest_time {
            self.rest_time = v;
        }
        if let Some(v) = patch.long_rest_time {
            self.long_rest_time = v;
        }
        if let Some(v) = patch.sets {
            self.sets = v;
        }
    }
}

/// Partial update for a sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub work_time: Option<u64>,
    #[serde(default)]
    pub rest_time: Option<u64>,
    #[serde(default)]
    pub long_rest_time: Option<u64>,
    #[serde(default)]
    pub sets: Option<u32>,
}

impl SequencePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.work_time.is_none()
            && self.rest_time.is_none()
            && self.long_rest_time.is_none()
            && self.sets.is_none()
    }
}

/// A saved, named list of sequences.
///
/// Sequences are snapshots: the working list and a set never share storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabataSet {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub sequences: Vec<TabataSequence>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TabataSet {
    pub fn total_duration_secs(&self) -> u64 {
        self.sequences
            .iter()
            .map(TabataSequence::active_duration_secs)
            .sum()
    }

    pub fn apply(&mut self, patch: &SetPatch, now: DateTime<Utc>) {
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
        }
        if let Some(description) = &patch.description {
            self.description = Some(description.clone()).filter(|d| !d.is_empty());
        }
        if let Some(sequences) = &patch.sequences {
            self.sequences = sequences.clone();
        }
        self.updated_at = now;
    }
}

/// Partial update for a catalog set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetPatch {
    #[serde(default)]
    pub name: Option<String>,
    /// An empty string clears the description.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sequences: Option<Vec<TabataSequence>>,
}

impl SetPatch {
    /// # Errors
    /// Rejects an empty name or any invalid sequence.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(invalid("name", "set name is required"));
            }
        }
        if let Some(sequences) = &self.sequences {
            sequences.iter().try_for_each(TabataSequence::validate)?;
        }
        Ok(())
    }
}

/// Counters accumulated across runs. Only `RESET_STATS` clears them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Seconds the timer actually advanced.
    pub total_time: u64,
    /// Sequences that finished all of their cycles.
    pub completed_sets: u64,
    /// Whole sequence lists run to the end.
    pub completed_sequences: u64,
}

/// Default simple-countdown length in seconds.
pub const DEFAULT_COUNTDOWN_SECS: u64 = 60;

/// The aggregate owned by the session store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub is_running: bool,
    pub is_paused: bool,
    pub current_mode: TimerMode,
    /// Elapsed seconds in the current phase (absolute for the chronometer).
    pub current_time: u64,
    pub current_phase: TimerPhase,
    pub current_sequence_index: usize,
    /// Long rests entered in this run.
    pub current_set: u32,
    /// Completed work/rest cycles in the active sequence.
    pub current_set_cycle: u32,
    pub sequence_total: usize,
    pub tabata_sequences: Vec<TabataSequence>,
    pub tabata_sets: Vec<TabataSet>,
    pub audio_enabled: bool,
    pub vibration_enabled: bool,
    pub session_stats: SessionStats,
    /// Configured simple-countdown length in seconds.
    pub countdown_duration: u64,
    /// Set when a countdown runs out or a sequence list finishes.
    pub is_completed: bool,
}

impl Default for TimerState {
    fn default() -> Self {
        Self {
            is_running: false,
            is_paused: false,
            current_mode: TimerMode::Chronometer,
            current_time: 0,
            current_phase: TimerPhase::Chronometer,
            current_sequence_index: 0,
            current_set: 0,
            current_set_cycle: 0,
            sequence_total: 0,
            tabata_sequences: Vec::new(),
            tabata_sets: Vec::new(),
            audio_enabled: true,
            vibration_enabled: true,
            session_stats: SessionStats::default(),
            countdown_duration: DEFAULT_COUNTDOWN_SECS,
            is_completed: false,
        }
    }
}

impl TimerState {
    /// True while the clock should be delivering ticks.
    pub fn should_tick(&self) -> bool {
        self.is_running && !self.is_paused
    }

    pub fn current_sequence(&self) -> Option<&TabataSequence> {
        self.tabata_sequences.get(self.current_sequence_index)
    }

    /// Seconds left in the active phase, `None` for the chronometer.
    pub fn remaining_secs(&self) -> Option<u64> {
        match self.current_mode {
            TimerMode::Chronometer => None,
            TimerMode::SimpleCountdown => {
                Some(self.countdown_duration.saturating_sub(self.current_time))
            }
            TimerMode::Tabata => {
                let total = self.current_sequence()?.phase_duration(self.current_phase)?;
                Some(total.saturating_sub(self.current_time))
            }
        }
    }

    /// 0.0 .. 1.0 progress within the active phase.
    pub fn phase_progress(&self) -> f64 {
        let total = match self.current_mode {
            TimerMode::Chronometer => return 1.0,
            TimerMode::SimpleCountdown => self.countdown_duration,
            TimerMode::Tabata => match self
                .current_sequence()
                .and_then(|s| s.phase_duration(self.current_phase))
            {
                Some(total) => total,
                None => return 0.0,
            },
        };
        if total == 0 {
            return 0.0;
        }
        (self.current_time as f64 / total as f64).min(1.0)
    }

    pub(crate) fn sync_sequence_total(&mut self) {
        self.sequence_total = if self.current_mode == TimerMode::Tabata {
            self.tabata_sequences.len()
        } else {
            0
        };
    }
}

fn invalid(field: &str, message: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        message: message.into(),
    }
}

/// Format seconds as `MM:SS`.
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SequenceConfig {
        SequenceConfig {
            name: "Burpees".into(),
            work_time: 20,
            rest_time: 10,
            long_rest_time: 60,
            sets: 8,
        }
    }

    #[test]
    fn validate_rejects_zero_durations() {
        assert!(config().validate().is_ok());
        let mut c = config();
        c.work_time = 0;
        assert!(c.validate().is_err());
        let mut c = config();
        c.sets = 0;
        assert!(c.validate().is_err());
        let mut c = config();
        c.name = "  ".into();
        assert!(c.validate().is_err());
    }

    #[test]
    fn initial_phase_per_mode() {
        assert_eq!(TimerMode::Chronometer.initial_phase(), TimerPhase::Chronometer);
        assert_eq!(TimerMode::Tabata.initial_phase(), TimerPhase::Work);
        assert_eq!(
            TimerMode::SimpleCountdown.initial_phase(),
            TimerPhase::SimpleCountdown
        );
    }

    #[test]
    fn phases_serialize_like_the_web_client() {
        assert_eq!(
            serde_json::to_string(&TimerPhase::LongRest).unwrap(),
            "\"longrest\""
        );
        assert_eq!(
            serde_json::to_string(&TimerMode::SimpleCountdown).unwrap(),
            "\"simple-countdown\""
        );
    }

    #[test]
    fn remaining_secs_tracks_active_phase() {
        let mut state = TimerState {
            current_mode: TimerMode::Tabata,
            current_phase: TimerPhase::Rest,
            current_time: 4,
            tabata_sequences: vec![config().into_sequence("a")],
            ..TimerState::default()
        };
        assert_eq!(state.remaining_secs(), Some(6));
        state.current_mode = TimerMode::Chronometer;
        assert_eq!(state.remaining_secs(), None);
    }

    #[test]
    fn format_clock_pads() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(75), "01:15");
    }

    #[test]
    fn set_duration_sums_cycles() {
        let now = Utc::now();
        let set = TabataSet {
            id: "s".into(),
            name: "Legs".into(),
            description: None,
            sequences: vec![config().into_sequence("a"), config().into_sequence("b")],
            created_at: now,
            updated_at: now,
        };
        assert_eq!(set.total_duration_secs(), 2 * 8 * 30);
    }
}
