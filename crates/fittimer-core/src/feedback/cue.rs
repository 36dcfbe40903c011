//! Cue definitions: what each kind of feedback sounds and feels like.

use serde::{Deserialize, Serialize};

use crate::timer::TimerPhase;

/// One oscillator beep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tone {
    pub frequency_hz: u32,
    pub duration_ms: u32,
    /// Delay from the start of the cue.
    pub offset_ms: u32,
}

const fn tone(frequency_hz: u32, duration_ms: u32, offset_ms: u32) -> Tone {
    Tone {
        frequency_hz,
        duration_ms,
        offset_ms,
    }
}

const WORK_TONES: &[Tone] = &[tone(800, 200, 0), tone(800, 200, 250)];
const REST_TONES: &[Tone] = &[tone(400, 300, 0)];
const LONG_REST_TONES: &[Tone] = &[tone(600, 150, 0), tone(500, 150, 200), tone(400, 300, 400)];
const START_TONES: &[Tone] = &[tone(500, 100, 0)];
const PAUSE_TONES: &[Tone] = &[tone(300, 200, 0)];
const NEXT_TONES: &[Tone] = &[tone(650, 100, 0)];
const COMPLETION_TONES: &[Tone] = &[tone(523, 200, 0), tone(659, 200, 250), tone(784, 400, 500)];
const COUNTDOWN_TONES: &[Tone] = &[tone(700, 100, 0)];
const COUNTDOWN_FINAL_TONES: &[Tone] = &[tone(1000, 150, 0)];

/// Vibration patterns alternate on/off durations in milliseconds.
const WORK_PATTERN: &[u32] = &[200, 100, 200];
const REST_PATTERN: &[u32] = &[100];
const LONG_REST_PATTERN: &[u32] = &[300, 200, 300, 200, 300];
const START_PATTERN: &[u32] = &[50];
const PAUSE_PATTERN: &[u32] = &[100];
const NEXT_PATTERN: &[u32] = &[75, 50, 75];
const COMPLETION_PATTERN: &[u32] = &[500, 200, 500, 200, 500];
const COUNTDOWN_PATTERN: &[u32] = &[40];

/// A single piece of feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "cue", rename_all = "snake_case")]
pub enum Cue {
    /// Entered a Tabata phase.
    Phase { phase: TimerPhase },
    Start,
    Pause,
    Next,
    Completion,
    /// `remaining` seconds left in the active phase (3, 2 or 1).
    Countdown { remaining: u64 },
}

impl Cue {
    pub fn tones(&self) -> &'static [Tone] {
        match self {
            Cue::Phase { phase } => match phase {
                TimerPhase::Work => WORK_TONES,
                TimerPhase::Rest => REST_TONES,
                TimerPhase::LongRest => LONG_REST_TONES,
                TimerPhase::Chronometer | TimerPhase::SimpleCountdown => &[],
            },
            Cue::Start => START_TONES,
            Cue::Pause => PAUSE_TONES,
            Cue::Next => NEXT_TONES,
            Cue::Completion => COMPLETION_TONES,
            Cue::Countdown { remaining: 1 } => COUNTDOWN_FINAL_TONES,
            Cue::Countdown { .. } => COUNTDOWN_TONES,
        }
    }

    pub fn vibration(&self) -> &'static [u32] {
        match self {
            Cue::Phase { phase } => match phase {
                TimerPhase::Work => WORK_PATTERN,
                TimerPhase::Rest => REST_PATTERN,
                TimerPhase::LongRest => LONG_REST_PATTERN,
                TimerPhase::Chronometer | TimerPhase::SimpleCountdown => &[],
            },
            Cue::Start => START_PATTERN,
            Cue::Pause => PAUSE_PATTERN,
            Cue::Next => NEXT_PATTERN,
            Cue::Completion => COMPLETION_PATTERN,
            Cue::Countdown { .. } => COUNTDOWN_PATTERN,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Cue::Phase { phase } => format!("phase:{phase}"),
            Cue::Start => "start".into(),
            Cue::Pause => "pause".into(),
            Cue::Next => "next".into(),
            Cue::Completion => "completion".into(),
            Cue::Countdown { remaining } => format!("countdown:{remaining}"),
        }
    }
}

impl std::str::FromStr for Cue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "work" => Cue::Phase {
                phase: TimerPhase::Work,
            },
            "rest" => Cue::Phase {
                phase: TimerPhase::Rest,
            },
            "longrest" => Cue::Phase {
                phase: TimerPhase::LongRest,
            },
            "start" => Cue::Start,
            "pause" => Cue::Pause,
            "next" => Cue::Next,
            "completion" => Cue::Completion,
            "3" | "2" | "1" => Cue::Countdown {
                remaining: s.parse().map_err(|_| s.to_string())?,
            },
            other => return Err(format!("unknown cue '{other}'")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_is_distinct_from_phase_cues() {
        let completion = Cue::Completion;
        for phase in [TimerPhase::Work, TimerPhase::Rest, TimerPhase::LongRest] {
            let cue = Cue::Phase { phase };
            assert_ne!(cue.tones(), completion.tones());
            assert_ne!(cue.vibration(), completion.vibration());
        }
    }

    #[test]
    fn last_second_has_its_own_tone() {
        assert_ne!(
            Cue::Countdown { remaining: 1 }.tones(),
            Cue::Countdown { remaining: 2 }.tones()
        );
        assert_eq!(
            Cue::Countdown { remaining: 3 }.tones(),
            Cue::Countdown { remaining: 2 }.tones()
        );
    }

    #[test]
    fn parse_cue_names() {
        assert_eq!("completion".parse::<Cue>().unwrap(), Cue::Completion);
        assert_eq!(
            "2".parse::<Cue>().unwrap(),
            Cue::Countdown { remaining: 2 }
        );
        assert!("loud".parse::<Cue>().is_err());
    }
}
