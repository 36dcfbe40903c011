use clap::Subcommand;
use fittimer_core::{Cue, FeedbackDispatcher};

use crate::sink::TerminalSink;
use crate::workspace::{print_json, CliResult, Workspace};

#[derive(Subcommand)]
pub enum FeedbackAction {
    /// Toggle audio cues
    Audio,
    /// Toggle vibration cues
    Vibration,
    /// Play one cue (work, rest, longrest, start, pause, next, completion, 3, 2, 1)
    Test { cue: Cue },
}

pub fn run(action: FeedbackAction) -> CliResult {
    let mut ws = Workspace::open()?;

    match action {
        FeedbackAction::Audio => {
            ws.store.toggle_audio();
        }
        FeedbackAction::Vibration => {
            ws.store.toggle_vibration();
        }
        FeedbackAction::Test { cue } => {
            let state = ws.store.state();
            let mut dispatcher = FeedbackDispatcher::new(TerminalSink::new(), ws.config.feedback);
            dispatcher.emit(cue, state.audio_enabled, state.vibration_enabled);
            return print_json(&serde_json::json!({
                "cue": cue.label(),
                "tones": cue.tones(),
                "vibration": cue.vibration(),
                "audio_enabled": state.audio_enabled,
                "vibration_enabled": state.vibration_enabled,
            }));
        }
    }

    let state = ws.store.state();
    print_json(&serde_json::json!({
        "audio_enabled": state.audio_enabled,
        "vibration_enabled": state.vibration_enabled,
    }))
}
