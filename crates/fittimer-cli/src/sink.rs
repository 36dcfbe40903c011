use std::io::Write;

use fittimer_core::feedback::{Cue, FeedbackError, FeedbackSink, Tone};

/// Rings the terminal bell for tones. A terminal cannot vibrate, so
/// vibration patterns are only logged.
#[derive(Debug, Default)]
pub struct TerminalSink;

impl TerminalSink {
    pub fn new() -> Self {
        Self
    }
}

impl FeedbackSink for TerminalSink {
    fn play(&mut self, cue: Cue, tones: &[Tone]) -> Result<(), FeedbackError> {
        let mut stderr = std::io::stderr().lock();
        stderr
            .write_all(b"\x07")
            .and_then(|()| stderr.flush())
            .map_err(|e| FeedbackError::Device(e.to_string()))?;
        tracing::info!(cue = %cue.label(), tones = tones.len(), "cue");
        Ok(())
    }

    fn vibrate(&mut self, cue: Cue, pattern: &[u32]) -> Result<(), FeedbackError> {
        tracing::debug!(cue = %cue.label(), pattern = ?pattern, "vibration");
        Ok(())
    }
}
