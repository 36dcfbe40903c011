mod clock;
mod driver;
mod engine;
mod session;
mod state;

pub use clock::{ClockSource, Tick};
pub use driver::TimerDriver;
pub use engine::{reduce, Action};
pub use session::{SessionObserver, SessionStore, Transition};
pub use state::{
    format_clock, SequenceConfig, SequencePatch, SessionStats, SetPatch, TabataSequence,
    TabataSet, TimerMode, TimerPhase, TimerState, DEFAULT_COUNTDOWN_SECS,
};
