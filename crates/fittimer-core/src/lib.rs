//! # FitTimer Core Library
//!
//! Core logic for the FitTimer interval-training timer: a chronometer, a
//! Tabata runner over an ordered list of sequences, and a simple countdown.
//! The `fittimer` CLI is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Phase engine**: a pure reducer, `reduce(&TimerState, &Action)`, with
//!   no clock or I/O of its own
//! - **Session store**: owns the state, applies actions in order and
//!   notifies observers
//! - **Clock**: a tokio ticker whose stale ticks are discarded
//! - **Feedback**: maps transitions to audio/vibration cues
//! - **Storage**: SQLite snapshot of the session and TOML configuration
//! - **Catalog**: saved Tabata sets, scoped per caller
//!
//! ## Key Components
//!
//! - [`SessionStore`]: single owner of [`TimerState`]
//! - [`TimerDriver`]: store plus clock, for live runs
//! - [`FeedbackDispatcher`]: cue decisions and emission
//! - [`SqliteCatalog`]: durable set storage
//! - [`Config`]: application configuration management

pub mod catalog;
pub mod error;
pub mod events;
pub mod feedback;
pub mod storage;
pub mod timer;

pub use catalog::{AuthGate, Caller, LocalGate, RequireUser, SetCatalog, SqliteCatalog};
pub use error::{CatalogError, ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use feedback::{Cue, FeedbackDispatcher, FeedbackError, FeedbackPolicy, FeedbackSink, MemorySink};
pub use storage::{
    Config, Database, DatabasePersistence, MemoryPersistence, PersistedState, PersistenceObserver,
    StatePersistence,
};
pub use timer::{
    reduce, Action, SequenceConfig, SessionObserver, SessionStore, TabataSequence, TabataSet,
    TimerDriver, TimerMode, TimerPhase, TimerState, Transition,
};
