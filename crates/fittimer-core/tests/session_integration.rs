//! Integration tests for a full session: store, persistence, feedback and
//! the set catalog working together.

use fittimer_core::feedback::Emission;
use fittimer_core::timer::{SequenceConfig, SequencePatch};
use fittimer_core::{
    Caller, Cue, Database, DatabasePersistence, FeedbackDispatcher, FeedbackPolicy, MemorySink,
    PersistenceObserver, SessionStore, SetCatalog, SqliteCatalog, StatePersistence, TimerMode,
    TimerPhase, TimerState,
};

fn block(name: &str, work: u64, rest: u64, sets: u32) -> SequenceConfig {
    SequenceConfig {
        name: name.into(),
        work_time: work,
        rest_time: rest,
        long_rest_time: 30,
        sets,
    }
}

fn ticks(store: &mut SessionStore, n: usize) {
    for _ in 0..n {
        store.tick();
    }
}

#[test]
fn test_tabata_cycle_boundaries() {
    let mut store = SessionStore::default();
    store.add_sequence(block("Burpees", 20, 10, 2)).unwrap();
    store.set_mode(TimerMode::Tabata);
    store.start();

    ticks(&mut store, 20);
    let state = store.state();
    assert_eq!(state.current_phase, TimerPhase::Rest);
    assert_eq!(state.current_time, 0);

    ticks(&mut store, 10);
    let state = store.state();
    assert_eq!(state.current_set_cycle, 1);
    assert_eq!(state.current_phase, TimerPhase::Work);
    assert_eq!(state.current_time, 0);
}

#[test]
fn test_completion_stops_until_reset() {
    let mut store = SessionStore::default();
    store.add_sequence(block("Only", 2, 1, 1)).unwrap();
    store.set_mode(TimerMode::Tabata);
    store.start();
    ticks(&mut store, 3);

    let done = store.state().clone();
    assert!(!done.is_running);
    assert!(done.is_completed);
    assert_eq!(done.session_stats.completed_sequences, 1);

    ticks(&mut store, 5);
    assert_eq!(store.state(), &done);
    store.start();
    assert_eq!(store.state(), &done);

    store.reset();
    store.start();
    assert!(store.state().is_running);
    assert_eq!(store.state().session_stats.completed_sequences, 1);
}

#[test]
fn test_skips_follow_tick_order() {
    let phases_by = |skip: bool| {
        let mut store = SessionStore::default();
        store.add_sequence(block("A", 3, 2, 3)).unwrap();
        store.add_sequence(block("B", 3, 2, 1)).unwrap();
        store.set_mode(TimerMode::Tabata);
        store.start();
        let mut seen = vec![store.state().current_phase];
        while seen.len() < 8 {
            let before = store.state().current_phase;
            if skip {
                store.next_phase();
            } else {
                store.tick();
            }
            let after = store.state().current_phase;
            if after != before {
                seen.push(after);
            }
        }
        seen
    };

    let expected = vec![
        TimerPhase::Work,
        TimerPhase::Rest,
        TimerPhase::Work,
        TimerPhase::Rest,
        TimerPhase::Work,
        TimerPhase::Rest,
        TimerPhase::LongRest,
        TimerPhase::Work,
    ];
    assert_eq!(phases_by(true), expected);
    assert_eq!(phases_by(false), expected);
}

#[test]
fn test_deleting_current_sequence_clamps_index() {
    let mut store = SessionStore::default();
    store.add_sequence(block("A", 1, 1, 1)).unwrap();
    let b = store.add_sequence(block("B", 1, 1, 1)).unwrap();
    store.set_mode(TimerMode::Tabata);
    store.start();
    ticks(&mut store, 32);
    assert_eq!(store.state().current_sequence_index, 1);

    store.delete_sequence(&b);
    assert_eq!(store.state().current_sequence_index, 0);
    store.clear_sequences();
    assert_eq!(store.state().current_sequence_index, 0);
    store.tick();
}

#[test]
fn test_catalog_copy_isolation() {
    let catalog = SqliteCatalog::new(Database::open_memory().unwrap());
    let caller = Caller::Local;

    let mut store = SessionStore::default();
    let first = store.add_sequence(block("A", 20, 10, 4)).unwrap();
    store.add_sequence(block("B", 30, 15, 2)).unwrap();
    let saved = store.state().tabata_sequences.clone();
    let id = catalog
        .save(&caller, "Full body", None, &store.state().tabata_sequences)
        .unwrap();

    store.replace_sets(catalog.list(&caller).unwrap());
    store.load_set(&id).unwrap();
    store
        .update_sequence(
            &first,
            SequencePatch {
                work_time: Some(45),
                ..SequencePatch::default()
            },
        )
        .unwrap();
    assert_eq!(catalog.load(&caller, &id).unwrap(), saved);

    store.load_set(&id).unwrap();
    let again = catalog
        .save(&caller, "Full body copy", None, &store.state().tabata_sequences)
        .unwrap();
    assert_eq!(catalog.load(&caller, &again).unwrap(), saved);
}

#[test]
fn test_state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fittimer.db");

    let expected = {
        let backend = DatabasePersistence::new(Database::open_at(&path).unwrap());
        let mut store = SessionStore::default()
            .with_observer(Box::new(PersistenceObserver::new(Box::new(backend))));
        store.add_sequence(block("Legs", 20, 10, 2)).unwrap();
        store.set_mode(TimerMode::Tabata);
        store.toggle_vibration();
        store.start();
        ticks(&mut store, 25);
        store.pause();
        store.state().clone()
    };

    let backend = DatabasePersistence::new(Database::open_at(&path).unwrap());
    let restored = SessionStore::restore(TimerState::default(), backend.load());
    let state = restored.state();
    assert_eq!(state.current_phase, TimerPhase::Rest);
    assert_eq!(state.current_time, 5);
    assert_eq!(state.tabata_sequences, expected.tabata_sequences);
    assert_eq!(state.session_stats, expected.session_stats);
    assert!(!state.vibration_enabled);
    assert!(!state.is_running);
}

#[test]
fn test_feedback_and_persistence_observe_the_same_run() {
    let sink = MemorySink::new();
    let mut store = SessionStore::default()
        .with_observer(Box::new(FeedbackDispatcher::new(
            sink.clone(),
            FeedbackPolicy::default(),
        )))
        .with_observer(Box::new(PersistenceObserver::new(Box::new(
            DatabasePersistence::new(Database::open_memory().unwrap()),
        ))));
    store.set_mode(TimerMode::SimpleCountdown);
    store.set_countdown(4).unwrap();
    store.start();
    ticks(&mut store, 10);

    assert!(store.state().is_completed);
    assert_eq!(
        sink.tones(),
        vec![
            Cue::Start,
            Cue::Countdown { remaining: 3 },
            Cue::Countdown { remaining: 2 },
            Cue::Countdown { remaining: 1 },
            Cue::Completion,
        ]
    );
    assert_eq!(
        sink.emissions().last(),
        Some(&Emission::Vibration(Cue::Completion))
    );
}
