//! Couples a [`SessionStore`] to a [`ClockSource`].
//!
//! After every dispatch the clock is re-synced with
//! [`TimerState::should_tick`](super::TimerState::should_tick), so it runs
//! exactly while the session is running and unpaused. Ticks that arrive
//! after the clock was stopped are dropped.

use std::time::Duration;

use tokio::sync::mpsc;

use super::clock::{ClockSource, Tick};
use super::engine::Action;
use super::session::SessionStore;
use crate::events::Event;

#[derive(Debug)]
pub struct TimerDriver {
    store: SessionStore,
    clock: ClockSource,
    ticks: mpsc::UnboundedReceiver<Tick>,
}

impl TimerDriver {
    /// Must be created inside a tokio runtime if the store is already running.
    pub fn new(store: SessionStore, period: Duration) -> Self {
        let (clock, ticks) = ClockSource::new(period);
        let mut driver = Self {
            store,
            clock,
            ticks,
        };
        driver.sync_clock();
        driver
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn into_store(self) -> SessionStore {
        self.store
    }

    pub fn is_ticking(&self) -> bool {
        self.clock.is_active()
    }

    pub fn dispatch(&mut self, action: Action) -> Vec<Event> {
        let events = self.store.dispatch(action);
        self.sync_clock();
        events
    }

    /// Run any store operation, then re-sync the clock.
    pub fn apply<R>(&mut self, f: impl FnOnce(&mut SessionStore) -> R) -> R {
        let result = f(&mut self.store);
        self.sync_clock();
        result
    }

    /// Wait for the next live tick and apply it.
    ///
    /// Returns `None` immediately when the clock is idle.
    pub async fn next_tick(&mut self) -> Option<Vec<Event>> {
        loop {
            if !self.clock.is_active() {
                return None;
            }
            let tick = self.ticks.recv().await?;
            if !self.clock.accepts(&tick) {
                tracing::trace!(generation = tick.generation, "dropping stale tick");
                continue;
            }
            return Some(self.dispatch(Action::Tick));
        }
    }

    /// Apply ticks until the session stops running. Returns how many ticks
    /// were applied.
    pub async fn run_until_idle(&mut self) -> u64 {
        let mut applied = 0;
        while self.next_tick().await.is_some() {
            applied += 1;
        }
        applied
    }

    fn sync_clock(&mut self) {
        let should_tick = self.store.state().should_tick();
        self.clock.sync(should_tick);
    }
}
