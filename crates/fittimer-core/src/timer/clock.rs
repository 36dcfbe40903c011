//! Periodic tick source.
//!
//! A [`ClockSource`] owns at most one background task that sends a
//! [`Tick`] every period. Each start bumps the generation, and ticks from an
//! older generation are rejected by [`ClockSource::accepts`], so a tick that
//! was already in flight when the clock stopped never reaches the engine.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// One clock pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub generation: u64,
}

pub struct ClockSource {
    period: Duration,
    sender: mpsc::UnboundedSender<Tick>,
    task: Option<JoinHandle<()>>,
    generation: u64,
}

impl std::fmt::Debug for ClockSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClockSource")
            .field("period", &self.period)
            .field("active", &self.is_active())
            .field("generation", &self.generation)
            .finish()
    }
}

impl ClockSource {
    /// Create an idle clock and the receiving end of its ticks.
    pub fn new(period: Duration) -> (Self, mpsc::UnboundedReceiver<Tick>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let clock = Self {
            period: period.max(Duration::from_millis(1)),
            sender,
            task: None,
            generation: 0,
        };
        (clock, receiver)
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_active(&self) -> bool {
        self.task.is_some()
    }

    /// Begin ticking. The first tick arrives one period from now.
    /// No-op if already active. Must be called inside a tokio runtime.
    pub fn start(&mut self) {
        if self.is_active() {
            return;
        }
        self.generation += 1;
        let generation = self.generation;
        let period = self.period;
        let sender = self.sender.clone();
        self.task = Some(tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if sender.send(Tick { generation }).is_err() {
                    break;
                }
            }
        }));
        tracing::debug!(generation, period_ms = period.as_millis() as u64, "clock started");
    }

    /// Stop ticking. Safe to call when already stopped.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            self.generation += 1;
            tracing::debug!(generation = self.generation, "clock stopped");
        }
    }

    /// Start or stop so the clock matches `should_tick`.
    pub fn sync(&mut self, should_tick: bool) {
        if should_tick {
            self.start();
        } else {
            self.stop();
        }
    }

    /// Whether `tick` belongs to the currently running clock.
    pub fn accepts(&self, tick: &Tick) -> bool {
        self.is_active() && tick.generation == self.generation
    }
}

impl Drop for ClockSource {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period() {
        let (mut clock, mut ticks) = ClockSource::new(Duration::from_secs(1));
        let started = Instant::now();
        clock.start();
        for _ in 0..3 {
            let tick = ticks.recv().await.unwrap();
            assert!(clock.accepts(&tick));
        }
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn start_twice_keeps_one_task() {
        let (mut clock, mut ticks) = ClockSource::new(Duration::from_secs(1));
        clock.start();
        clock.start();
        time::sleep(Duration::from_millis(1500)).await;
        clock.stop();
        let mut received = 0;
        while ticks.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_ticks_are_rejected() {
        let (mut clock, mut ticks) = ClockSource::new(Duration::from_secs(1));
        clock.start();
        time::sleep(Duration::from_millis(1100)).await;
        clock.stop();
        clock.start();
        let stale = ticks.recv().await.unwrap();
        assert!(!clock.accepts(&stale));
        let fresh = ticks.recv().await.unwrap();
        assert!(clock.accepts(&fresh));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent() {
        let (mut clock, _ticks) = ClockSource::new(Duration::from_secs(1));
        clock.stop();
        clock.start();
        clock.stop();
        clock.stop();
        assert!(!clock.is_active());
        assert!(!clock.accepts(&Tick { generation: 1 }));
    }
}
