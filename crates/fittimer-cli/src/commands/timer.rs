use clap::Subcommand;
use fittimer_core::storage::{Database, DatabasePersistence, StatePersistence};
use fittimer_core::{Action, TimerDriver, TimerMode};

use crate::workspace::{print_event_line, print_snapshot, CliResult, Workspace};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run the timer in the foreground until it completes (Ctrl-C pauses)
    Start,
    /// Advance the timer by whole seconds without waiting
    Tick {
        /// Number of seconds to advance
        #[arg(long, default_value = "1")]
        count: u64,
    },
    /// Skip to the next Tabata phase
    Next,
    /// Rewind the current run
    Reset {
        /// Forget the saved session entirely (saved sets are kept)
        #[arg(long)]
        hard: bool,
    },
    /// Finish the simple countdown now
    Complete,
    /// Switch timer mode (chronometer, tabata, simple-countdown)
    Mode {
        mode: TimerMode,
    },
    /// Set the simple countdown length in seconds
    Countdown {
        seconds: u64,
    },
    /// Print current timer state as JSON
    Status,
}

pub fn run(action: TimerAction) -> CliResult {
    if let TimerAction::Reset { hard: true } = action {
        DatabasePersistence::new(Database::open()?).clear()?;
    }
    let mut ws = Workspace::open()?;

    match action {
        TimerAction::Start => return run_live(ws),
        TimerAction::Tick { count } => {
            ws.store.start();
            for _ in 0..count {
                if !ws.store.state().should_tick() {
                    break;
                }
                ws.store.tick();
            }
            ws.store.pause();
        }
        TimerAction::Next => {
            ws.store.next_phase();
        }
        TimerAction::Reset { .. } => {
            ws.store.reset();
        }
        TimerAction::Complete => {
            ws.store.complete();
        }
        TimerAction::Mode { mode } => {
            ws.store.set_mode(mode);
        }
        TimerAction::Countdown { seconds } => {
            ws.store.set_countdown(seconds)?;
        }
        TimerAction::Status => {}
    }

    print_snapshot(&ws.store)
}

/// Drive the session from a real clock, printing each event as a JSON line.
fn run_live(ws: Workspace) -> CliResult {
    let period = ws.config.tick_interval();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let mut driver = TimerDriver::new(ws.store, period);
        for event in driver.dispatch(Action::Start) {
            print_event_line(&event)?;
        }

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        let interrupted = loop {
            tokio::select! {
                tick = driver.next_tick() => match tick {
                    Some(events) => {
                        for event in &events {
                            print_event_line(event)?;
                        }
                    }
                    None => break false,
                },
                _ = &mut ctrl_c => break true,
            }
        };

        if interrupted {
            tracing::info!("interrupted, pausing");
            for event in driver.dispatch(Action::Pause) {
                print_event_line(&event)?;
            }
        }
        print_event_line(&driver.store().snapshot())
    })
}
