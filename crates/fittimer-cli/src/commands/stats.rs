use clap::Subcommand;
use fittimer_core::timer::format_clock;

use crate::workspace::{print_json, CliResult, Workspace};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Accumulated session statistics
    Show,
    /// Clear the statistics
    Reset,
}

pub fn run(action: StatsAction) -> CliResult {
    let mut ws = Workspace::open()?;

    if let StatsAction::Reset = action {
        ws.store.reset_stats();
    }
    let stats = ws.store.state().session_stats;
    print_json(&serde_json::json!({
        "total_time": stats.total_time,
        "total_time_display": format_clock(stats.total_time),
        "completed_sets": stats.completed_sets,
        "completed_sequences": stats.completed_sequences,
    }))
}
