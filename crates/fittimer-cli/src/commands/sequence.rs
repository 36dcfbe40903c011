use clap::Subcommand;
use fittimer_core::timer::{SequenceConfig, SequencePatch};

use crate::workspace::{print_json, CliResult, Workspace};

#[derive(Subcommand)]
pub enum SequenceAction {
    /// Append a sequence to the working list
    Add {
        /// Sequence name
        name: String,
        /// Work seconds per cycle
        #[arg(long, default_value = "20")]
        work: u64,
        /// Rest seconds per cycle
        #[arg(long, default_value = "10")]
        rest: u64,
        /// Long rest seconds before the next sequence
        #[arg(long, default_value = "60")]
        long_rest: u64,
        /// Number of work/rest cycles
        #[arg(long, default_value = "8")]
        sets: u32,
    },
    /// Change fields of a sequence
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        work: Option<u64>,
        #[arg(long)]
        rest: Option<u64>,
        #[arg(long)]
        long_rest: Option<u64>,
        #[arg(long)]
        sets: Option<u32>,
    },
    /// Remove a sequence from the working list
    Delete { id: String },
    /// Remove every sequence
    Clear,
    /// List the working sequences as JSON
    List,
}

pub fn run(action: SequenceAction) -> CliResult {
    let mut ws = Workspace::open()?;

    match action {
        SequenceAction::Add {
            name,
            work,
            rest,
            long_rest,
            sets,
        } => {
            let id = ws.store.add_sequence(SequenceConfig {
                name,
                work_time: work,
                rest_time: rest,
                long_rest_time: long_rest,
                sets,
            })?;
            let created = ws.store.state().tabata_sequences.iter().find(|s| s.id == id);
            print_json(&created)?;
        }
        SequenceAction::Update {
            id,
            name,
            work,
            rest,
            long_rest,
            sets,
        } => {
            let patch = SequencePatch {
                name,
                work_time: work,
                rest_time: rest,
                long_rest_time: long_rest,
                sets,
            };
            if patch.is_empty() {
                return Err("nothing to update: pass at least one field".into());
            }
            ws.store.update_sequence(&id, patch)?;
            let updated = ws.store.state().tabata_sequences.iter().find(|s| s.id == id);
            print_json(&updated)?;
        }
        SequenceAction::Delete { id } => {
            if ws.store.delete_sequence(&id).is_empty() {
                return Err(format!("no sequence with id '{id}'").into());
            }
            println!("sequence deleted: {id}");
        }
        SequenceAction::Clear => {
            ws.store.clear_sequences();
            println!("sequences cleared");
        }
        SequenceAction::List => {
            print_json(&ws.store.state().tabata_sequences)?;
        }
    }
    Ok(())
}
