use clap::Subcommand;
use fittimer_core::timer::SetPatch;
use fittimer_core::SetCatalog;
use serde::Serialize;

use crate::workspace::{print_json, print_snapshot, CliResult, Workspace};

#[derive(Subcommand)]
pub enum SetAction {
    /// List saved sets
    List,
    /// Show one set with its sequences
    Show { id: String },
    /// Save the working list as a new set
    Save {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Replace the working list with a copy of a set
    Load { id: String },
    /// Rename or re-describe a set
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        /// Empty string clears the description
        #[arg(long)]
        description: Option<String>,
        /// Replace the set's sequences with the working list
        #[arg(long)]
        from_working: bool,
    },
    /// Delete a set
    Delete { id: String },
}

#[derive(Serialize)]
struct SetSummary<'a> {
    id: &'a str,
    name: &'a str,
    description: Option<&'a str>,
    sequences: usize,
    total_duration_secs: u64,
}

pub fn run(action: SetAction, user: Option<&str>) -> CliResult {
    let mut ws = Workspace::open_as(user)?;

    match action {
        SetAction::List => {
            let sets = ws.catalog.list(&ws.caller)?;
            let summaries: Vec<SetSummary<'_>> = sets
                .iter()
                .map(|s| SetSummary {
                    id: &s.id,
                    name: &s.name,
                    description: s.description.as_deref(),
                    sequences: s.sequences.len(),
                    total_duration_secs: s.total_duration_secs(),
                })
                .collect();
            print_json(&summaries)?;
        }
        SetAction::Show { id } => {
            print_json(&ws.catalog.get(&ws.caller, &id)?)?;
        }
        SetAction::Save { name, description } => {
            let id = ws.catalog.save(
                &ws.caller,
                &name,
                description.as_deref(),
                &ws.store.state().tabata_sequences,
            )?;
            print_json(&serde_json::json!({ "id": id }))?;
        }
        SetAction::Load { id } => {
            ws.catalog.get(&ws.caller, &id)?;
            ws.store.load_set(&id)?;
            print_snapshot(&ws.store)?;
        }
        SetAction::Update {
            id,
            name,
            description,
            from_working,
        } => {
            let patch = SetPatch {
                name,
                description,
                sequences: from_working.then(|| ws.store.state().tabata_sequences.clone()),
            };
            let updated = ws.catalog.update(&ws.caller, &id, &patch)?;
            print_json(&updated)?;
        }
        SetAction::Delete { id } => {
            ws.catalog.delete(&ws.caller, &id)?;
            println!("set deleted: {id}");
        }
    }
    Ok(())
}
