//! Everything a command needs: configuration, the restored session with
//! its observers attached, and the set catalog.

use fittimer_core::storage::{Database, DatabasePersistence, PersistenceObserver, StatePersistence};
use fittimer_core::{Caller, Config, Event, FeedbackDispatcher, SessionStore, SetCatalog, SqliteCatalog};

use crate::sink::TerminalSink;

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

pub struct Workspace {
    pub config: Config,
    pub store: SessionStore,
    pub catalog: SqliteCatalog,
    pub caller: Caller,
}

impl Workspace {
    /// Open the session for the configured user.
    pub fn open() -> CliResult<Self> {
        Self::open_as(None)
    }

    /// Open the session, acting as `user` in the catalog if given.
    pub fn open_as(user: Option<&str>) -> CliResult<Self> {
        let config = Config::load()?;
        let persistence = DatabasePersistence::new(Database::open()?);
        let restored = persistence.load();
        let store = SessionStore::restore(config.initial_state(), restored)
            .with_observer(Box::new(PersistenceObserver::new(Box::new(persistence))))
            .with_observer(Box::new(FeedbackDispatcher::new(
                TerminalSink::new(),
                config.feedback,
            )));

        let catalog = SqliteCatalog::new(Database::open()?);
        let caller = Caller::from_name(user.unwrap_or(&config.catalog.user));
        let mut workspace = Self {
            config,
            store,
            catalog,
            caller,
        };
        let sets = workspace.catalog.list(&workspace.caller)?;
        workspace.store.replace_sets(sets);
        Ok(workspace)
    }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print the current state, the usual output of a timer command.
pub fn print_snapshot(store: &SessionStore) -> CliResult {
    print_json(&store.snapshot())
}

pub fn print_event_line(event: &Event) -> CliResult {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}
