mod config;
pub mod database;
pub mod persistence;

pub use config::{CatalogConfig, Config, NotificationsConfig, TimerConfig};
pub use database::Database;
pub use persistence::{
    DatabasePersistence, MemoryPersistence, PersistedState, PersistenceObserver,
    StatePersistence, STATE_KEY,
};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory, creating it if needed.
///
/// `FITTIMER_DATA_DIR` wins when set. Otherwise `~/.config/fittimer`, or
/// `~/.config/fittimer-dev` when `FITTIMER_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("FITTIMER_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("FITTIMER_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("fittimer-dev")
            } else {
                base_dir.join("fittimer")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|source| ConfigError::DataDir {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}
