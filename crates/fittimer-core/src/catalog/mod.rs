//! Saved Tabata sets, scoped per caller.
//!
//! The catalog is the durable home of [`TabataSet`]s. Loading hands back a
//! copy of a set's sequences for the working list; saving stores a copy of
//! the working list. Nothing is shared between the two.

mod sqlite;

pub use sqlite::SqliteCatalog;

use crate::error::CatalogError;
use crate::timer::{SetPatch, TabataSequence, TabataSet};

/// Owner id used in single-user local mode.
pub const LOCAL_OWNER: &str = "local";

/// Who is asking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    /// The single local user.
    Local,
    /// An identified user.
    User(String),
    /// Nobody signed in.
    Anonymous,
}

impl Caller {
    /// Map a configured user name onto a caller: `"local"` is the local
    /// user, an empty name is anonymous.
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "" => Caller::Anonymous,
            LOCAL_OWNER => Caller::Local,
            other => Caller::User(other.to_string()),
        }
    }
}

/// Decides which owner id a caller acts as.
pub trait AuthGate {
    /// # Errors
    /// Returns `Unauthorized` if the caller may not use the catalog.
    fn authorize(&self, caller: &Caller) -> Result<String, CatalogError>;
}

/// Admits everyone. Anonymous callers act as the local user.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalGate;

impl AuthGate for LocalGate {
    fn authorize(&self, caller: &Caller) -> Result<String, CatalogError> {
        Ok(match caller {
            Caller::User(id) => id.clone(),
            Caller::Local | Caller::Anonymous => LOCAL_OWNER.to_string(),
        })
    }
}

/// Rejects anonymous callers.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequireUser;

impl AuthGate for RequireUser {
    fn authorize(&self, caller: &Caller) -> Result<String, CatalogError> {
        match caller {
            Caller::User(id) => Ok(id.clone()),
            Caller::Local => Ok(LOCAL_OWNER.to_string()),
            Caller::Anonymous => Err(CatalogError::Unauthorized),
        }
    }
}

/// Durable storage of named sets.
pub trait SetCatalog {
    /// The caller's sets, oldest first.
    fn list(&self, caller: &Caller) -> Result<Vec<TabataSet>, CatalogError>;

    fn get(&self, caller: &Caller, id: &str) -> Result<TabataSet, CatalogError>;

    fn create(
        &self,
        caller: &Caller,
        name: &str,
        description: Option<&str>,
        sequences: &[TabataSequence],
    ) -> Result<TabataSet, CatalogError>;

    fn update(&self, caller: &Caller, id: &str, patch: &SetPatch)
        -> Result<TabataSet, CatalogError>;

    fn delete(&self, caller: &Caller, id: &str) -> Result<(), CatalogError>;

    /// A copy of the set's sequences, ready to become the working list.
    fn load(&self, caller: &Caller, id: &str) -> Result<Vec<TabataSequence>, CatalogError> {
        Ok(self.get(caller, id)?.sequences)
    }

    /// Store a copy of `sequences` as a new set and return its id.
    fn save(
        &self,
        caller: &Caller,
        name: &str,
        description: Option<&str>,
        sequences: &[TabataSequence],
    ) -> Result<String, CatalogError> {
        Ok(self.create(caller, name, description, sequences)?.id)
    }
}
