//! SQLite-backed set catalog. Sequences are stored as a JSON column.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use super::{AuthGate, Caller, LocalGate, SetCatalog};
use crate::error::{CatalogError, ValidationError};
use crate::storage::Database;
use crate::timer::{SetPatch, TabataSequence, TabataSet};

const SET_COLUMNS: &str = "id, owner, name, description, sequences, created_at, updated_at";

/// Set catalog stored in the `tabata_sets` table.
#[derive(Debug)]
pub struct SqliteCatalog<G = LocalGate> {
    db: Database,
    gate: G,
}

impl SqliteCatalog<LocalGate> {
    pub fn new(db: Database) -> Self {
        Self::with_gate(db, LocalGate)
    }
}

impl<G: AuthGate> SqliteCatalog<G> {
    pub fn with_gate(db: Database, gate: G) -> Self {
        Self { db, gate }
    }

    /// Fetch a row regardless of owner.
    fn fetch(&self, id: &str) -> Result<Option<(String, TabataSet)>, CatalogError> {
        let row = self
            .db
            .conn()
            .query_row(
                &format!("SELECT {SET_COLUMNS} FROM tabata_sets WHERE id = ?1"),
                params![id],
                read_row,
            )
            .optional()?;
        row.map(decode).transpose()
    }

    /// Fetch a set the caller owns.
    fn fetch_owned(&self, owner: &str, id: &str) -> Result<TabataSet, CatalogError> {
        match self.fetch(id)? {
            Some((row_owner, set)) if row_owner == owner => Ok(set),
            Some(_) => Err(CatalogError::Forbidden { id: id.to_string() }),
            None => Err(CatalogError::NotFound { id: id.to_string() }),
        }
    }
}

/// Raw column values of one `tabata_sets` row.
struct SetRow {
    id: String,
    owner: String,
    name: String,
    description: Option<String>,
    sequences: String,
    created_at: String,
    updated_at: String,
}

fn read_row(row: &rusqlite::Row<'_>) -> Result<SetRow, rusqlite::Error> {
    Ok(SetRow {
        id: row.get(0)?,
        owner: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        sequences: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn decode(row: SetRow) -> Result<(String, TabataSet), CatalogError> {
    let sequences: Vec<TabataSequence> = serde_json::from_str(&row.sequences)?;
    Ok((
        row.owner,
        TabataSet {
            id: row.id,
            name: row.name,
            description: row.description,
            sequences,
            created_at: parse_datetime(&row.created_at),
            updated_at: parse_datetime(&row.updated_at),
        },
    ))
}

fn parse_datetime(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn validate_new(name: &str, sequences: &[TabataSequence]) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "name".into(),
            message: "set name is required".into(),
        });
    }
    if sequences.is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "sequences".into(),
            message: "a set needs at least one sequence".into(),
        });
    }
    sequences.iter().try_for_each(TabataSequence::validate)
}

impl<G: AuthGate> SetCatalog for SqliteCatalog<G> {
    fn list(&self, caller: &Caller) -> Result<Vec<TabataSet>, CatalogError> {
        let owner = self.gate.authorize(caller)?;
        let mut stmt = self.db.conn().prepare(&format!(
            "SELECT {SET_COLUMNS} FROM tabata_sets WHERE owner = ?1 ORDER BY created_at, rowid"
        ))?;
        let rows = stmt
            .query_map(params![owner], read_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter()
            .map(|row| decode(row).map(|(_, set)| set))
            .collect()
    }

    fn get(&self, caller: &Caller, id: &str) -> Result<TabataSet, CatalogError> {
        let owner = self.gate.authorize(caller)?;
        self.fetch_owned(&owner, id)
    }

    fn create(
        &self,
        caller: &Caller,
        name: &str,
        description: Option<&str>,
        sequences: &[TabataSequence],
    ) -> Result<TabataSet, CatalogError> {
        let owner = self.gate.authorize(caller)?;
        validate_new(name, sequences)?;

        let now = Utc::now();
        let set = TabataSet {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            description: description
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            sequences: sequences.to_vec(),
            created_at: now,
            updated_at: now,
        };
        self.db.conn().execute(
            "INSERT INTO tabata_sets (id, owner, name, description, sequences, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                set.id,
                owner,
                set.name,
                set.description,
                serde_json::to_string(&set.sequences)?,
                set.created_at.to_rfc3339(),
                set.updated_at.to_rfc3339(),
            ],
        )?;
        tracing::info!(id = %set.id, owner = %owner, name = %set.name, "saved set");
        Ok(set)
    }

    fn update(
        &self,
        caller: &Caller,
        id: &str,
        patch: &SetPatch,
    ) -> Result<TabataSet, CatalogError> {
        let owner = self.gate.authorize(caller)?;
        let mut set = self.fetch_owned(&owner, id)?;
        patch.validate()?;
        set.apply(patch, Utc::now());
        validate_new(&set.name, &set.sequences)?;

        self.db.conn().execute(
            "UPDATE tabata_sets SET name = ?1, description = ?2, sequences = ?3, updated_at = ?4
             WHERE id = ?5",
            params![
                set.name,
                set.description,
                serde_json::to_string(&set.sequences)?,
                set.updated_at.to_rfc3339(),
                set.id,
            ],
        )?;
        tracing::debug!(id = %set.id, "updated set");
        Ok(set)
    }

    fn delete(&self, caller: &Caller, id: &str) -> Result<(), CatalogError> {
        let owner = self.gate.authorize(caller)?;
        self.fetch_owned(&owner, id)?;
        self.db
            .conn()
            .execute("DELETE FROM tabata_sets WHERE id = ?1", params![id])?;
        tracing::info!(id = %id, "deleted set");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RequireUser;
    use crate::timer::SequenceConfig;

    fn catalog() -> SqliteCatalog {
        SqliteCatalog::new(Database::open_memory().unwrap())
    }

    fn sequences() -> Vec<TabataSequence> {
        vec![SequenceConfig {
            name: "Squats".into(),
            work_time: 20,
            rest_time: 10,
            long_rest_time: 60,
            sets: 8,
        }
        .into_sequence("seq-1")]
    }

    #[test]
    fn create_list_get() {
        let catalog = catalog();
        let set = catalog
            .create(&Caller::Local, " Legs ", Some("quads"), &sequences())
            .unwrap();
        assert_eq!(set.name, "Legs");

        let listed = catalog.list(&Caller::Local).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].sequences, sequences());
        assert_eq!(catalog.get(&Caller::Local, &set.id).unwrap().id, set.id);
        assert!(catalog.list(&Caller::User("ana".into())).unwrap().is_empty());
    }

    #[test]
    fn other_owner_is_forbidden() {
        let catalog = catalog();
        let id = catalog
            .save(&Caller::User("ana".into()), "Ana's", None, &sequences())
            .unwrap();
        let bob = Caller::User("bob".into());
        assert!(matches!(
            catalog.delete(&bob, &id),
            Err(CatalogError::Forbidden { .. })
        ));
        assert!(matches!(
            catalog.update(&bob, &id, &SetPatch::default()),
            Err(CatalogError::Forbidden { .. })
        ));
        assert!(matches!(
            catalog.delete(&bob, "missing"),
            Err(CatalogError::NotFound { .. })
        ));
    }

    #[test]
    fn invalid_input_is_rejected() {
        let catalog = catalog();
        assert!(matches!(
            catalog.create(&Caller::Local, "", None, &sequences()),
            Err(CatalogError::Invalid(_))
        ));
        let mut bad = sequences();
        bad[0].sets = 0;
        assert!(matches!(
            catalog.create(&Caller::Local, "Bad", None, &bad),
            Err(CatalogError::Invalid(_))
        ));
        assert!(catalog.list(&Caller::Local).unwrap().is_empty());
    }

    #[test]
    fn update_patches_fields() {
        let catalog = catalog();
        let set = catalog
            .create(&Caller::Local, "Legs", Some("quads"), &sequences())
            .unwrap();
        let updated = catalog
            .update(
                &Caller::Local,
                &set.id,
                &SetPatch {
                    name: Some("Leg day".into()),
                    description: Some(String::new()),
                    sequences: None,
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Leg day");
        assert_eq!(updated.description, None);
        assert!(updated.updated_at >= set.updated_at);
        assert_eq!(catalog.get(&Caller::Local, &set.id).unwrap(), updated);
    }

    #[test]
    fn load_returns_a_copy() {
        let catalog = catalog();
        let id = catalog.save(&Caller::Local, "Legs", None, &sequences()).unwrap();
        let mut loaded = catalog.load(&Caller::Local, &id).unwrap();
        loaded[0].work_time = 99;
        assert_eq!(catalog.load(&Caller::Local, &id).unwrap(), sequences());
    }

    #[test]
    fn anonymous_needs_a_user_behind_require_user() {
        let catalog = SqliteCatalog::with_gate(Database::open_memory().unwrap(), RequireUser);
        assert!(matches!(
            catalog.list(&Caller::Anonymous),
            Err(CatalogError::Unauthorized)
        ));
        assert!(catalog.list(&Caller::Local).unwrap().is_empty());
    }
}
