use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::catalog::ids::validate_unique_ids;
use crate::catalog::persistence::{self, CatalogState};
use crate::catalog::{CatalogError, CatalogResult, FieldKind, MetadataStore};
use crate::data_types::{Database, DatabaseId};

/// A [`MetadataStore`] kept in memory and written through to a single JSON
/// document on every mutation.
///
/// One reader/writer lock guards the whole catalog. Reads share it; creates,
/// description updates and the initial load take it exclusively, including
/// the file rewrite that follows each of them.
#[derive(Debug)]
pub struct FileMetadataStore {
    path: PathBuf,
    state: RwLock<CatalogState>,
}

impl FileMetadataStore {
    /// Open the catalog at `path`. A missing document means an empty catalog;
    /// so does one that can't be read or parsed, after logging why.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let store = Self {
            path: path.into(),
            state: RwLock::new(CatalogState::default()),
        };
        store.load_from_file();
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_from_file(&self) {
        let mut state = self.state.write();

        match persistence::load(&self.path) {
            Ok(Some(loaded)) => {
                info!(
                    path = %self.path.display(),
                    databases = loaded.databases.len(),
                    "Loaded catalog"
                );
                *state = loaded;
            }
            Ok(None) => {
                debug!(path = %self.path.display(), "No catalog document, starting empty");
            }
            Err(e) => {
                warn!("Error loading catalog, starting empty: {e}");
            }
        }
    }
}

impl MetadataStore for FileMetadataStore {
    fn create_database(&self, database: &Database) -> CatalogResult<DatabaseId> {
        let mut state = self.state.write();

        let mut candidate = database.clone();
        let mut counters = state.counters;
        let id = counters.assign(&mut candidate)?;
        // Handed-out IDs stay consumed even if the candidate is rejected, so a
        // retry moves past a value some caller already supplied
        state.counters = counters;
        validate_unique_ids(&candidate, &state.databases)?;

        state.databases.insert(id, candidate);

        if let Err(e) = persistence::save(&self.path, &state) {
            // The allocated IDs stay consumed: counters never go backward
            state.databases.remove(&id);
            warn!(database_id = id, "Rolled back database creation: {e}");
            return Err(e.into());
        }

        debug!(database_id = id, name = %database.name, "Created database");
        Ok(id)
    }

    fn get_database(&self, id: DatabaseId) -> CatalogResult<Database> {
        self.state
            .read()
            .databases
            .get(&id)
            .cloned()
            .ok_or(CatalogError::DatabaseDoesNotExist { id })
    }

    fn get_all_databases(&self) -> CatalogResult<Vec<Database>> {
        Ok(self.state.read().databases.values().cloned().collect())
    }

    fn set_description(
        &self,
        database_id: DatabaseId,
        description: &str,
        field_id: i64,
        field_kind: FieldKind,
    ) -> CatalogResult<()> {
        let mut state = self.state.write();

        let database = state
            .databases
            .get_mut(&database_id)
            .ok_or(CatalogError::DatabaseDoesNotExist { id: database_id })?;

        let target = match field_kind {
            FieldKind::Database => {
                if database.id != Some(field_id) {
                    return Err(CatalogError::DatabaseIdMismatch {
                        expected: database_id,
                        actual: field_id,
                    });
                }
                &mut database.description
            }
            FieldKind::Table => {
                &mut database
                    .tables
                    .iter_mut()
                    .find(|t| t.id == Some(field_id))
                    .ok_or(CatalogError::TableDoesNotExist {
                        database_id,
                        id: field_id,
                    })?
                    .description
            }
            FieldKind::Column => {
                &mut database
                    .tables
                    .iter_mut()
                    .flat_map(|t| t.columns.iter_mut())
                    .find(|c| c.id == Some(field_id))
                    .ok_or(CatalogError::ColumnDoesNotExist {
                        database_id,
                        id: field_id,
                    })?
                    .description
            }
        };
        *target = description.to_string();

        // A failed write leaves the new description in memory; the next
        // successful write brings the document back in line.
        persistence::save(&self.path, &state)?;

        debug!(database_id, field_id, %field_kind, "Updated description");
        Ok(())
    }
}
