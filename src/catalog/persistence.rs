//! The on-disk catalog document.
//!
//! The whole catalog is written as one JSON document of the shape
//! `{ databases: {id: Database}, next_database_id, next_table_id, next_column_id }`
//! and rewritten in full after every mutation. Writes go to a temporary file
//! in the same directory which is then renamed over the old document, so a
//! failed write leaves the previous document in place.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::catalog::ids::{IdCounters, FIRST_ID};
use crate::data_types::{ColumnId, Database, DatabaseId, TableId};

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("failed to encode catalog document: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode catalog document {path:?}: {source}")]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("catalog document {path:?} holds database {id} more than once")]
    DuplicateDatabase { path: PathBuf, id: DatabaseId },

    #[error("I/O error on catalog document {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

/// Everything the store keeps in memory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CatalogState {
    pub databases: BTreeMap<DatabaseId, Database>,
    pub counters: IdCounters,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    databases: &'a BTreeMap<DatabaseId, Database>,
    next_database_id: DatabaseId,
    next_table_id: TableId,
    next_column_id: ColumnId,
}

fn first_id() -> i64 {
    FIRST_ID
}

#[derive(Deserialize)]
struct Snapshot {
    #[serde(default)]
    databases: Option<BTreeMap<DatabaseId, Database>>,
    #[serde(default = "first_id")]
    next_database_id: DatabaseId,
    #[serde(default = "first_id")]
    next_table_id: TableId,
    #[serde(default = "first_id")]
    next_column_id: ColumnId,
}

pub fn encode(state: &CatalogState) -> Result<Vec<u8>, PersistenceError> {
    let snapshot = SnapshotRef {
        databases: &state.databases,
        next_database_id: state.counters.next_database_id,
        next_table_id: state.counters.next_table_id,
        next_column_id: state.counters.next_column_id,
    };

    serde_json::to_vec_pretty(&snapshot).map_err(PersistenceError::Encode)
}

pub fn decode(path: &Path, data: &[u8]) -> Result<CatalogState, PersistenceError> {
    let snapshot: Snapshot =
        serde_json::from_slice(data).map_err(|source| PersistenceError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

    // The map key and the entity's own ID must agree; the entity wins, and
    // one without an ID takes its key
    let mut databases = BTreeMap::new();
    // A document with `"databases": null` is still a valid, empty catalog
    for (key, mut database) in snapshot.databases.unwrap_or_default() {
        let id = *database.id.get_or_insert(key);
        if databases.insert(id, database).is_some() {
            return Err(PersistenceError::DuplicateDatabase {
                path: path.to_path_buf(),
                id,
            });
        }
    }

    Ok(CatalogState {
        databases,
        counters: IdCounters {
            next_database_id: snapshot.next_database_id,
            next_table_id: snapshot.next_table_id,
            next_column_id: snapshot.next_column_id,
        }
        .clamped(),
    })
}

/// Read the document at `path`. A missing file yields `Ok(None)`.
pub fn load(path: &Path) -> Result<Option<CatalogState>, PersistenceError> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(PersistenceError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    decode(path, &data).map(Some)
}

pub fn save(path: &Path, state: &CatalogState) -> Result<(), PersistenceError> {
    let data = encode(state)?;
    let io_error = |source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir).map_err(io_error)?;
    file.write_all(&data).map_err(io_error)?;
    file.as_file().sync_all().map_err(io_error)?;
    file.persist(path).map_err(|e| io_error(e.error))?;

    Ok(())
}
