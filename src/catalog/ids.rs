//! Identifier allocation and uniqueness validation.
//!
//! IDs are unique per entity kind across the whole catalog: no two tables
//! anywhere share an ID, and likewise for columns and databases. IDs of
//! different kinds are never compared with each other.

use std::collections::{BTreeMap, HashSet};

use crate::catalog::{CatalogError, CatalogResult};
use crate::data_types::{ColumnId, Database, DatabaseId, TableId};

pub const FIRST_ID: i64 = 1;

/// Next value to hand out for each entity kind. Counters only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdCounters {
    pub next_database_id: DatabaseId,
    pub next_table_id: TableId,
    pub next_column_id: ColumnId,
}

impl Default for IdCounters {
    fn default() -> Self {
        Self {
            next_database_id: FIRST_ID,
            next_table_id: FIRST_ID,
            next_column_id: FIRST_ID,
        }
    }
}

fn is_unassigned(id: Option<i64>) -> bool {
    matches!(id, None | Some(0))
}

fn take(counter: &mut i64, kind: &'static str) -> CatalogResult<i64> {
    let id = *counter;
    *counter = id
        .checked_add(1)
        .ok_or(CatalogError::IdSpaceExhausted { kind })?;
    Ok(id)
}

impl IdCounters {
    /// Raise any counter below [`FIRST_ID`]. A counter at zero would hand out
    /// an ID that reads back as unassigned.
    pub fn clamped(self) -> Self {
        Self {
            next_database_id: self.next_database_id.max(FIRST_ID),
            next_table_id: self.next_table_id.max(FIRST_ID),
            next_column_id: self.next_column_id.max(FIRST_ID),
        }
    }

    /// Fill in every unassigned ID in the tree, leaving caller-supplied ones
    /// untouched. Returns the database's ID.
    pub fn assign(&mut self, database: &mut Database) -> CatalogResult<DatabaseId> {
        if is_unassigned(database.id) {
            database.id = Some(take(&mut self.next_database_id, "database")?);
        }

        for table in database.tables.iter_mut() {
            if is_unassigned(table.id) {
                table.id = Some(take(&mut self.next_table_id, "table")?);
            }

            for column in table.columns.iter_mut() {
                if is_unassigned(column.id) {
                    column.id = Some(take(&mut self.next_column_id, "column")?);
                }
            }
        }

        Ok(database.id.unwrap_or_default())
    }
}

/// Check a candidate database (with its IDs already assigned) against itself
/// and against everything already in the catalog.
pub fn validate_unique_ids(
    candidate: &Database,
    existing: &BTreeMap<DatabaseId, Database>,
) -> CatalogResult<()> {
    if let Some(id) = candidate.id {
        if existing.contains_key(&id) {
            return Err(CatalogError::DatabaseAlreadyExists { id });
        }
    }

    // Duplicates within the candidate itself. Column IDs only have to be
    // distinct within their own table here.
    let mut new_table_ids = HashSet::new();
    for table in &candidate.tables {
        let Some(table_id) = table.id else { continue };
        if !new_table_ids.insert(table_id) {
            return Err(CatalogError::DuplicateTableId { id: table_id });
        }

        let mut new_column_ids = HashSet::new();
        for column_id in table.columns.iter().filter_map(|c| c.id) {
            if !new_column_ids.insert(column_id) {
                return Err(CatalogError::DuplicateColumnId {
                    id: column_id,
                    table_name: table.name.clone(),
                });
            }
        }
    }

    let existing_tables = existing.values().flat_map(|db| db.tables.iter());
    let mut existing_table_ids = HashSet::new();
    let mut existing_column_ids = HashSet::new();
    for table in existing_tables {
        existing_table_ids.extend(table.id);
        existing_column_ids.extend(table.columns.iter().filter_map(|c| c.id));
    }

    for table in &candidate.tables {
        if let Some(id) = table.id.filter(|id| existing_table_ids.contains(id)) {
            return Err(CatalogError::TableAlreadyExists { id });
        }
        if let Some(id) = table
            .columns
            .iter()
            .filter_map(|c| c.id)
            .find(|id| existing_column_ids.contains(id))
        {
            return Err(CatalogError::ColumnAlreadyExists { id });
        }
    }

    Ok(())
}
