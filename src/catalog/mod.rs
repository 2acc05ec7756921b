use std::fmt::Debug;

use strum_macros::{Display, EnumString};

use crate::data_types::{ColumnId, Database, DatabaseId, TableId};

pub mod ids;
pub mod persistence;
pub mod store;

pub use persistence::PersistenceError;
pub use store::FileMetadataStore;

pub const DEFAULT_CATALOG_PATH: &str = "catalog.json";

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    // Lookup errors
    #[error("Database with ID {id} doesn't exist")]
    DatabaseDoesNotExist { id: DatabaseId },

    #[error("Table with ID {id} doesn't exist in database {database_id}")]
    TableDoesNotExist { database_id: DatabaseId, id: TableId },

    #[error("Column with ID {id} doesn't exist in database {database_id}")]
    ColumnDoesNotExist {
        database_id: DatabaseId,
        id: ColumnId,
    },

    // Identifier collisions
    #[error("Database with ID {id} already exists")]
    DatabaseAlreadyExists { id: DatabaseId },

    #[error("Duplicate table ID {id} within the database")]
    DuplicateTableId { id: TableId },

    #[error("Duplicate column ID {id} within table {table_name:?}")]
    DuplicateColumnId { id: ColumnId, table_name: String },

    #[error("Table with ID {id} already exists in another database")]
    TableAlreadyExists { id: TableId },

    #[error("Column with ID {id} already exists in another database")]
    ColumnAlreadyExists { id: ColumnId },

    #[error("Database ID mismatch: expected {expected}, got {actual}")]
    DatabaseIdMismatch {
        expected: DatabaseId,
        actual: DatabaseId,
    },

    #[error("Ran out of {kind} IDs")]
    IdSpaceExhausted { kind: &'static str },

    #[error("Unknown field kind: {kind:?}")]
    UnknownFieldKind { kind: String },

    #[error("Failed to persist the catalog: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Coarse classification of [`CatalogError`], for callers that only care
/// about how to react to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidInput,
    Persistence,
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::DatabaseDoesNotExist { .. }
            | CatalogError::TableDoesNotExist { .. }
            | CatalogError::ColumnDoesNotExist { .. } => ErrorKind::NotFound,
            CatalogError::DatabaseAlreadyExists { .. }
            | CatalogError::DuplicateTableId { .. }
            | CatalogError::DuplicateColumnId { .. }
            | CatalogError::TableAlreadyExists { .. }
            | CatalogError::ColumnAlreadyExists { .. }
            | CatalogError::DatabaseIdMismatch { .. }
            | CatalogError::IdSpaceExhausted { .. } => ErrorKind::Conflict,
            CatalogError::UnknownFieldKind { .. } => ErrorKind::InvalidInput,
            CatalogError::Persistence(_) => ErrorKind::Persistence,
        }
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Which entity a description update targets.
///
/// The numeric tags match the ones older clients send over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum FieldKind {
    Column = 1,
    Table = 2,
    Database = 3,
}

impl FieldKind {
    /// Parse either the kind's name (case-insensitive) or its numeric tag.
    pub fn parse(value: &str) -> CatalogResult<Self> {
        let value = value.trim();
        if let Ok(tag) = value.parse::<i64>() {
            return Self::try_from(tag);
        }

        value
            .to_lowercase()
            .parse()
            .map_err(|_| CatalogError::UnknownFieldKind {
                kind: value.to_string(),
            })
    }
}

impl TryFrom<i64> for FieldKind {
    type Error = CatalogError;

    fn try_from(tag: i64) -> Result<Self, Self::Error> {
        match tag {
            1 => Ok(FieldKind::Column),
            2 => Ok(FieldKind::Table),
            3 => Ok(FieldKind::Database),
            _ => Err(CatalogError::UnknownFieldKind {
                kind: tag.to_string(),
            }),
        }
    }
}

/// The canonical record of every registered database's structure.
///
/// Every value returned is an independent copy of what the store holds.
/// Writers are serialized with respect to each other and to readers.
pub trait MetadataStore: Send + Sync + Debug {
    /// Register a database tree, assigning any missing IDs. Returns the
    /// database's ID.
    fn create_database(&self, database: &Database) -> CatalogResult<DatabaseId>;

    fn get_database(&self, id: DatabaseId) -> CatalogResult<Database>;

    /// All databases, ordered by ID.
    fn get_all_databases(&self) -> CatalogResult<Vec<Database>>;

    /// Update the description of the database itself, one of its tables or one
    /// of its columns.
    fn set_description(
        &self,
        database_id: DatabaseId,
        description: &str,
        field_id: i64,
        field_kind: FieldKind,
    ) -> CatalogResult<()>;
}
