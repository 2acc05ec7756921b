//! Live databases: structure introspection at registration time and SQL
//! execution for answered questions.

use std::fmt::Debug;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::schema::Driver;
use crate::data_types::{Column, Table};

pub mod any;

pub use any::AnySource;

/// A result row, keyed by column name.
pub type Row = serde_json::Map<String, serde_json::Value>;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RawColumn {
    pub name: String,
    pub data_type: String,
}

/// A table as reported by the live database, before it enters the catalog.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    pub name: String,
    pub columns: Vec<RawColumn>,
}

impl From<RawTable> for Table {
    fn from(raw: RawTable) -> Self {
        Table::new(
            raw.name,
            raw.columns
                .into_iter()
                .map(|c| Column::new(c.name, c.data_type))
                .collect(),
        )
    }
}

#[async_trait]
pub trait DataSource: Send + Sync + Debug {
    fn driver(&self) -> Driver;

    /// All base tables with their columns, tables ordered by name and columns
    /// by position.
    async fn get_tables(&self) -> Result<Vec<RawTable>, sqlx::Error>;

    async fn query(&self, sql: &str) -> Result<Vec<Row>, sqlx::Error>;
}
