//! Session-level orchestration: which live source is in use, which catalog
//! database questions are asked against, and the question -> SQL -> rows
//! pipeline.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::catalog::{CatalogError, FieldKind, MetadataStore};
use crate::data_types::{Database, DatabaseId};
use crate::source::{DataSource, Row};
use crate::translate::{TranslateError, Translator};

#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("No source selected. Pick one with \\use <source>")]
    NoSource,

    #[error("No database selected. Pick one with \\c <id>")]
    NotConnected,

    #[error("Unknown source {name:?}")]
    UnknownSource { name: String },

    #[error("No {kind} named {name:?} in the current database")]
    UnknownField { kind: FieldKind, name: String },

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Error talking to the source: {0}")]
    Source(#[from] sqlx::Error),

    #[error(transparent)]
    Translate(#[from] TranslateError),

    #[error("Error running {sql:?}: {source}")]
    Query { sql: String, source: sqlx::Error },

    #[error("Error rendering results: {0}")]
    Render(#[from] serde_json::Error),
}

pub type Result<T, E = HandlerError> = std::result::Result<T, E>;

/// The answer to a question: the generated SQL and what it returned.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    pub sql: String,
    pub rows: Vec<Row>,
}

impl QueryOutcome {
    pub fn rows_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.rows)?)
    }
}

#[derive(Debug)]
pub struct DatabaseHandler {
    sources: BTreeMap<String, Arc<dyn DataSource>>,
    store: Arc<dyn MetadataStore>,
    translator: Arc<dyn Translator>,
    current_source: Option<String>,
    current_database: Option<Database>,
}

impl DatabaseHandler {
    pub fn new(
        sources: BTreeMap<String, Arc<dyn DataSource>>,
        store: Arc<dyn MetadataStore>,
        translator: Arc<dyn Translator>,
    ) -> Self {
        Self {
            sources,
            store,
            translator,
            current_source: None,
            current_database: None,
        }
    }

    pub fn sources(&self) -> impl Iterator<Item = (&str, &Arc<dyn DataSource>)> {
        self.sources.iter().map(|(name, source)| (name.as_str(), source))
    }

    pub fn current_source(&self) -> Option<&str> {
        self.current_source.as_deref()
    }

    pub fn current_database(&self) -> Option<&Database> {
        self.current_database.as_ref()
    }

    pub fn switch_source(&mut self, name: &str) -> Result<()> {
        if !self.sources.contains_key(name) {
            return Err(HandlerError::UnknownSource {
                name: name.to_string(),
            });
        }

        debug!(source = name, "Switched source");
        self.current_source = Some(name.to_string());
        Ok(())
    }

    fn source(&self) -> Result<(&str, &Arc<dyn DataSource>)> {
        let name = self.current_source.as_deref().ok_or(HandlerError::NoSource)?;
        let source = self
            .sources
            .get(name)
            .ok_or_else(|| HandlerError::UnknownSource {
                name: name.to_string(),
            })?;
        Ok((name, source))
    }

    /// Snapshot the current source's structure into the catalog as a new
    /// database named after the source.
    pub async fn register_database(&mut self) -> Result<DatabaseId> {
        let (name, source) = self.source()?;
        let tables = source.get_tables().await?;

        let database = Database::new(name, tables.into_iter().map(Into::into).collect());
        let id = self.store.create_database(&database)?;

        info!(
            source = name,
            id,
            tables = database.tables.len(),
            "Registered database"
        );
        Ok(id)
    }

    pub fn databases(&self) -> Result<Vec<Database>> {
        Ok(self.store.get_all_databases()?)
    }

    pub fn database(&self, id: DatabaseId) -> Result<Database> {
        Ok(self.store.get_database(id)?)
    }

    /// Make a catalog database the target of subsequent questions. A source
    /// with the database's name becomes the current source.
    pub fn choose_database(&mut self, id: DatabaseId) -> Result<&Database> {
        let database = self.store.get_database(id)?;

        if self.sources.contains_key(&database.name) {
            self.current_source = Some(database.name.clone());
        } else if self.current_source.is_none() {
            return Err(HandlerError::NoSource);
        }

        debug!(id, name = %database.name, "Chose database");
        Ok(&*self.current_database.insert(database))
    }

    /// Resolve a description target given either as an ID or by name: the
    /// database's own name, a table name, or `table.column`.
    pub fn resolve_field(&self, field_kind: FieldKind, target: &str) -> Result<i64> {
        if let Ok(id) = target.parse::<i64>() {
            return Ok(id);
        }

        let database = self
            .current_database
            .as_ref()
            .ok_or(HandlerError::NotConnected)?;
        let id = match field_kind {
            FieldKind::Database => database.id.filter(|_| database.name == target),
            FieldKind::Table => database.table_by_name(target).and_then(|t| t.id),
            FieldKind::Column => target.split_once('.').and_then(|(table, column)| {
                database.table_by_name(table)?.column_by_name(column)?.id
            }),
        };

        id.ok_or_else(|| HandlerError::UnknownField {
            kind: field_kind,
            name: target.to_string(),
        })
    }

    pub fn set_description(
        &mut self,
        description: &str,
        field_id: i64,
        field_kind: FieldKind,
    ) -> Result<()> {
        let database_id = self
            .current_database
            .as_ref()
            .and_then(|db| db.id)
            .ok_or(HandlerError::NotConnected)?;

        self.store
            .set_description(database_id, description, field_id, field_kind)?;
        self.current_database = Some(self.store.get_database(database_id)?);
        Ok(())
    }

    /// Translate a question against the chosen database's schema and run the
    /// resulting SQL on the current source.
    pub async fn query(&self, question: &str) -> Result<QueryOutcome> {
        let database = self
            .current_database
            .as_ref()
            .ok_or(HandlerError::NotConnected)?;
        let (_, source) = self.source()?;

        let schema_text = database.schema_text()?;
        let sql = self.translator.to_sql(&schema_text, question).await?;

        info!(database = %database.name, sql, "Running generated query");
        let rows = source
            .query(&sql)
            .await
            .map_err(|source| HandlerError::Query {
                sql: sql.clone(),
                source,
            })?;

        Ok(QueryOutcome { sql, rows })
    }
}
