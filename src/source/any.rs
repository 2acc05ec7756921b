use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use futures::TryStreamExt;
use serde_json::Value;
use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::{Any, AnyPool, Column, Decode, Row as _, Type};
use tracing::debug;

use crate::config::schema::{Driver, Source};
use crate::source::{DataSource, RawColumn, RawTable, Row};

/// Catalog queries that differ between SQL dialects
struct IntrospectionQueries {
    tables: &'static str,
    columns: &'static str,
    /// Whether both queries take the configured schema as their first argument
    binds_schema: bool,
}

// information_schema identifiers are domain types that the Any driver can't
// decode, hence the casts.
const POSTGRES_QUERIES: IntrospectionQueries = IntrospectionQueries {
    tables: r#"
        SELECT CAST(table_name AS TEXT)
        FROM information_schema.tables
        WHERE table_schema = $1
        AND table_type = 'BASE TABLE'
        ORDER BY table_name"#,
    columns: r#"
        SELECT CAST(column_name AS TEXT), CAST(data_type AS TEXT)
        FROM information_schema.columns
        WHERE table_schema = $1 AND table_name = $2
        ORDER BY ordinal_position"#,
    binds_schema: true,
};

const MYSQL_QUERIES: IntrospectionQueries = IntrospectionQueries {
    tables: r#"
        SELECT CAST(TABLE_NAME AS CHAR)
        FROM INFORMATION_SCHEMA.TABLES
        WHERE TABLE_SCHEMA = DATABASE()
        AND TABLE_TYPE = 'BASE TABLE'
        ORDER BY TABLE_NAME"#,
    columns: r#"
        SELECT CAST(COLUMN_NAME AS CHAR), CAST(DATA_TYPE AS CHAR)
        FROM INFORMATION_SCHEMA.COLUMNS
        WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?
        ORDER BY ORDINAL_POSITION"#,
    binds_schema: false,
};

const SQLITE_QUERIES: IntrospectionQueries = IntrospectionQueries {
    tables: r#"
        SELECT name
        FROM sqlite_master
        WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
        ORDER BY name"#,
    columns: r#"SELECT name, type FROM pragma_table_info(?) ORDER BY cid"#,
    binds_schema: false,
};

/// A live database reached through sqlx's runtime-selected driver.
#[derive(Debug)]
pub struct AnySource {
    pool: AnyPool,
    driver: Driver,
    schema: String,
}

impl AnySource {
    /// Set up the pool without opening a connection yet; the DSN is still
    /// validated.
    pub fn connect_lazy(source: &Source) -> Result<Self, sqlx::Error> {
        sqlx::any::install_default_drivers();

        let pool = AnyPoolOptions::new()
            .max_connections(source.max_connections)
            .connect_lazy(&source.dsn)?;

        Ok(Self {
            pool,
            driver: source.driver,
            schema: source.schema.clone(),
        })
    }

    fn queries(&self) -> &'static IntrospectionQueries {
        match self.driver {
            Driver::Postgres | Driver::Cockroach => &POSTGRES_QUERIES,
            Driver::Mysql => &MYSQL_QUERIES,
            Driver::Sqlite => &SQLITE_QUERIES,
        }
    }

    async fn get_columns(&self, table_name: &str) -> Result<Vec<RawColumn>, sqlx::Error> {
        let queries = self.queries();
        let mut query = sqlx::query_as::<_, (String, String)>(queries.columns);
        if queries.binds_schema {
            query = query.bind(self.schema.as_str());
        }

        query
            .bind(table_name)
            .fetch(&self.pool)
            .map_ok(|(name, data_type)| RawColumn { name, data_type })
            .try_collect()
            .await
    }
}

#[async_trait]
impl DataSource for AnySource {
    fn driver(&self) -> Driver {
        self.driver
    }

    async fn get_tables(&self) -> Result<Vec<RawTable>, sqlx::Error> {
        let queries = self.queries();
        let mut query = sqlx::query_scalar::<_, String>(queries.tables);
        if queries.binds_schema {
            query = query.bind(self.schema.as_str());
        }
        let names: Vec<String> = query.fetch_all(&self.pool).await?;

        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            let columns = self.get_columns(&name).await?;
            tables.push(RawTable { name, columns });
        }

        debug!(driver = %self.driver, tables = tables.len(), "Introspected source");
        Ok(tables)
    }

    async fn query(&self, sql: &str) -> Result<Vec<Row>, sqlx::Error> {
        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(row_to_json).collect())
    }
}

fn row_to_json(row: &AnyRow) -> Row {
    row.columns()
        .iter()
        .map(|column| (column.name().to_string(), decode_value(row, column.ordinal())))
        .collect()
}

fn try_decode<'r, T>(row: &'r AnyRow, index: usize) -> Option<Option<T>>
where
    T: Decode<'r, Any> + Type<Any>,
{
    row.try_get::<Option<T>, _>(index).ok()
}

/// Decode a single value into the closest JSON type. Binary data becomes a
/// base64 string; anything undecodable becomes null.
fn decode_value(row: &AnyRow, index: usize) -> Value {
    let decoded = try_decode::<i64>(row, index)
        .map(|v| v.map(Value::from))
        .or_else(|| try_decode::<i32>(row, index).map(|v| v.map(Value::from)))
        .or_else(|| try_decode::<i16>(row, index).map(|v| v.map(Value::from)))
        .or_else(|| try_decode::<f64>(row, index).map(|v| v.map(Value::from)))
        .or_else(|| try_decode::<f32>(row, index).map(|v| v.map(Value::from)))
        .or_else(|| try_decode::<bool>(row, index).map(|v| v.map(Value::from)))
        .or_else(|| try_decode::<String>(row, index).map(|v| v.map(Value::from)))
        .or_else(|| {
            try_decode::<Vec<u8>>(row, index)
                .map(|v| v.map(|bytes| Value::String(STANDARD.encode(bytes))))
        });

    decoded.flatten().unwrap_or(Value::Null)
}
