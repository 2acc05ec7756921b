use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use tempfile::TempDir;

use crate::config::schema::{Driver, Source};
use crate::source::AnySource;
use crate::translate::{TranslateError, Translator};

const SHOP_STATEMENTS: &[&str] = &[
    "CREATE TABLE orders (id INTEGER PRIMARY KEY, total REAL NOT NULL, note TEXT)",
    "CREATE TABLE customers (id INTEGER PRIMARY KEY, email TEXT)",
    "INSERT INTO orders (id, total, note) VALUES (1, 12.5, 'first'), (2, 40.0, NULL)",
    "INSERT INTO customers (id, email) VALUES (1, 'ann@example.com')",
];

pub fn shop_source_config(dir: &TempDir) -> Source {
    Source {
        name: "shop".to_string(),
        driver: Driver::Sqlite,
        dsn: format!("sqlite://{}", dir.path().join("shop.db").display()),
        schema: "public".to_string(),
        max_connections: 1,
    }
}

/// A small SQLite database with an `orders` and a `customers` table.
pub async fn make_shop_source(dir: &TempDir) -> AnySource {
    let options = SqliteConnectOptions::new()
        .filename(dir.path().join("shop.db"))
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(options)
        .await
        .expect("Error creating SQLite database");

    for statement in SHOP_STATEMENTS {
        sqlx::query(statement)
            .execute(&pool)
            .await
            .expect("Error seeding SQLite database");
    }
    pool.close().await;

    AnySource::connect_lazy(&shop_source_config(dir)).expect("Error connecting to shop")
}

/// Translator that always answers with the same SQL and remembers what it
/// was asked.
#[derive(Debug, Default)]
pub struct StaticTranslator {
    pub sql: String,
    pub asked: Mutex<Vec<(String, String)>>,
}

impl StaticTranslator {
    pub fn new(sql: &str) -> Arc<Self> {
        Arc::new(Self {
            sql: sql.to_string(),
            asked: Mutex::new(vec![]),
        })
    }
}

#[async_trait]
impl Translator for StaticTranslator {
    async fn to_sql(&self, schema_text: &str, question: &str) -> Result<String, TranslateError> {
        self.asked
            .lock()
            .push((schema_text.to_string(), question.to_string()));
        if self.sql.is_empty() {
            return Err(TranslateError::Empty);
        }
        Ok(self.sql.clone())
    }
}
