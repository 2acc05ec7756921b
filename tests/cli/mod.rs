use assert_cmd::prelude::*; // Add methods on commands
use serde_json::json;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Command, Stdio}; // Run programs
use tempfile::{Builder, TempDir};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod basic;
mod one_off;

const TEST_CONFIG_FILE: &str = "sqltalk-test.toml";

async fn seed_shop_database(path: &Path) -> Result<(), sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await?;

    for statement in [
        "CREATE TABLE orders (id INTEGER PRIMARY KEY, total REAL NOT NULL, note TEXT)",
        "CREATE TABLE customers (id INTEGER PRIMARY KEY, email TEXT)",
        "INSERT INTO orders (id, total, note) VALUES (1, 12.5, 'first'), (2, 40.0, NULL)",
        "INSERT INTO customers (id, email) VALUES (1, 'ann@example.com')",
    ] {
        sqlx::query(statement).execute(&pool).await?;
    }
    pool.close().await;
    Ok(())
}

async fn setup_temp_config_and_data_dir(
    translator_url: &str,
) -> Result<TempDir, Box<dyn std::error::Error>> {
    let temp_dir = Builder::new()
        .prefix("sqltalk-test-dir")
        .rand_bytes(5)
        .tempdir()?;

    let shop_path = temp_dir.path().join("shop.db");
    seed_shop_database(&shop_path).await?;

    let config_str = format!(
        r#"
[catalog]
path = "{}"

[translator]
base_url = "{}"
api_key = "sk-test"

[[sources]]
name = "shop"
driver = "sqlite"
dsn = "sqlite://{}"
max_connections = 1
"#,
        temp_dir
            .path()
            .join("catalog.json")
            .display()
            .to_string()
            .escape_default(),
        translator_url,
        shop_path.display().to_string().escape_default(),
    );

    let mut conf_file = File::create(temp_dir.path().join(TEST_CONFIG_FILE))?;
    write!(conf_file, "{config_str}")?;
    Ok(temp_dir)
}

/// A chat-completions endpoint that always answers with the same SQL
async fn mock_translator(sql: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": sql}}]
        })))
        .mount(&server)
        .await;
    server
}

fn sqltalk(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("sqltalk").expect("sqltalk bin exists");
    cmd.arg("-c")
        .arg(temp_dir.path().join(TEST_CONFIG_FILE))
        .current_dir(temp_dir.path())
        .env("RUST_LOG", "error");
    cmd
}

fn stdout_lines(output: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(output)
        .lines()
        .map(String::from)
        .collect()
}
