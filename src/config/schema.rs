use std::collections::{HashMap, HashSet};
use std::path::Path;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use strum_macros::Display;

use crate::catalog::DEFAULT_CATALOG_PATH;

pub const DEFAULT_CONFIG_PATH: &str = "sqltalk.toml";
pub const ENV_PREFIX: &str = "SQLTALK";

#[derive(Deserialize, Debug, PartialEq, Clone, Default)]
pub struct SqltalkConfig {
    #[serde(default)]
    pub catalog: Catalog,
    #[serde(default)]
    pub translator: Translator,
    #[serde(default)]
    pub sources: Vec<Source>,
}

#[derive(Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(default)]
pub struct Catalog {
    pub path: String,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            path: DEFAULT_CATALOG_PATH.to_string(),
        }
    }
}

#[derive(Deserialize, Debug, PartialEq, Clone)]
#[serde(default)]
pub struct Translator {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f64,
}

impl Default for Translator {
    fn default() -> Self {
        Self {
            base_url: "https://api.avalai.ir/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o".to_string(),
            temperature: 0.3,
        }
    }
}

#[derive(Deserialize, Debug, PartialEq, Eq, Clone, Copy, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Driver {
    Postgres,
    Mysql,
    Cockroach,
    Sqlite,
}

#[derive(Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct Source {
    pub name: String,
    pub driver: Driver,
    pub dsn: String,
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_schema() -> String {
    "public".to_string()
}

fn default_max_connections() -> u32 {
    5
}

pub fn validate_config(config: SqltalkConfig) -> Result<SqltalkConfig, ConfigError> {
    let mut names = HashSet::new();
    for source in &config.sources {
        if source.name.trim().is_empty() {
            return Err(ConfigError::Message(
                "Every source needs a non-empty name".to_string(),
            ));
        }
        if !names.insert(source.name.as_str()) {
            return Err(ConfigError::Message(format!(
                "Source {:?} is defined more than once",
                source.name
            )));
        }
    }

    Ok(config)
}

fn environment(env_override: Option<HashMap<String, String>>) -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .source(env_override)
}

pub fn load_config(path: &Path) -> Result<SqltalkConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from(path))
        .add_source(environment(None));

    config.build()?.try_deserialize().and_then(validate_config)
}

// Load a config from a string (to test our structs are defined correctly)
pub fn load_config_from_string(
    config_str: &str,
    skip_validation: bool,
    env_override: Option<HashMap<String, String>>,
) -> Result<SqltalkConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from_str(config_str, FileFormat::Toml))
        .add_source(environment(env_override));

    if skip_validation {
        config.build()?.try_deserialize()
    } else {
        config.build()?.try_deserialize().and_then(validate_config)
    }
}
