//! Settings of the `basket` binary.
//!
//! Values come from an optional TOML file (`config/basket.toml` unless
//! `--config` says otherwise) and `BASKET_*` environment variables, the latter
//! winning. Nested keys use a double underscore: `BASKET_APP__LEVEL=debug`.
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::Result;

pub const DEFAULT_CONFIG_PATH: &str = "config/basket.toml";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Store of record.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Default for Database {
    fn default() -> Self {
        Self::Sqlite("basket.db".to_string())
    }
}

impl Database {
    pub fn url(&self) -> String {
        match self {
            Self::Memory => String::from("sqlite::memory:"),
            Self::Sqlite(path) => format!("sqlite:{path}?mode=rwc"),
        }
    }
}

/// Secondary expense store.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mirror {
    Memory,
    Json(String),
}

impl Default for Mirror {
    fn default() -> Self {
        Self::Json("basket-mirror.json".to_string())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub database: Database,
    pub mirror: Mirror,
}

impl Settings {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path.unwrap_or(DEFAULT_CONFIG_PATH);
        let settings = Config::builder()
            .add_source(File::with_name(path).required(config_path.is_some()))
            .add_source(
                Environment::with_prefix("BASKET")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn missing_default_file_falls_back_to_defaults() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.app.level, "info");
        assert!(matches!(settings.database, Database::Sqlite(ref p) if p == "basket.db"));
    }

    #[test]
    fn reads_a_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[app]\nlevel = \"debug\"\n\n[database]\nsqlite = \"/tmp/lists.db\"\n\n[mirror]\njson = \"/tmp/mirror.json\""
        )
        .unwrap();

        let settings = Settings::load(file.path().to_str()).unwrap();
        assert_eq!(settings.app.level, "debug");
        assert_eq!(settings.database.url(), "sqlite:/tmp/lists.db?mode=rwc");
        assert!(matches!(settings.mirror, Mirror::Json(ref p) if p == "/tmp/mirror.json"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        assert!(Settings::load(Some("/definitely/not/here.toml")).is_err());
    }

    #[test]
    fn memory_database_url() {
        assert_eq!(Database::Memory.url(), "sqlite::memory:");
    }
}
