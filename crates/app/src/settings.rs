//! Application settings, loaded from `settings.toml` plus `SPARTI_*`
//! environment variables.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Option<Server>,
}

#[derive(Debug, Deserialize)]
pub struct App {
    /// Log level filter applied to every crate of the workspace.
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct Server {
    /// Bind address, defaults to 127.0.0.1.
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
}

/// Database backend.
///
/// In TOML either `database = "memory"` or `database = { sqlite = "path" }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("app.level", "info")?
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("SPARTI").separator("__"))
            .build()?
            .try_deserialize()
    }
}
