//! Runtime configuration for the store connection.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Application settings, loaded from defaults, an optional `config.toml` and
/// `PENNYLEDGER_*` environment variables, in that order of precedence.
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// Settings for the document database.
    pub database: DatabaseSettings,
}

/// Where to find the document database.
#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    /// The connection string, e.g. `mongodb://localhost:27017`.
    pub url: String,
    /// The database name.
    pub name: String,
}

impl Settings {
    /// Load the settings.
    ///
    /// # Errors
    /// Returns a [ConfigError] if a configuration source cannot be read or
    /// the merged values do not deserialize into [Settings].
    pub fn new() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("database.url", "mongodb://localhost:27017")?
            .set_default("database.name", "pennyledger")?;

        if std::path::Path::new("config.toml").exists() {
            builder = builder.add_source(File::with_name("config"));
        }

        builder = builder.add_source(Environment::with_prefix("PENNYLEDGER").separator("_"));

        let settings = builder.build()?;
        settings.try_deserialize()
    }
}
