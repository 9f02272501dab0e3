//! Configuration loading and management.
//!
//! There is no configuration file: defaults can be overridden through
//! `ODTIMETRACKER_*` environment variables only.

use std::fmt;
use std::path::PathBuf;

use figment::Figment;
use figment::providers::{Env, Serialized};
use serde::{Deserialize, Serialize};

/// Name of the database file in the user's home directory.
const DATABASE_FILE_NAME: &str = ".odtimetracker.sqlite";

/// Prefix of environment variables that override the configuration.
const ENV_PREFIX: &str = "ODTIMETRACKER_";

/// Key of the database path, as it appears after [`ENV_PREFIX`].
const DATABASE_PATH_KEY: &str = "database_path";

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: home.join(DATABASE_FILE_NAME),
        }
    }
}

impl Config {
    /// Loads configuration from defaults and the environment.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    fn figment() -> Figment {
        let figment = Figment::from(Serialized::defaults(Self::default())).merge(
            Env::prefixed(ENV_PREFIX)
                .filter(|key| !key.as_str().eq_ignore_ascii_case(DATABASE_PATH_KEY)),
        );

        // `Env` parses values by type, which turns a path like `2024` into an
        // integer. The database path is taken verbatim instead.
        match Env::var(&format!("{ENV_PREFIX}{DATABASE_PATH_KEY}")) {
            Some(path) => figment.merge(Serialized::default(DATABASE_PATH_KEY, path)),
            None => figment,
        }
    }
}
