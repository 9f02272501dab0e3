use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use odt_core::SessionStore;
use tracing_subscriber::EnvFilter;

use odt_cli::{Config, Dispatcher, Registry};

/// Load config and open the database, ensuring the parent directory exists.
fn open_database() -> Result<Box<dyn SessionStore>> {
    let config = Config::load().context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config
        .database_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
    {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = odt_db::Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;
    Ok(Box::new(db))
}

fn main() -> ExitCode {
    // Use try_init to avoid panic if tracing is already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();

    let args: Vec<String> = std::env::args_os()
        .skip(1)
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();

    let dispatcher = Dispatcher::new(Registry::builtin());
    dispatcher
        .dispatch(
            &args,
            open_database,
            &mut io::stdout().lock(),
            &mut io::stderr().lock(),
        )
        .into()
}
