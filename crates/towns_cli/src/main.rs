//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable that wires config, logging, the SQLite
//!   store and the registry together.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `towns_cli [DB_PATH]`. Without a path, `TOWNS_DB_PATH` is used,
//! then an in-memory database.

use std::path::PathBuf;
use std::process::ExitCode;
use towns_core::{CoreConfig, SqliteTownRepository, TownRegistry};

const SAMPLE_TOWNS: &[(&str, i64)] = &[("Sofia", 50), ("Varna", 50), ("Plovdiv", 70), ("Lom", 30)];

fn main() -> ExitCode {
    let mut config = CoreConfig::from_env();
    if let Some(path) = std::env::args_os().nth(1) {
        config.db_path = Some(PathBuf::from(path));
    }

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("event=cli_run module=cli status=error error={err}");
            eprintln!("towns_cli failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &CoreConfig) -> Result<(), Box<dyn std::error::Error>> {
    config.init_logging()?;

    let conn = config.open_connection()?;
    let registry = TownRegistry::new(SqliteTownRepository::try_new(&conn)?);

    for (name, population) in SAMPLE_TOWNS {
        registry.add_town(*name, *population)?;
    }

    println!("towns_core version={}", towns_core::core_version());
    for town in registry.list_towns()? {
        println!("{}\t{}\t{}", town.id, town.name, town.population);
    }
    Ok(())
}
