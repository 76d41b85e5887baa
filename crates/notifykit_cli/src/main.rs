//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `notifykit_core` linkage with deterministic output.
//! - Optionally open (and migrate) a database file and report its schema
//!   version.

use clap::Parser;
use log::info;
use notifykit_core::db::migrations::{latest_version, schema_version};
use notifykit_core::db::open_db;
use std::path::PathBuf;
use std::process::ExitCode;

/// notifykit core smoke check.
#[derive(Debug, Parser)]
#[command(name = "notifykit_cli", version)]
struct Args {
    /// Database file to open and migrate.
    #[arg(long)]
    db: Option<PathBuf>,

    /// Absolute directory for rolling log files; logging stays off without it.
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Log verbosity (trace|debug|info|warn|error).
    #[arg(long, env = "NOTIFYKIT_LOG_LEVEL")]
    log_level: Option<String>,
}

fn run(args: Args) -> Result<(), String> {
    if let Some(log_dir) = &args.log_dir {
        let level = args
            .log_level
            .unwrap_or_else(|| notifykit_core::default_log_level().as_str().to_string());
        notifykit_core::init_logging(&level, log_dir).map_err(|err| err.to_string())?;
    }

    println!("notifykit_core ping={}", notifykit_core::ping());
    println!("notifykit_core version={}", notifykit_core::core_version());

    if let Some(path) = &args.db {
        let conn = open_db(path).map_err(|err| err.to_string())?;
        let version = schema_version(&conn).map_err(|err| err.to_string())?;
        info!("event=cli_db_check module=cli status=ok schema_version={version}");
        println!("notifykit_core schema_version={version}/{}", latest_version());
    }
    Ok(())
}

fn main() -> ExitCode {
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}
