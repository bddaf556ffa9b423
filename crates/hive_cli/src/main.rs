//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `hive_core` linkage and print the section listing of a database.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `hive_cli [DB_PATH] [HIVE_ID]`. Set `HIVE_LOG_DIR` to an absolute
//! directory to enable file logging.

use hive_core::db::open_db;
use hive_core::{
    core_version, default_log_level, init_logging, FixedActor, HiveSectionManager,
    SqliteSectionRepository,
};
use std::process::ExitCode;

/// Read-only listing never stamps audit columns.
const CLI_ACTOR_ID: i64 = 0;

fn main() -> ExitCode {
    println!("hive_core version={}", core_version());

    if let Ok(log_dir) = std::env::var("HIVE_LOG_DIR") {
        if let Err(err) = init_logging(default_log_level(), &log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let mut args = std::env::args().skip(1);
    let Some(db_path) = args.next() else {
        return ExitCode::SUCCESS;
    };
    let hive_id = match args.next().map(|raw| raw.parse::<i64>()) {
        None => None,
        Some(Ok(hive_id)) => Some(hive_id),
        Some(Err(err)) => {
            eprintln!("invalid hive id: {err}");
            return ExitCode::FAILURE;
        }
    };

    match run(&db_path, hive_id) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("event=cli_list module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(db_path: &str, hive_id: Option<i64>) -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_db(db_path)?;
    let manager = HiveSectionManager::new(
        SqliteSectionRepository::new(&conn),
        FixedActor(CLI_ACTOR_ID),
    );

    let sections = match hive_id {
        Some(hive_id) => manager.list_hive_sections(hive_id)?,
        None => manager.list_sections()?,
    };
    for section in sections {
        println!(
            "{}\t{}\t{}\tdeleted={}",
            section.id, section.code, section.name, section.is_deleted
        );
    }
    Ok(())
}
