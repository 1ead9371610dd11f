/*!
Archive keeper operator tool: moves legacy soft-deleted rows into archive tables
*/

use std::path::PathBuf;

use archive_keeper::{ArchiveError, ArchiveKeeper, KeeperConfig, MigrationReport};
use clap::{Arg, ArgAction, Command, crate_version};
use rusqlite::Connection;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn run_migrations(
    config: &KeeperConfig,
    conn: &Connection,
    entities: &[String],
) -> archive_keeper::Result<Vec<MigrationReport>> {
    let keeper = ArchiveKeeper::new(config.build_context(conn)?);

    entities
        .iter()
        .map(|name| {
            let entity = keeper
                .context()
                .registry()
                .entity(name)
                .cloned()
                .ok_or_else(|| ArchiveError::NotRegistered(name.clone()))?;
            keeper.migrate_from_soft_delete(conn, &entity)
        })
        .collect()
}

/// Log each report and return the total rows moved, or the failure.
fn summarize(outcome: archive_keeper::Result<Vec<MigrationReport>>) -> archive_keeper::Result<usize> {
    let reports = outcome.inspect_err(|e| error!("Migration failed: {}", e))?;
    for report in &reports {
        info!("✅ {}: {} rows in {:.4}s", report.entity, report.moved, report.elapsed.as_secs_f64());
    }
    Ok(reports.iter().map(|report| report.moved).sum())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let matches = Command::new("archive-keeper")
        .version(crate_version!())
        .about("Moves soft-deleted rows into their archive tables")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Path to the archive configuration (TOML)")
                .value_name("PATH")
                .global(true),
        )
        .subcommand(
            Command::new("migrate")
                .about("Archive rows whose marker column is already set")
                .arg(
                    Arg::new("db-path")
                        .short('p')
                        .long("db-path")
                        .help("Database to migrate, overriding the configured one")
                        .value_name("PATH"),
                )
                .arg(
                    Arg::new("entity")
                        .short('e')
                        .long("entity")
                        .help("Entity name to migrate; repeat for several")
                        .value_name("NAME")
                        .action(ArgAction::Append)
                        .required(true),
                ),
        )
        .get_matches();

    let config_path = matches
        .get_one::<String>("config")
        .map(PathBuf::from)
        .or_else(KeeperConfig::default_path)
        .ok_or("No configuration file given and no default location available")?;
    let config = KeeperConfig::load(&config_path)?;
    info!("Loaded {} entities from {:?}", config.entities.len(), config_path);

    let Some(("migrate", migrate)) = matches.subcommand() else {
        return Ok(());
    };

    let db_path = migrate
        .get_one::<String>("db-path")
        .map(PathBuf::from)
        .unwrap_or_else(|| config.database.path.clone());
    let entities: Vec<String> = migrate
        .get_many::<String>("entity")
        .map(|names| names.cloned().collect())
        .unwrap_or_default();

    let conn = Connection::open(&db_path)?;
    let interrupt = conn.get_interrupt_handle();
    let mut job = tokio::task::spawn_blocking(move || run_migrations(&config, &conn, &entities));

    let outcome = tokio::select! {
        result = &mut job => result,
        _ = tokio::signal::ctrl_c() => {
            info!("🛑 Interrupt requested, stopping the running migration");
            interrupt.interrupt();
            job.await
        }
    };

    let moved = summarize(outcome?)?;
    info!("Moved {} rows from {:?}", moved, db_path);
    Ok(())
}
