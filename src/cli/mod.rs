mod commands;
pub mod error;
mod utils;
#[cfg(test)]
mod utils_test;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::store::{Database, FilePersistence};
use crate::sync::{FolderTransport, SyncManager, SyncState, SyncStatus, paths};

use error::{CliError, CliResult};
use utils::OutputFormat;

#[derive(Parser)]
#[command(name = "drift")]
#[command(author, version, about = "Offline-first multi-device journal store", long_about = None)]
pub struct Cli {
    /// Data directory (default: DRIFT_DATA_DIR env or ~/.local/share/driftdb)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Directory journals are exchanged through (default: DRIFT_REMOTE_DIR env)
    #[arg(long, global = true)]
    pub remote: Option<PathBuf>,

    /// Use this device id instead of the stored one
    #[arg(long, global = true)]
    pub device: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Insert a new object
    Insert {
        /// Object ID (generated if omitted)
        #[arg(long)]
        id: Option<String>,
        /// Properties as KEY=VALUE
        #[arg(required = true)]
        properties: Vec<String>,
        /// Output format
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Change properties of an object
    Update {
        /// Object ID
        id: String,
        /// Properties as KEY=VALUE
        #[arg(required = true)]
        properties: Vec<String>,
        /// Output format
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Show one object
    Get {
        /// Object ID
        id: String,
        /// Output format
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// List all objects, oldest first
    List {
        /// Output format
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Exchange journals with the remote directory
    Sync,
    /// Show device and store status
    Status,
}

/// Initialize tracing subscriber with env filter
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "driftdb=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build_config(cli: &Cli) -> Config {
    let mut config = Config::new();
    if let Some(dir) = &cli.data_dir {
        config = config.with_data_dir(dir.clone());
    }
    if let Some(dir) = &cli.remote {
        config = config.with_remote_dir(dir.clone());
    }
    if let Some(device) = &cli.device {
        config = config.with_device_id(device.clone());
    }
    config
}

fn sync_manager(config: &Config, device_id: &str) -> CliResult<SyncManager<FolderTransport>> {
    let remote_dir = config.remote_dir.clone().ok_or(CliError::NoRemote)?;
    let transport = FolderTransport::new(
        paths::journals_dir(&config.data_dir),
        remote_dir,
        config.journal_suffix.clone(),
    );
    Ok(SyncManager::new(transport, config.data_dir.clone(), device_id)
        .with_suffix(config.journal_suffix.clone()))
}

async fn execute(cli: Cli) -> CliResult<String> {
    let config = build_config(&cli);
    config.ensure_dirs()?;
    let device_id = config.resolve_device_id()?;

    let mut persistence = FilePersistence::in_dir(&config.data_dir);
    let (journal_cache, state) = persistence.load()?;
    let mut db = Database::with_state(device_id.clone(), journal_cache, state);

    match cli.command {
        Commands::Insert {
            id,
            properties,
            format,
        } => commands::object::insert(&mut db, &mut persistence, id, &properties, format),
        Commands::Update {
            id,
            properties,
            format,
        } => commands::object::update(&mut db, &mut persistence, &id, &properties, format),
        Commands::Get { id, format } => commands::object::get(&db, &id, format),
        Commands::List { format } => commands::object::list(&db, format),
        Commands::Sync => {
            let manager = sync_manager(&config, &device_id)?;
            commands::sync::sync(&manager, &mut db).await
        }
        Commands::Status => {
            let sync_state = SyncState::load(&paths::sync_state_path(&config.data_dir))?;
            Ok(commands::sync::status(&SyncStatus::collect(
                &db,
                &sync_state,
            )))
        }
    }
}

pub async fn run() -> CliResult<()> {
    init_tracing();
    let cli = Cli::parse();

    let output = execute(cli).await?;
    println!("{}", output);
    Ok(())
}
