use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use city_gallery::{
    cloudinary::CloudinaryStore,
    db::open_repository,
    entities::backup::{BackupDocument, ImportMode},
    settings::{AppConfig, StorageBackend},
    storage::LocalMediaStorage,
    telemetry::{init_tracing, DEFAULT_FILTER},
    use_cases::{asset_sync::AssetSync, import::BackupImporter},
};

/// City gallery maintenance commands.
#[derive(Parser, Debug)]
#[command(name = "gallery-admin", author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load a JSON backup of cities and media.
    Import {
        /// Backup document mapping table names to record lists.
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = ModeArg::Replace)]
        mode: ModeArg,
    },
    /// Write every city and media row to a JSON backup.
    Export {
        file: PathBuf,
    },
    /// Upload local media files to Cloudinary and store the hosted URLs.
    SyncAssets,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    /// Clear each table in the backup, then reload it.
    Replace,
    /// Do nothing when the gallery already holds media.
    IfEmpty,
}

impl From<ModeArg> for ImportMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Replace => ImportMode::Replace,
            ModeArg::IfEmpty => ImportMode::IfEmpty,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::new().context("Failed to load configuration")?;
    init_tracing(DEFAULT_FILTER, config.is_production());

    if config.storage_backend == StorageBackend::Memory {
        tracing::warn!("gallery-admin is running against the in-memory backend; changes will not persist");
    }

    match cli.command {
        Commands::Import { file, mode } => cmd_import(&config, file, mode.into()).await,
        Commands::Export { file } => cmd_export(&config, file).await,
        Commands::SyncAssets => cmd_sync_assets(&config).await,
    }
}

async fn cmd_import(config: &AppConfig, file: PathBuf, mode: ImportMode) -> Result<()> {
    let raw = tokio::fs::read_to_string(&file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let document: BackupDocument = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a valid backup document", file.display()))?;

    let repo = open_repository(config).await?;
    let report = BackupImporter::new(repo).import(document, mode).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn cmd_export(config: &AppConfig, file: PathBuf) -> Result<()> {
    let repo = open_repository(config).await?;
    let document = BackupImporter::new(repo).export().await?;

    tokio::fs::write(&file, serde_json::to_vec_pretty(&document)?)
        .await
        .with_context(|| format!("Failed to write {}", file.display()))?;

    let rows: usize = document.values().map(Vec::len).sum();
    println!("Exported {} rows to {}", rows, file.display());
    Ok(())
}

async fn cmd_sync_assets(config: &AppConfig) -> Result<()> {
    let cloudinary = config
        .cloudinary()
        .context("APP_CLOUDINARY_CLOUD_NAME and APP_CLOUDINARY_UPLOAD_PRESET must be set")?;

    let repo = open_repository(config).await?;
    let sync = AssetSync::new(
        repo,
        CloudinaryStore::new(&cloudinary),
        LocalMediaStorage::new(&config.media_root),
    );
    let summary = sync.run().await?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
