//! CLI command definitions and dispatch.

pub mod asset;
pub mod folder;
pub mod sweep;
pub mod upload;

use clap::{Parser, Subcommand};

use assethub_api::AppState;
use assethub_core::config::AppConfig;
use assethub_core::error::AppError;
use assethub_service::RequestContext;

use crate::output::OutputFormat;

/// AssetHub: versioned asset store administration
#[derive(Debug, Parser)]
#[command(name = "assethub", version, about, long_about = None)]
pub struct Cli {
    /// Configuration environment (`config/{env}.toml` layered over `config/default.toml`)
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Actor recorded on writes
    #[arg(short, long)]
    pub actor: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Folder management
    Folder(folder::FolderArgs),
    /// Asset and version management
    Asset(asset::AssetArgs),
    /// Upload a local file as a new version
    Upload(upload::UploadArgs),
    /// Expire stale upload intents
    Sweep,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let state = connect(&self.env).await?;
        let ctx = RequestContext::new(self.actor.clone());
        match &self.command {
            Commands::Folder(args) => folder::execute(args, &state, &ctx, self.format).await,
            Commands::Asset(args) => asset::execute(args, &state, &ctx, self.format).await,
            Commands::Upload(args) => upload::execute(args, &state, &ctx, self.format).await,
            Commands::Sweep => sweep::execute(&state).await,
        }
    }
}

/// Helper: load configuration and wire services in-process
pub async fn connect(env: &str) -> Result<AppState, AppError> {
    let config = AppConfig::load(env)?;
    assethub_api::bootstrap(config).await
}
