//! Asset and version CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use assethub_api::AppState;
use assethub_core::error::AppError;
use assethub_entity::asset::{Asset, AssetVersion, PublishedAsset};
use assethub_entity::event::AssetEvent;
use assethub_service::RequestContext;
use assethub_service::asset::{MoveAssetRequest, RenameAssetRequest};

use crate::output::{self, OutputFormat};

/// Arguments for asset commands
#[derive(Debug, Args)]
pub struct AssetArgs {
    /// Asset subcommand
    #[command(subcommand)]
    pub command: AssetCommand,
}

/// Asset subcommands
#[derive(Debug, Subcommand)]
pub enum AssetCommand {
    /// List assets directly inside a folder
    List {
        /// Folder path (root when omitted)
        #[arg(short = 'd', long, default_value = "")]
        folder: String,
    },
    /// List published assets directly inside a folder
    Published {
        /// Folder path (root when omitted)
        #[arg(short = 'd', long, default_value = "")]
        folder: String,
    },
    /// Show an asset and its published version
    Show {
        /// Folder path
        folder: String,
        /// Basename
        basename: String,
    },
    /// List every version of an asset
    Versions {
        /// Folder path
        folder: String,
        /// Basename
        basename: String,
    },
    /// Show the event history of an asset
    History {
        /// Folder path
        folder: String,
        /// Basename
        basename: String,
    },
    /// Publish the live draft of an asset
    Publish {
        /// Folder path
        folder: String,
        /// Basename
        basename: String,
    },
    /// Re-publish an earlier version as a new version
    Restore {
        /// Version ID
        version_id: String,
        /// Label for the restored version
        #[arg(short, long)]
        label: Option<String>,
    },
    /// Move an asset to another folder
    Move {
        /// Current folder path
        folder: String,
        /// Basename
        basename: String,
        /// Destination folder path
        to: String,
    },
    /// Rename an asset within its folder
    Rename {
        /// Folder path
        folder: String,
        /// Current basename
        basename: String,
        /// New basename
        new_basename: String,
    },
}

/// Asset display row
#[derive(Debug, Serialize, Tabled)]
struct AssetRow {
    /// Asset ID
    id: String,
    /// Folder
    folder: String,
    /// Basename
    basename: String,
    /// Versions ever created
    versions: i32,
    /// Published version ID
    published: String,
    /// Draft version ID
    draft: String,
    /// Updated at
    updated_at: String,
}

impl From<&Asset> for AssetRow {
    fn from(a: &Asset) -> Self {
        Self {
            id: a.id.to_string(),
            folder: a.folder_path.clone(),
            basename: a.basename.clone(),
            versions: a.version_counter,
            published: output::opt(a.published_version_id),
            draft: output::opt(a.draft_version_id),
            updated_at: output::timestamp(a.updated_at),
        }
    }
}

/// Published asset display row
#[derive(Debug, Serialize, Tabled)]
struct PublishedRow {
    /// Basename
    basename: String,
    /// Version number
    version: i32,
    /// Version ID
    version_id: String,
    /// Label
    label: String,
}

impl From<&PublishedAsset> for PublishedRow {
    fn from(p: &PublishedAsset) -> Self {
        Self {
            basename: p.basename.clone(),
            version: p.version,
            version_id: p.version_id.to_string(),
            label: output::opt(p.label.as_deref()),
        }
    }
}

/// Version display row
#[derive(Debug, Serialize, Tabled)]
struct VersionRow {
    /// Version number
    version: i32,
    /// Version ID
    id: String,
    /// Lifecycle state
    state: String,
    /// Label
    label: String,
    /// Size in bytes
    size: String,
    /// MIME type
    content_type: String,
    /// Created at
    created_at: String,
}

impl From<&AssetVersion> for VersionRow {
    fn from(v: &AssetVersion) -> Self {
        Self {
            version: v.version,
            id: v.id.to_string(),
            state: v.state.to_string(),
            label: output::opt(v.label.as_deref()),
            size: output::opt(v.size),
            content_type: output::opt(v.content_type.as_deref()),
            created_at: output::timestamp(v.created_at),
        }
    }
}

/// Event display row
#[derive(Debug, Serialize, Tabled)]
struct EventRow {
    /// Recorded at
    at: String,
    /// Event type
    event: String,
    /// What changed
    detail: String,
    /// Actor
    actor: String,
}

impl From<&AssetEvent> for EventRow {
    fn from(e: &AssetEvent) -> Self {
        let detail = match (&e.from_folder_path, &e.to_folder_path, &e.from_basename, &e.to_basename) {
            (Some(from), Some(to), _, _) => format!("{from} -> {to}"),
            (_, _, Some(from), Some(to)) => format!("{from} -> {to}"),
            _ => output::opt(e.version_id),
        };
        Self {
            at: output::timestamp(e.created_at),
            event: e.event_type.to_string(),
            detail,
            actor: output::opt(e.created_by.as_deref()),
        }
    }
}

async fn find_asset(state: &AppState, folder: &str, basename: &str) -> Result<Asset, AppError> {
    state
        .asset_service
        .get_asset(folder, basename)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Asset '{basename}' not found in '{folder}'")))
}

/// Execute asset commands
pub async fn execute(
    args: &AssetArgs,
    state: &AppState,
    ctx: &RequestContext,
    format: OutputFormat,
) -> Result<(), AppError> {
    let assets = &state.asset_service;

    match &args.command {
        AssetCommand::List { folder } => {
            let list = assets.list_assets_in_folder(folder).await?;
            let rows: Vec<AssetRow> = list.iter().map(AssetRow::from).collect();
            output::print_list(&rows, format);
        }
        AssetCommand::Published { folder } => {
            let list = assets.list_published_assets_in_folder(folder).await?;
            let rows: Vec<PublishedRow> = list.iter().map(PublishedRow::from).collect();
            output::print_list(&rows, format);
        }
        AssetCommand::Show { folder, basename } => {
            let asset = find_asset(state, folder, basename).await?;
            output::print_item(&asset, format);
            if let Some(published) = assets.get_published_version(asset.id).await? {
                println!();
                output::print_item(&published, format);
            }
        }
        AssetCommand::Versions { folder, basename } => {
            let asset = find_asset(state, folder, basename).await?;
            let versions = assets.get_versions(asset.id).await?;
            let rows: Vec<VersionRow> = versions.iter().map(VersionRow::from).collect();
            output::print_list(&rows, format);
        }
        AssetCommand::History { folder, basename } => {
            let events = state.event_log.history_by_key(folder, basename).await?;
            let rows: Vec<EventRow> = events.iter().map(EventRow::from).collect();
            output::print_list(&rows, format);
        }
        AssetCommand::Publish { folder, basename } => {
            let version = assets.publish_draft(ctx, folder, basename).await?;
            output::print_success(&format!(
                "Published version {} of '{basename}' ({})",
                version.version, version.id
            ));
        }
        AssetCommand::Restore { version_id, label } => {
            let id = Uuid::parse_str(version_id)
                .map_err(|e| AppError::validation(format!("Invalid version ID: {e}")))?;
            let version = assets.restore_version(ctx, id, label.clone()).await?;
            output::print_success(&format!(
                "Restored as version {} ({})",
                version.version, version.id
            ));
        }
        AssetCommand::Move {
            folder,
            basename,
            to,
        } => {
            let asset = assets
                .move_asset(
                    ctx,
                    MoveAssetRequest {
                        from_folder_path: folder.clone(),
                        basename: basename.clone(),
                        to_folder_path: to.clone(),
                    },
                )
                .await?;
            output::print_success(&format!(
                "Moved '{}' to '{}'",
                asset.basename, asset.folder_path
            ));
        }
        AssetCommand::Rename {
            folder,
            basename,
            new_basename,
        } => {
            let asset = assets
                .rename_asset(
                    ctx,
                    RenameAssetRequest {
                        folder_path: folder.clone(),
                        basename: basename.clone(),
                        new_basename: new_basename.clone(),
                    },
                )
                .await?;
            output::print_success(&format!("Renamed '{basename}' to '{}'", asset.basename));
        }
    }

    Ok(())
}
