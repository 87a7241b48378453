//! Folder management CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use assethub_api::AppState;
use assethub_core::error::AppError;
use assethub_entity::folder::Folder;
use assethub_service::RequestContext;
use assethub_service::folder::{
    CreateFolderByNameRequest, CreateFolderRequest, UpdateFolderRequest,
};

use crate::output::{self, OutputFormat};

/// Arguments for folder commands
#[derive(Debug, Args)]
pub struct FolderArgs {
    /// Folder subcommand
    #[command(subcommand)]
    pub command: FolderCommand,
}

/// Folder subcommands
#[derive(Debug, Subcommand)]
pub enum FolderCommand {
    /// List direct children of a folder
    List {
        /// Parent path (root when omitted)
        #[arg(short, long)]
        parent: Option<String>,
    },
    /// Show a folder
    Get {
        /// Folder path
        path: String,
    },
    /// Create a folder at an explicit path
    Create {
        /// Folder path
        path: String,
        /// Label (defaults to the last path segment)
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Create a folder from a label, picking a free slug
    CreateByName {
        /// Label
        name: String,
        /// Parent path (root when omitted)
        #[arg(short, long, default_value = "")]
        parent: String,
    },
    /// Relabel and/or move a folder
    Update {
        /// Current path
        path: String,
        /// New label
        #[arg(short, long)]
        name: Option<String>,
        /// New path
        #[arg(long)]
        to: Option<String>,
    },
}

/// Folder display row
#[derive(Debug, Serialize, Tabled)]
struct FolderRow {
    /// Path
    path: String,
    /// Label
    name: String,
    /// Depth
    depth: i32,
    /// Created at
    created_at: String,
    /// Created by
    created_by: String,
}

impl From<&Folder> for FolderRow {
    fn from(f: &Folder) -> Self {
        Self {
            path: if f.path.is_empty() {
                "/".to_string()
            } else {
                f.path.clone()
            },
            name: f.name.clone(),
            depth: f.depth,
            created_at: output::timestamp(f.created_at),
            created_by: output::opt(f.created_by.as_deref()),
        }
    }
}

/// Execute folder commands
pub async fn execute(
    args: &FolderArgs,
    state: &AppState,
    ctx: &RequestContext,
    format: OutputFormat,
) -> Result<(), AppError> {
    let folders = &state.folder_service;

    match &args.command {
        FolderCommand::List { parent } => {
            let children = folders.list_children(parent.as_deref()).await?;
            let rows: Vec<FolderRow> = children.iter().map(FolderRow::from).collect();
            output::print_list(&rows, format);
        }
        FolderCommand::Get { path } => {
            let folder = folders
                .get(path)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Folder '{path}' not found")))?;
            output::print_item(&folder, format);
        }
        FolderCommand::Create { path, name } => {
            let folder = folders
                .create_by_path(
                    ctx,
                    CreateFolderRequest {
                        path: path.clone(),
                        name: name.clone(),
                        extra: None,
                    },
                )
                .await?;
            output::print_success(&format!("Folder '{}' created", folder.path));
        }
        FolderCommand::CreateByName { name, parent } => {
            let folder = folders
                .create_by_name(
                    ctx,
                    CreateFolderByNameRequest {
                        parent_path: parent.clone(),
                        name: name.clone(),
                        extra: None,
                    },
                )
                .await?;
            output::print_success(&format!("Folder '{}' created at '{}'", folder.name, folder.path));
        }
        FolderCommand::Update { path, name, to } => {
            let folder = folders
                .update(
                    ctx,
                    UpdateFolderRequest {
                        path: path.clone(),
                        name: name.clone(),
                        new_path: to.clone(),
                    },
                )
                .await?;
            output::print_item(&folder, format);
        }
    }

    Ok(())
}
