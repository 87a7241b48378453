//! Folder directory operations.

use std::sync::Arc;

use tracing::{debug, info};

use assethub_core::error::{AppError, ErrorKind};
use assethub_core::result::AppResult;
use assethub_database::AssetStore;
use assethub_entity::folder::path::{join_path, normalize_path, slugify};
use assethub_entity::folder::{Folder, FolderUpdate};

use crate::context::RequestContext;

/// Upper bound on slug suffixes tried by [`FolderService::create_by_name`].
const MAX_SLUG_ATTEMPTS: u32 = 10_000;

/// Manages the folder namespace.
#[derive(Debug, Clone)]
pub struct FolderService {
    store: Arc<dyn AssetStore>,
}

/// Request to create a folder at an explicit path.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CreateFolderRequest {
    /// Folder path; normalized before use.
    pub path: String,
    /// Label; defaults to the last path segment.
    #[serde(default)]
    pub name: Option<String>,
    /// Opaque caller metadata.
    #[serde(default)]
    pub extra: Option<serde_json::Value>,
}

/// Request to create a folder from a human label.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CreateFolderByNameRequest {
    /// Parent folder path.
    #[serde(default)]
    pub parent_path: String,
    /// Label the slug is derived from.
    pub name: String,
    /// Opaque caller metadata.
    #[serde(default)]
    pub extra: Option<serde_json::Value>,
}

/// Request to relabel and/or move a folder.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct UpdateFolderRequest {
    /// Current folder path.
    pub path: String,
    /// New label.
    #[serde(default)]
    pub name: Option<String>,
    /// New path.
    #[serde(default)]
    pub new_path: Option<String>,
}

impl FolderService {
    /// Creates a new folder service.
    pub fn new(store: Arc<dyn AssetStore>) -> Self {
        Self { store }
    }

    /// Create the root folder if it does not exist yet.
    pub async fn ensure_root(&self, ctx: &RequestContext) -> AppResult<Folder> {
        if let Some(root) = self.store.find_folder("").await? {
            return Ok(root);
        }
        let root = Folder::new(String::new(), Some(String::new()), None, ctx.actor(), ctx.request_time);
        match self.store.insert_folder(&root).await {
            Ok(root) => {
                info!("Created root folder");
                Ok(root)
            }
            Err(e) if e.kind == ErrorKind::AlreadyExists => self
                .store
                .find_folder("")
                .await?
                .ok_or_else(|| AppError::internal("Root folder vanished after creation")),
            Err(e) => Err(e),
        }
    }

    /// Create a folder at an explicit path.
    pub async fn create_by_path(
        &self,
        ctx: &RequestContext,
        req: CreateFolderRequest,
    ) -> AppResult<Folder> {
        let path = normalize_path(&req.path)?;
        if path.is_empty() {
            return Err(AppError::validation("Folder path cannot be empty"));
        }
        let folder = Folder::new(path, req.name, req.extra, ctx.actor(), ctx.request_time);
        let folder = self.store.insert_folder(&folder).await?;
        info!(path = %folder.path, actor = ?ctx.actor(), "Folder created");
        Ok(folder)
    }

    /// Create a folder under `parent_path` whose last segment is the slug of
    /// `name`, suffixing `-2`, `-3`, ... until the path is free.
    pub async fn create_by_name(
        &self,
        ctx: &RequestContext,
        req: CreateFolderByNameRequest,
    ) -> AppResult<Folder> {
        let label = req.name.trim();
        if label.is_empty() {
            return Err(AppError::validation("Folder name cannot be empty"));
        }
        let parent = normalize_path(&req.parent_path)?;
        let slug = slugify(label);

        for attempt in 1..=MAX_SLUG_ATTEMPTS {
            let segment = if attempt == 1 {
                slug.clone()
            } else {
                format!("{slug}-{attempt}")
            };
            let path = join_path(&parent, &segment);
            if self.store.find_folder(&path).await?.is_some() {
                continue;
            }
            let folder = Folder::new(
                path,
                Some(label.to_string()),
                req.extra.clone(),
                ctx.actor(),
                ctx.request_time,
            );
            match self.store.insert_folder(&folder).await {
                Ok(folder) => {
                    info!(path = %folder.path, name = %folder.name, "Folder created by name");
                    return Ok(folder);
                }
                // Lost a race for this slug; try the next suffix.
                Err(e) if e.kind == ErrorKind::AlreadyExists => {
                    debug!(path = %folder.path, "Slug taken concurrently");
                }
                Err(e) => return Err(e),
            }
        }
        Err(AppError::conflict(format!(
            "No free slug for '{label}' under '{parent}'"
        )))
    }

    /// Relabel and/or move a folder.
    pub async fn update(&self, ctx: &RequestContext, req: UpdateFolderRequest) -> AppResult<Folder> {
        let path = normalize_path(&req.path)?;
        if path.is_empty() {
            return Err(AppError::validation("The root folder cannot be updated"));
        }
        let name = match req.name {
            Some(name) if name.trim().is_empty() => {
                return Err(AppError::validation("Folder name cannot be empty"));
            }
            other => other,
        };
        let new_path = match req.new_path {
            Some(p) => {
                let p = normalize_path(&p)?;
                if p.is_empty() {
                    return Err(AppError::validation("A folder cannot be moved to the root path"));
                }
                Some(p)
            }
            None => None,
        };

        let update = FolderUpdate {
            name,
            new_path,
            actor: ctx.actor.clone(),
            at: ctx.request_time,
        };
        self.store.update_folder(&path, &update).await
    }

    /// Get a folder by path.
    pub async fn get(&self, path: &str) -> AppResult<Option<Folder>> {
        let path = normalize_path(path)?;
        self.store.find_folder(&path).await
    }

    /// Direct children of a folder (root when `parent_path` is `None`).
    pub async fn list_children(&self, parent_path: Option<&str>) -> AppResult<Vec<Folder>> {
        let parent = normalize_path(parent_path.unwrap_or_default())?;
        self.store.list_child_folders(&parent).await
    }
}
