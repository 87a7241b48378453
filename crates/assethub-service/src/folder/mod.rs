//! Folder directory service.

pub mod service;

pub use service::{
    CreateFolderByNameRequest, CreateFolderRequest, FolderService, UpdateFolderRequest,
};
