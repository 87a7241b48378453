//! Folder domain entities.

pub mod model;
pub mod path;

pub use model::{Folder, FolderUpdate};
pub use path::{join_path, last_segment, normalize_path, parent_path, path_depth, slugify};
