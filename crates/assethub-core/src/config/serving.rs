//! Public read path configuration.

use serde::{Deserialize, Serialize};

/// Serving gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServingConfig {
    /// Mount point of the public read routes (`{base_path}/v/{version_id}`).
    #[serde(default = "default_base_path")]
    pub base_path: String,
    /// Largest size, inclusive, served as an inline blob instead of a redirect.
    #[serde(default = "default_threshold")]
    pub small_file_threshold_bytes: u64,
    /// Lifetime of signed download URLs minted for redirects.
    #[serde(default = "default_download_ttl")]
    pub download_url_ttl_seconds: u64,
}

impl ServingConfig {
    /// Base path with a leading slash and no trailing slash.
    pub fn normalized_base_path(&self) -> String {
        let trimmed = self.base_path.trim().trim_matches('/');
        format!("/{trimmed}")
    }
}

impl Default for ServingConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            small_file_threshold_bytes: default_threshold(),
            download_url_ttl_seconds: default_download_ttl(),
        }
    }
}

fn default_base_path() -> String {
    "/files".to_string()
}

fn default_threshold() -> u64 {
    20 * 1024 * 1024 // 20 MiB
}

fn default_download_ttl() -> u64 {
    300
}
