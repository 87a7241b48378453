//! Storage backend and upload configuration.

use serde::{Deserialize, Serialize};

/// Top-level storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Upload backend seeded into the settings record when none is stored:
    /// `"inline"` or `"external"`.
    #[serde(default = "default_backend")]
    pub default_backend: String,
    /// Inline blob provider: `"local"` or `"memory"`.
    #[serde(default = "default_inline_provider")]
    pub inline_provider: String,
    /// Local filesystem storage for inline blobs.
    #[serde(default)]
    pub local: LocalStorageConfig,
    /// S3-compatible object storage for the external backend.
    #[serde(default)]
    pub s3: S3StorageConfig,
    /// Upload intent settings.
    #[serde(default)]
    pub upload: UploadConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            default_backend: default_backend(),
            inline_provider: default_inline_provider(),
            local: LocalStorageConfig::default(),
            s3: S3StorageConfig::default(),
            upload: UploadConfig::default(),
        }
    }
}

/// Local filesystem storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalStorageConfig {
    /// Root path for inline blob storage.
    #[serde(default = "default_local_root")]
    pub root_path: String,
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            root_path: default_local_root(),
        }
    }
}

/// S3-compatible object storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3StorageConfig {
    /// Whether the external backend is available.
    #[serde(default)]
    pub enabled: bool,
    /// S3 endpoint URL (for non-AWS services like MinIO).
    #[serde(default)]
    pub endpoint: String,
    /// AWS region.
    #[serde(default = "default_region")]
    pub region: String,
    /// S3 bucket name.
    #[serde(default)]
    pub bucket: String,
    /// Access key ID.
    #[serde(default)]
    pub access_key: String,
    /// Secret access key.
    #[serde(default)]
    pub secret_key: String,
    /// Prefix prepended to every pre-allocated object key.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Use path-style addressing (required by most S3-compatible servers).
    #[serde(default = "default_true")]
    pub force_path_style: bool,
}

impl Default for S3StorageConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: String::new(),
            region: default_region(),
            bucket: String::new(),
            access_key: String::new(),
            secret_key: String::new(),
            key_prefix: default_key_prefix(),
            force_path_style: true,
        }
    }
}

/// Upload intent configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Time-to-live of a freshly created upload intent.
    #[serde(default = "default_intent_ttl")]
    pub intent_ttl_seconds: i64,
    /// Lifetime of pre-signed PUT URLs for the external backend.
    #[serde(default = "default_presign_ttl")]
    pub presign_ttl_seconds: u64,
    /// Largest body accepted by the inline blob endpoint.
    #[serde(default = "default_max_inline")]
    pub max_inline_upload_bytes: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            intent_ttl_seconds: default_intent_ttl(),
            presign_ttl_seconds: default_presign_ttl(),
            max_inline_upload_bytes: default_max_inline(),
        }
    }
}

fn default_backend() -> String {
    "inline".to_string()
}

fn default_inline_provider() -> String {
    "local".to_string()
}

fn default_local_root() -> String {
    "./data/blobs".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_key_prefix() -> String {
    "assets/".to_string()
}

fn default_true() -> bool {
    true
}

fn default_intent_ttl() -> i64 {
    3600
}

fn default_presign_ttl() -> u64 {
    3600
}

fn default_max_inline() -> u64 {
    100 * 1024 * 1024 // 100 MiB
}
