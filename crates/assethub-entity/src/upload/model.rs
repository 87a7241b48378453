//! Upload intent: a short-lived reservation for an incoming version.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Physical upload mechanism behind an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "upload_backend", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UploadBackend {
    /// Bytes are POSTed to this service's own blob store.
    Inline,
    /// Bytes are PUT to an S3-compatible bucket through a pre-signed URL.
    External,
}

impl UploadBackend {
    /// Return the backend as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::External => "external",
        }
    }

    /// HTTP method the client uses for the byte transfer.
    pub fn upload_method(&self) -> &'static str {
        match self {
            Self::Inline => "POST",
            Self::External => "PUT",
        }
    }
}

impl fmt::Display for UploadBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UploadBackend {
    type Err = assethub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "inline" => Ok(Self::Inline),
            "external" | "s3" => Ok(Self::External),
            _ => Err(assethub_core::AppError::validation(format!(
                "Invalid storage backend: '{s}'. Expected one of: inline, external"
            ))),
        }
    }
}

/// Lifecycle status of an upload intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "intent_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum IntentStatus {
    /// Open for byte transfer and finalization.
    Created,
    /// A version was created from this intent.
    Finalized,
    /// TTL passed without finalization.
    Expired,
}

impl IntentStatus {
    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Finalized => "finalized",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for IntentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A capability to upload one version of `(folder_path, basename)`.
///
/// Never holds bytes itself.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UploadIntent {
    /// Unique intent identifier.
    pub id: Uuid,
    /// Target folder.
    pub folder_path: String,
    /// Target basename.
    pub basename: String,
    /// Client-side file name.
    pub filename: Option<String>,
    /// Upload mechanism chosen when the intent was created.
    pub backend: UploadBackend,
    /// Pre-allocated object key (external) or the pushed blob id (inline).
    pub backend_key: Option<String>,
    /// Lifecycle status.
    pub status: IntentStatus,
    /// Publish the resulting version immediately.
    pub publish: bool,
    /// Label for the resulting version.
    pub label: Option<String>,
    /// Metadata for the resulting version.
    pub extra: Option<serde_json::Value>,
    /// When the intent was created.
    pub created_at: DateTime<Utc>,
    /// When the intent stops being usable.
    pub expires_at: DateTime<Utc>,
    /// When the intent was finalized.
    pub finalized_at: Option<DateTime<Utc>>,
    /// Actor that created the intent.
    pub created_by: Option<String>,
}

impl UploadIntent {
    /// Whether the intent's TTL has passed at `now`.
    pub fn is_past_due(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Whether the intent can still be finalized at `now`.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.status == IntentStatus::Created && !self.is_past_due(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn intent(expires_in: Duration) -> UploadIntent {
        let now = Utc::now();
        UploadIntent {
            id: Uuid::new_v4(),
            folder_path: "covers".into(),
            basename: "a.png".into(),
            filename: None,
            backend: UploadBackend::Inline,
            backend_key: None,
            status: IntentStatus::Created,
            publish: false,
            label: None,
            extra: None,
            created_at: now,
            expires_at: now + expires_in,
            finalized_at: None,
            created_by: None,
        }
    }

    #[test]
    fn test_open_until_expiry() {
        let now = Utc::now();
        assert!(intent(Duration::hours(1)).is_open(now));
        assert!(!intent(Duration::seconds(-1)).is_open(now));
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!("INLINE".parse::<UploadBackend>().unwrap(), UploadBackend::Inline);
        assert_eq!("s3".parse::<UploadBackend>().unwrap(), UploadBackend::External);
        assert!("ftp".parse::<UploadBackend>().is_err());
        assert_eq!(UploadBackend::External.upload_method(), "PUT");
    }
}
