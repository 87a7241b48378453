//! Expires upload intents whose TTL has passed.

use std::time::Instant;

use tracing::info;

use assethub_core::result::AppResult;
use assethub_service::UploadService;

/// Marks every past-due `created` intent as `expired`.
#[derive(Debug, Clone)]
pub struct IntentSweepJob {
    uploads: UploadService,
}

impl IntentSweepJob {
    /// Create a new sweep job.
    pub fn new(uploads: UploadService) -> Self {
        Self { uploads }
    }

    /// Run one sweep and return the number of intents expired.
    pub async fn run(&self) -> AppResult<u64> {
        let started = Instant::now();
        let expired = self.uploads.sweep_expired().await?;
        info!(
            expired,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Intent sweep finished"
        );
        Ok(expired)
    }
}
