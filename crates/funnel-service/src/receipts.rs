//! Local storage for uploaded payment receipts

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use funnel_common::{AppError, AppResult};
use funnel_core::{PaymentId, UserId};
use tracing::{debug, instrument, warn};

/// Writes receipt images under a root directory
#[derive(Debug, Clone)]
pub struct ReceiptStore {
    root: PathBuf,
}

impl ReceiptStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `receipt_<user>_<payment>_<YYYYmmdd_HHMMSS>.jpg`
    pub fn file_name(user_id: UserId, payment_id: PaymentId, at: DateTime<Utc>) -> String {
        format!(
            "receipt_{user_id}_{payment_id}_{}.jpg",
            at.format("%Y%m%d_%H%M%S")
        )
    }

    /// Persist the bytes and return the stored path
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn save(
        &self,
        user_id: UserId,
        payment_id: PaymentId,
        bytes: &[u8],
        at: DateTime<Utc>,
    ) -> AppResult<String> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| AppError::Storage(format!("{}: {e}", self.root.display())))?;

        let path = self.root.join(Self::file_name(user_id, payment_id, at));
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::Storage(format!("{}: {e}", path.display())))?;

        debug!(path = %path.display(), "Receipt stored");
        Ok(path.to_string_lossy().into_owned())
    }

    /// Remove a receipt whose payment row was never written
    pub async fn discard(&self, path: &str) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!(path, error = %e, "Failed to remove orphaned receipt");
        }
    }
}
