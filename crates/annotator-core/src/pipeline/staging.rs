//! Temporary on-disk copies of uploaded images.
//!
//! Each staged file gets a random name, so concurrent requests and items
//! within one request never collide. The file is removed by
//! [`StagedFile::release`]; if a staged file is dropped without release
//! (early return, panic, cancelled request) the temp path guard removes it.

use crate::error::{ItemError, ItemResult};
use crate::types::ImageItem;
use std::path::Path;
use tempfile::NamedTempFile;

const STAGING_PREFIX: &str = "annotator-";

/// A uniquely named staging file holding one image's bytes.
#[derive(Debug)]
pub struct StagedFile {
    file: NamedTempFile,
}

impl StagedFile {
    /// Write the item's bytes to a fresh file in `dir`.
    ///
    /// The original extension is kept so the file stays recognizable.
    pub async fn create(dir: &Path, item: &ImageItem) -> ItemResult<Self> {
        let suffix = item
            .extension()
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();

        let file = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .suffix(&suffix)
            .tempfile_in(dir)
            .map_err(ItemError::Staging)?;

        tokio::fs::write(file.path(), &item.bytes)
            .await
            .map_err(ItemError::Staging)?;

        tracing::debug!(
            "Staged {} ({} bytes) at {:?}",
            item.filename,
            item.bytes.len(),
            file.path()
        );
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Remove the staging file.
    pub async fn release(self) -> ItemResult<()> {
        let temp_path = self.file.into_temp_path();
        match tokio::task::spawn_blocking(move || temp_path.close()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ItemError::ResourceCleanupFailed(e)),
            Err(e) => Err(ItemError::ResourceCleanupFailed(std::io::Error::other(e))),
        }
    }
}
