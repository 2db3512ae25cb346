//! Document finalizer: stage locally, then upload.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{Result, StorageError};
use crate::keys::object_key_now;
use crate::store::ObjectStore;

/// Content type of every finalized document.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Everything needed for one upload. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadDescriptor {
    bucket: String,
    key: String,
    content_type: String,
    bytes: Vec<u8>,
}

impl UploadDescriptor {
    /// Descriptor for a PDF with a freshly generated key.
    pub fn new(bucket: &str, prefix: &str, ticket_id: Option<&str>, bytes: Vec<u8>) -> Self {
        Self::with_key(bucket, object_key_now(prefix, ticket_id), bytes)
    }

    /// Descriptor for a PDF with an explicit key.
    pub fn with_key(bucket: &str, key: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            bucket: bucket.to_string(),
            key: key.into(),
            content_type: PDF_CONTENT_TYPE.to_string(),
            bytes,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Where a document ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    /// `{scheme}://{bucket}/{key}`
    pub uri: String,
    pub key: String,
    /// Local copy, present only when staged files are kept.
    pub staged_path: Option<PathBuf>,
}

/// Serializes nothing itself; takes finished bytes, stages them to a local
/// file and uploads that file through an [`ObjectStore`].
///
/// Upload failures are returned as-is. There are no retries. The staged file
/// of a failed upload is left in the staging directory and nothing removes it
/// later; callers that retry often should clear that directory themselves.
#[derive(Debug, Clone)]
pub struct DocumentFinalizer<S> {
    store: S,
    bucket: String,
    staging_dir: PathBuf,
    keep_staged: bool,
}

impl<S: ObjectStore> DocumentFinalizer<S> {
    pub fn new(store: S, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            staging_dir: std::env::temp_dir(),
            keep_staged: false,
        }
    }

    pub fn with_staging_dir(mut self, staging_dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = staging_dir.into();
        self
    }

    /// Keep the staged file after a successful upload.
    pub fn with_keep_staged(mut self, keep_staged: bool) -> Self {
        self.keep_staged = keep_staged;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Build a descriptor for `bytes` and upload it.
    pub async fn finalize(
        &self,
        prefix: &str,
        ticket_id: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<UploadResult> {
        let descriptor = UploadDescriptor::new(&self.bucket, prefix, ticket_id, bytes);
        self.upload(&descriptor).await
    }

    /// Stage and upload a prepared descriptor.
    pub async fn upload(&self, descriptor: &UploadDescriptor) -> Result<UploadResult> {
        let staged = self.stage(descriptor).await?;
        let body = tokio::fs::read(&staged)
            .await
            .map_err(|source| StorageError::Staging {
                path: staged.clone(),
                source,
            })?;

        info!(
            bucket = descriptor.bucket(),
            key = descriptor.key(),
            bytes = body.len(),
            "uploading form document"
        );

        if let Err(e) = self
            .store
            .put_object(
                descriptor.bucket(),
                descriptor.key(),
                body,
                descriptor.content_type(),
            )
            .await
        {
            warn!(
                staged = %staged.display(),
                error = %e,
                "upload failed, staged document kept"
            );
            return Err(e);
        }

        let staged_path = if self.keep_staged {
            Some(staged)
        } else {
            remove_staged(&staged).await;
            None
        };

        let uri = format!(
            "{}://{}/{}",
            self.store.scheme(),
            descriptor.bucket(),
            descriptor.key()
        );
        info!(%uri, "form document uploaded");

        Ok(UploadResult {
            uri,
            key: descriptor.key().to_string(),
            staged_path,
        })
    }

    /// Write the document to a staging file of its own.
    ///
    /// File names start with the key but carry a random suffix, so
    /// concurrent uploads never share a staging file.
    async fn stage(&self, descriptor: &UploadDescriptor) -> Result<PathBuf> {
        let staging_err =
            |path: PathBuf| move |source: std::io::Error| StorageError::Staging { path, source };

        tokio::fs::create_dir_all(&self.staging_dir)
            .await
            .map_err(staging_err(self.staging_dir.clone()))?;

        let key = descriptor.key();
        let stem = key.strip_suffix(".pdf").unwrap_or(key);
        let path = tempfile::Builder::new()
            .prefix(&format!("{stem}-"))
            .suffix(".pdf")
            .tempfile_in(&self.staging_dir)
            .and_then(|file| file.into_temp_path().keep().map_err(|e| e.error))
            .map_err(staging_err(self.staging_dir.clone()))?;

        tokio::fs::write(&path, descriptor.bytes())
            .await
            .map_err(staging_err(path.clone()))?;
        Ok(path)
    }
}

async fn remove_staged(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!(staged = %path.display(), error = %e, "failed to remove staged document");
    }
}
