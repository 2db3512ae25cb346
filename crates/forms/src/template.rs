//! Template loading with blank-page fallback

use std::path::{Path, PathBuf};

use pdf_core::{PageSize, PdfDocument};
use tracing::{debug, warn};

use crate::Result;

/// A loaded template document
pub struct LoadedTemplate {
    pub document: PdfDocument,
    /// True when the asset could not be used and a blank page was substituted
    pub fallback: bool,
}

/// Loads template PDFs from a directory
#[derive(Debug, Clone)]
pub struct TemplateLoader {
    template_dir: PathBuf,
}

impl TemplateLoader {
    pub fn new(template_dir: impl Into<PathBuf>) -> Self {
        Self {
            template_dir: template_dir.into(),
        }
    }

    pub fn template_dir(&self) -> &Path {
        &self.template_dir
    }

    /// Load an asset, or a one-page blank A4 document if anything goes wrong
    ///
    /// Never fails. Missing and corrupt assets both fall back.
    pub async fn load(&self, asset: &str) -> LoadedTemplate {
        match self.try_load(asset).await {
            Ok(document) => {
                debug!(asset, pages = document.page_count(), "template loaded");
                LoadedTemplate {
                    document,
                    fallback: false,
                }
            }
            Err(e) => {
                warn!(
                    asset = %self.template_dir.join(asset).display(),
                    error = %e,
                    "template unavailable, using blank page"
                );
                LoadedTemplate {
                    document: PdfDocument::blank(PageSize::A4),
                    fallback: true,
                }
            }
        }
    }

    /// Load an asset, reporting failures
    pub async fn try_load(&self, asset: &str) -> Result<PdfDocument> {
        let bytes = tokio::fs::read(self.template_dir.join(asset)).await?;
        Ok(PdfDocument::open_from_bytes(&bytes)?)
    }
}
