//! End-to-end form rendering and upload

use std::fmt;

use form_storage::{DocumentFinalizer, ObjectStore, UploadResult};
use pdf_core::PdfDocument;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::fields::FieldRenderer;
use crate::flow::TextFlow;
use crate::parser::{field_binding, parse_layout, resolve_binding, value_to_string};
use crate::schema::{FormLayout, FormType, OverflowMode};
use crate::signature::SignatureEmbedder;
use crate::template::TemplateLoader;
use crate::{FormError, Result};

/// Pipeline stage a failure is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    TemplateLoad,
    Render,
    Serialize,
    Upload,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::TemplateLoad => "template-load",
            Stage::Render => "render",
            Stage::Serialize => "serialize",
            Stage::Upload => "upload",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed submission, tagged with the stage that failed
#[derive(Debug, Error)]
#[error("{stage} failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: FormError,
}

impl PipelineError {
    pub fn new(stage: Stage, source: impl Into<FormError>) -> Self {
        Self {
            stage,
            source: source.into(),
        }
    }
}

/// Extension for tagging errors with a stage
trait StageExt<T> {
    fn stage(self, stage: Stage) -> std::result::Result<T, PipelineError>;
}

impl<T, E: Into<FormError>> StageExt<T> for std::result::Result<T, E> {
    fn stage(self, stage: Stage) -> std::result::Result<T, PipelineError> {
        self.map_err(|e| PipelineError::new(stage, e))
    }
}

/// What rendering produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderReport {
    pub pages: usize,
    pub fields_drawn: usize,
    pub table_rows: usize,
    pub notes_lines: usize,
    pub embedded_signatures: usize,
    pub skipped_signatures: usize,
    /// The template asset was unusable and a blank page was used
    pub template_fallback: bool,
}

/// A rendered, not yet serialized form
pub struct RenderedForm {
    pub document: PdfDocument,
    pub report: RenderReport,
    pub ticket_id: Option<String>,
}

/// A completed submission
#[derive(Debug, Clone)]
pub struct Submission {
    pub upload: UploadResult,
    pub report: RenderReport,
}

/// Render form data onto a layout's document
///
/// Draws fields, then tables, then notes, then signatures. Signature
/// failures are counted, not raised.
pub fn render_layout(
    layout: &FormLayout,
    doc: &mut PdfDocument,
    data: &Value,
    table_overflow: Option<OverflowMode>,
) -> Result<RenderReport> {
    let renderer = FieldRenderer::new(layout).with_overflow(table_overflow);
    let fields_drawn = renderer.render_fields(doc, data)?;
    let slots = renderer.render_tables(doc, data)?;

    let mut report = RenderReport {
        fields_drawn,
        table_rows: slots.values().map(Vec::len).sum(),
        ..RenderReport::default()
    };

    if let Some(notes) = &layout.notes {
        let text = resolve_binding(&field_binding(&notes.field, None), data)
            .map(value_to_string)
            .unwrap_or_default();
        if !text.trim().is_empty() {
            report.notes_lines = TextFlow::new(notes).render(doc, 1, &text)?.lines;
        }
    }

    if let Some(embedder) = SignatureEmbedder::from_form(layout) {
        let outcome = embedder.embed_all(doc, data, &slots);
        report.embedded_signatures = outcome.embedded;
        report.skipped_signatures = outcome.skipped;
    }

    report.pages = doc.page_count();
    Ok(report)
}

/// Work Ticket ID for a submission, if present
pub fn ticket_id(layout: &FormLayout, data: &Value) -> Option<String> {
    resolve_binding(&layout.ticket_field, data)
        .map(value_to_string)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Renders form data into a PDF and uploads it
///
/// Each call builds its own document; concurrent submissions share only
/// the store.
///
/// # Example
/// ```ignore
/// let pipeline = FormPipeline::new(PipelineConfig::from_env()?, MemoryStore::new());
/// let submission = pipeline.submit(FormType::Invoice, &data).await?;
/// println!("{}", submission.upload.uri);
/// ```
pub struct FormPipeline<S> {
    config: PipelineConfig,
    loader: TemplateLoader,
    finalizer: DocumentFinalizer<S>,
}

impl<S: ObjectStore> FormPipeline<S> {
    pub fn new(config: PipelineConfig, store: S) -> Self {
        let loader = TemplateLoader::new(config.template_dir.clone());
        let finalizer = DocumentFinalizer::new(store, config.bucket.clone())
            .with_staging_dir(config.staging_dir.clone())
            .with_keep_staged(config.keep_staged);
        Self {
            config,
            loader,
            finalizer,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        self.finalizer.store()
    }

    /// Layout for a form type: an override file if present, else the built-in one
    pub async fn layout(&self, form_type: FormType) -> std::result::Result<FormLayout, PipelineError> {
        let Some(dir) = &self.config.layout_dir else {
            return FormLayout::embedded(form_type).stage(Stage::TemplateLoad);
        };

        let path = dir.join(format!("{}.json", form_type.prefix()));
        let json = match tokio::fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return FormLayout::embedded(form_type).stage(Stage::TemplateLoad);
            }
            Err(e) => return Err(PipelineError::new(Stage::TemplateLoad, e)),
        };

        debug!(path = %path.display(), "using layout override");
        let layout = parse_layout(&json).stage(Stage::TemplateLoad)?;
        if layout.form_type != form_type {
            return Err(PipelineError::new(
                Stage::TemplateLoad,
                FormError::LayoutError(format!(
                    "{} declares form type {}, expected {form_type}",
                    path.display(),
                    layout.form_type
                )),
            ));
        }
        Ok(layout)
    }

    /// Load the template and render `data` onto it
    pub async fn render(
        &self,
        form_type: FormType,
        data: &Value,
    ) -> std::result::Result<RenderedForm, PipelineError> {
        let layout = self.layout(form_type).await?;
        let loaded = self.loader.load(&layout.template_asset).await;
        let mut document = loaded.document;

        let mut report = render_layout(&layout, &mut document, data, self.config.table_overflow)
            .stage(Stage::Render)?;
        report.template_fallback = loaded.fallback;

        info!(
            form = %form_type,
            pages = report.pages,
            signatures = report.embedded_signatures,
            skipped_signatures = report.skipped_signatures,
            "form rendered"
        );

        Ok(RenderedForm {
            document,
            report,
            ticket_id: ticket_id(&layout, data),
        })
    }

    /// Render, serialize and upload; returns where the document landed
    ///
    /// Upload failures are not retried.
    pub async fn submit(
        &self,
        form_type: FormType,
        data: &Value,
    ) -> std::result::Result<Submission, PipelineError> {
        let RenderedForm {
            document,
            report,
            ticket_id,
        } = self.render(form_type, data).await?;

        let bytes = document.to_bytes().stage(Stage::Serialize)?;
        drop(document);

        let upload = self
            .finalizer
            .finalize(form_type.prefix(), ticket_id.as_deref(), bytes)
            .await
            .stage(Stage::Upload)?;

        Ok(Submission { upload, report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::TemplateLoad.to_string(), "template-load");
        assert_eq!(Stage::Upload.to_string(), "upload");

        let err = PipelineError::new(Stage::Upload, FormError::LayoutError("boom".into()));
        assert!(err.to_string().starts_with("upload failed"));
    }

    #[test]
    fn test_ticket_id() {
        let layout = FormLayout::embedded(FormType::Invoice).unwrap();
        assert_eq!(
            ticket_id(&layout, &json!({ "workTicketID": "WT-42" })),
            Some("WT-42".to_string())
        );
        assert_eq!(ticket_id(&layout, &json!({ "workTicketID": 42 })), Some("42".to_string()));
        assert_eq!(ticket_id(&layout, &json!({ "workTicketID": "" })), None);
        assert_eq!(ticket_id(&layout, &json!({})), None);
    }

    #[tokio::test]
    async fn test_layout_override() {
        let dir = tempfile::tempdir().unwrap();
        let mut custom = FormLayout::embedded(FormType::Jsa).unwrap();
        custom.template_asset = "jsa-v2.pdf".to_string();
        std::fs::write(
            dir.path().join("jsa.json"),
            serde_json::to_string(&custom).unwrap(),
        )
        .unwrap();

        let config = PipelineConfig {
            layout_dir: Some(dir.path().to_path_buf()),
            ..PipelineConfig::default()
        };
        let pipeline = FormPipeline::new(config, form_storage::MemoryStore::new());

        assert_eq!(
            pipeline.layout(FormType::Jsa).await.unwrap().template_asset,
            "jsa-v2.pdf"
        );
        // No override file for invoices
        assert_eq!(
            pipeline.layout(FormType::Invoice).await.unwrap(),
            FormLayout::embedded(FormType::Invoice).unwrap()
        );
    }

    #[tokio::test]
    async fn test_layout_override_wrong_type() {
        let dir = tempfile::tempdir().unwrap();
        let invoice = FormLayout::embedded(FormType::Invoice).unwrap();
        std::fs::write(
            dir.path().join("jsa.json"),
            serde_json::to_string(&invoice).unwrap(),
        )
        .unwrap();

        let config = PipelineConfig {
            layout_dir: Some(dir.path().to_path_buf()),
            ..PipelineConfig::default()
        };
        let err = FormPipeline::new(config, form_storage::MemoryStore::new())
            .layout(FormType::Jsa)
            .await
            .unwrap_err();
        assert_eq!(err.stage, Stage::TemplateLoad);
    }
}
