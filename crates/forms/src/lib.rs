//! Forms - template-driven PDF rendering for field-service forms
//!
//! This crate provides:
//! - Declarative layouts for Invoice and Job Safety Analysis forms
//! - Template loading with a blank-page fallback
//! - Field, repeating-row and wrapped free-text rendering
//! - Signature decoding and placement
//! - The end-to-end pipeline that renders, stages and uploads a form
//!
//! # Example
//!
//! ```ignore
//! use form_storage::MemoryStore;
//! use forms::{FormPipeline, FormType, PipelineConfig};
//!
//! let pipeline = FormPipeline::new(PipelineConfig::default(), MemoryStore::new());
//! let data: serde_json::Value = serde_json::from_str(invoice_json)?;
//! let submission = pipeline.submit(FormType::Invoice, &data).await?;
//! ```

pub mod config;
pub mod fields;
pub mod flow;
pub mod parser;
pub mod pipeline;
mod schema;
pub mod signature;
pub mod template;

pub use config::PipelineConfig;
pub use fields::{FieldRenderer, RowSlot, RowSlots};
pub use flow::{FlowOutcome, TextFlow};
pub use parser::parse_layout;
pub use pipeline::{
    render_layout, FormPipeline, PipelineError, RenderReport, RenderedForm, Stage, Submission,
};
pub use schema::*;
pub use signature::{SignatureEmbedder, SignatureOutcome};
pub use template::{LoadedTemplate, TemplateLoader};

use thiserror::Error;

/// Errors that can occur while rendering a form
#[derive(Debug, Error)]
pub enum FormError {
    #[error("Failed to parse layout: {0}")]
    LayoutError(String),

    #[error("Signature error: {0}")]
    SignatureError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("PDF error: {0}")]
    PdfError(#[from] pdf_core::PdfError),

    #[error("Storage error: {0}")]
    StorageError(#[from] form_storage::StorageError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for form operations
pub type Result<T> = std::result::Result<T, FormError>;
