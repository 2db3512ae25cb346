//! PDF Core - Low-level PDF manipulation
//!
//! This crate provides functionality for:
//! - Opening template PDFs or creating blank pages
//! - Measuring and inserting text in the standard Helvetica faces
//! - Inserting images (JPEG, PNG with transparency)
//! - Appending pages and serializing the result
//!
//! Coordinates are PDF native: points measured from the bottom-left corner.
//!
//! # Example
//!
//! ```ignore
//! use pdf_core::{Align, PdfDocument, StandardFont};
//!
//! let mut doc = PdfDocument::open("template.pdf")?;
//! doc.set_font(StandardFont::Helvetica, 12.0);
//! doc.insert_text("Hello, World!", 1, 100.0, 700.0, Align::Left)?;
//! let bytes = doc.to_bytes()?;
//! ```

mod document;
mod font;
mod image;
mod text;

pub use document::{Color, DrawOp, PageSize, PdfDocument};
pub use font::{encode_win_ansi, StandardFont};
pub use image::{
    calculate_scaled_dimensions, detect_format, ImageFormat, ImageScaleMode, ImageXObject,
};
pub use text::{
    encode_literal, generate_text_operators, wrap_to_width, TextRenderContext, WrappedLines,
};

use thiserror::Error;

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to open PDF: {0}")]
    OpenError(String),

    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Invalid page number: {0} (document has {1} pages)")]
    InvalidPage(usize, usize),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("PDF parsing error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;

/// Text alignment options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}
