//! Signature decoding and placement

use std::io::Cursor;

use base64::Engine;
use image::{DynamicImage, ImageFormat};
use pdf_core::{ImageScaleMode, PdfDocument};
use serde_json::Value;
use tracing::{debug, warn};

use crate::fields::RowSlots;
use crate::parser::{resolve_binding, value_to_string};
use crate::schema::{FormLayout, SignatureLayout, SignatureMode};
use crate::{FormError, Result};

/// Channel value at or above which a pixel counts as pad background
pub const NEAR_WHITE: u8 = 250;

/// Decode a data-URI (`data:image/png;base64,...`) or raw base64 string
pub fn decode_signature(raw: &str) -> Result<Vec<u8>> {
    let raw = raw.trim();
    let payload = match raw.strip_prefix("data:") {
        Some(uri) => uri
            .split_once(',')
            .map(|(_, data)| data)
            .ok_or_else(|| FormError::SignatureError("Invalid data URI".to_string()))?,
        None => raw,
    };

    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return Err(FormError::SignatureError("Empty signature".to_string()));
    }

    base64::engine::general_purpose::STANDARD
        .decode(cleaned)
        .map_err(|e| FormError::SignatureError(format!("Base64 decode error: {e}")))
}

/// Re-encode an image as RGBA PNG with its near-white background made transparent
pub fn normalize_alpha(data: &[u8]) -> Result<Vec<u8>> {
    let image = image::load_from_memory(data)
        .map_err(|e| FormError::SignatureError(format!("Image decode error: {e}")))?;

    let mut rgba = image.to_rgba8();
    for pixel in rgba.pixels_mut() {
        if pixel[0] >= NEAR_WHITE && pixel[1] >= NEAR_WHITE && pixel[2] >= NEAR_WHITE {
            pixel[3] = 0;
        }
    }

    let mut out = Vec::new();
    DynamicImage::ImageRgba8(rgba)
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .map_err(|e| FormError::SignatureError(format!("PNG encode error: {e}")))?;
    Ok(out)
}

/// Signatures placed and skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SignatureOutcome {
    pub embedded: usize,
    pub skipped: usize,
}

/// One signature ready to place
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureAnchor {
    pub raw: String,
    pub page: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Places signatures at their anchors
pub struct SignatureEmbedder<'a> {
    layout: &'a SignatureLayout,
    /// Binding of the table the signatures follow, for `rowField` lookups
    table_bind: Option<&'a str>,
}

impl<'a> SignatureEmbedder<'a> {
    pub fn new(layout: &'a SignatureLayout) -> Self {
        Self {
            layout,
            table_bind: None,
        }
    }

    /// Embedder for a form's signature section, if it has one
    pub fn from_form(form: &'a FormLayout) -> Option<Self> {
        let layout = form.signatures.as_ref()?;
        let table_bind = layout
            .table
            .as_deref()
            .and_then(|name| form.table(name))
            .map(|table| table.bind.as_str());
        Some(Self { layout, table_bind })
    }

    /// Signature strings paired with their anchors
    ///
    /// In per-row mode signature `i` follows row `i`; signatures without a
    /// matching row are returned with page 0 so they get reported as skipped.
    pub fn anchors(&self, data: &Value, slots: &RowSlots) -> Vec<(usize, SignatureAnchor)> {
        let layout = self.layout;
        let anchor = |raw: String, page: usize, y: f64| SignatureAnchor {
            raw,
            page,
            x: layout.x,
            y,
            width: layout.width,
            height: layout.height,
        };

        match layout.mode {
            SignatureMode::Single => layout
                .bind
                .as_deref()
                .and_then(|bind| resolve_binding(bind, data))
                .map(value_to_string)
                .filter(|raw| !raw.trim().is_empty())
                .map(|raw| vec![(0, anchor(raw, 1, layout.y))])
                .unwrap_or_default(),
            SignatureMode::PerRow => {
                let rows = layout
                    .table
                    .as_deref()
                    .and_then(|name| slots.get(name))
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);

                self.per_row_strings(data)
                    .into_iter()
                    .enumerate()
                    .filter(|(_, raw)| !raw.trim().is_empty())
                    .map(|(index, raw)| {
                        let placed = match rows.get(index) {
                            Some(slot) => anchor(raw, slot.page, slot.y + layout.y),
                            None => anchor(raw, 0, layout.y),
                        };
                        (index, placed)
                    })
                    .collect()
            }
        }
    }

    /// Per-person signature strings, by row index
    fn per_row_strings(&self, data: &Value) -> Vec<String> {
        let bound = self
            .layout
            .bind
            .as_deref()
            .and_then(|bind| resolve_binding(bind, data))
            .and_then(Value::as_array);
        if let Some(values) = bound {
            return values.iter().map(value_to_string).collect();
        }

        let rows = self
            .table_bind
            .and_then(|bind| resolve_binding(bind, data))
            .and_then(Value::as_array);
        match (rows, self.layout.row_field.as_deref()) {
            (Some(rows), Some(field)) => rows
                .iter()
                .map(|row| row.get(field).map(value_to_string).unwrap_or_default())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Embed every signature, skipping any that fail
    ///
    /// Never fails: a bad signature is logged and left out so the rest of
    /// the document still renders.
    pub fn embed_all(
        &self,
        doc: &mut PdfDocument,
        data: &Value,
        slots: &RowSlots,
    ) -> SignatureOutcome {
        let mut outcome = SignatureOutcome::default();

        for (index, anchor) in self.anchors(data, slots) {
            match self.embed_one(doc, &anchor) {
                Ok(()) => {
                    debug!(index, page = anchor.page, y = anchor.y, "signature embedded");
                    outcome.embedded += 1;
                }
                Err(e) => {
                    warn!(stage = "signature-embed", index, error = %e, "signature skipped");
                    outcome.skipped += 1;
                }
            }
        }

        outcome
    }

    fn embed_one(&self, doc: &mut PdfDocument, anchor: &SignatureAnchor) -> Result<()> {
        if anchor.page == 0 {
            return Err(FormError::SignatureError(
                "No row to anchor signature to".to_string(),
            ));
        }

        let mut bytes = decode_signature(&anchor.raw)?;
        if self.layout.normalize_alpha {
            bytes = normalize_alpha(&bytes)?;
        }

        doc.insert_image_scaled(
            &bytes,
            anchor.page,
            anchor.x,
            anchor.y,
            anchor.width,
            anchor.height,
            ImageScaleMode::FitBox,
        )?;
        Ok(())
    }
}
