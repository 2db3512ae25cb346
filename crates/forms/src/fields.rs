//! Scalar field and repeating-row rendering

use std::collections::HashMap;

use pdf_core::{Align, Color, PdfDocument, StandardFont};
use serde_json::Value;
use tracing::debug;

use crate::parser::{field_binding, is_truthy, resolve_binding, value_to_string};
use crate::schema::{FieldKind, FormLayout, OverflowMode, TableLayout};
use crate::Result;

/// Placeholder for missing text values
pub const MISSING_TEXT: &str = "N/A";

/// Placeholder for missing numeric values
pub const MISSING_NUMBER: &str = "0";

/// Glyph drawn for a checked checkbox
pub const CHECK_MARK: &str = "X";

/// Resolved position of one repeating row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowSlot {
    /// Page number (1-indexed)
    pub page: usize,
    /// Baseline of the row
    pub y: f64,
}

/// Row positions per table name
pub type RowSlots = HashMap<String, Vec<RowSlot>>;

/// Text to draw for a value of the given kind, if any
pub fn field_text(kind: FieldKind, value: Option<&Value>) -> Option<String> {
    let text = value.map(value_to_string).unwrap_or_default();
    let text = text.trim();

    match kind {
        FieldKind::Checkbox => value.filter(|v| is_truthy(v)).map(|_| CHECK_MARK.to_string()),
        FieldKind::Text if text.is_empty() => Some(MISSING_TEXT.to_string()),
        FieldKind::Number if text.is_empty() => Some(MISSING_NUMBER.to_string()),
        FieldKind::Text | FieldKind::Number => Some(text.to_string()),
    }
}

/// Stamps field values and table rows onto a document
pub struct FieldRenderer<'a> {
    layout: &'a FormLayout,
    overflow_override: Option<OverflowMode>,
}

impl<'a> FieldRenderer<'a> {
    pub fn new(layout: &'a FormLayout) -> Self {
        Self {
            layout,
            overflow_override: None,
        }
    }

    /// Force one overflow behavior for every table
    pub fn with_overflow(mut self, overflow: Option<OverflowMode>) -> Self {
        self.overflow_override = overflow;
        self
    }

    /// Draw every placed field on the first page
    ///
    /// # Returns
    /// Number of draw operations recorded
    pub fn render_fields(&self, doc: &mut PdfDocument, data: &Value) -> Result<usize> {
        let mut drawn = 0;

        for (key, placement) in &self.layout.fields {
            let binding = field_binding(key, placement.bind.as_deref());
            let Some(text) = field_text(placement.kind, resolve_binding(&binding, data)) else {
                continue;
            };

            let font = if placement.bold {
                StandardFont::HelveticaBold
            } else {
                StandardFont::Helvetica
            };
            doc.set_font(font, placement.font_size());
            doc.set_text_color(placement.color.map(Color::from).unwrap_or_default());
            doc.insert_text(&text, 1, placement.x, placement.y, Align::Left)?;
            drawn += 1;
        }

        doc.set_text_color(Color::black());
        Ok(drawn)
    }

    /// Draw every table and return where each row landed
    pub fn render_tables(&self, doc: &mut PdfDocument, data: &Value) -> Result<RowSlots> {
        let mut slots = RowSlots::new();
        for table in &self.layout.tables {
            let rows = self.render_table(doc, table, data)?;
            slots.insert(table.name.clone(), rows);
        }
        Ok(slots)
    }

    fn render_table(
        &self,
        doc: &mut PdfDocument,
        table: &TableLayout,
        data: &Value,
    ) -> Result<Vec<RowSlot>> {
        let rows = match resolve_binding(&table.bind, data).and_then(Value::as_array) {
            Some(rows) if !rows.is_empty() => rows,
            _ => return Ok(Vec::new()),
        };

        let overflow = self.overflow_override.unwrap_or(table.overflow);
        let mut slots = Vec::with_capacity(rows.len());
        let mut page = 1;
        let mut y = table.start_y;
        let mut rows_on_page = 0;

        for row in rows {
            let page_full = table.max_rows.is_some_and(|max| rows_on_page >= max);
            if overflow == OverflowMode::Paginate && (y < table.min_y || page_full) {
                page = doc.add_page()?;
                debug!(table = %table.name, page, "table continued on new page");
                y = table.continuation_top;
                rows_on_page = 0;

                if let Some(heading) = &table.heading {
                    doc.set_font(StandardFont::HelveticaBold, table.heading_size);
                    doc.insert_text(heading, page, table.left_edge(), y, Align::Left)?;
                    y -= table.heading_gap;
                }
            }

            doc.set_font(StandardFont::Helvetica, table.size);
            for column in &table.columns {
                if let Some(text) = field_text(column.kind, row.get(&column.field)) {
                    doc.insert_text(&text, page, column.x, y, Align::Left)?;
                }
            }

            slots.push(RowSlot { page, y });
            y -= table.row_height;
            rows_on_page += 1;
        }

        Ok(slots)
    }
}
