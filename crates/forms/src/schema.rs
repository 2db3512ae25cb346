//! Form layout schema types
//!
//! A layout is the declarative coordinate table for one form type: where
//! each scalar field lands, how repeating rows are pitched, where free text
//! flows and where signatures are anchored. All coordinates are PDF points
//! from the bottom-left corner of the page.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::FormError;

/// Embedded default layout for invoices
pub const INVOICE_LAYOUT: &str = include_str!("../layouts/invoice.json");

/// Embedded default layout for job safety analyses
pub const JSA_LAYOUT: &str = include_str!("../layouts/jsa.json");

/// Supported form types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormType {
    Invoice,
    Jsa,
}

impl FormType {
    /// Prefix used in object keys and layout file names
    pub fn prefix(&self) -> &'static str {
        match self {
            FormType::Invoice => "invoice",
            FormType::Jsa => "jsa",
        }
    }

    /// Built-in layout JSON for this form type
    pub fn embedded_layout(&self) -> &'static str {
        match self {
            FormType::Invoice => INVOICE_LAYOUT,
            FormType::Jsa => JSA_LAYOUT,
        }
    }
}

impl fmt::Display for FormType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

impl FromStr for FormType {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "invoice" => Ok(FormType::Invoice),
            "jsa" => Ok(FormType::Jsa),
            other => Err(FormError::LayoutError(format!("Unknown form type: {other}"))),
        }
    }
}

/// RGB color for text (values 0.0 - 1.0)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TextColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl From<TextColor> for pdf_core::Color {
    fn from(c: TextColor) -> Self {
        pdf_core::Color::rgb(c.r, c.g, c.b)
    }
}

/// How a field value is turned into text
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// String value, `"N/A"` when missing or empty
    #[default]
    Text,
    /// Numeric quantity, `"0"` when missing
    Number,
    /// Boolean, drawn as `"X"` only when truthy
    Checkbox,
}

impl FieldKind {
    /// Font size used when the placement does not set one
    pub fn default_size(&self) -> f32 {
        match self {
            FieldKind::Checkbox => 12.0,
            FieldKind::Text | FieldKind::Number => 10.0,
        }
    }
}

/// Static coordinate binding for one scalar field
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldPlacement {
    pub x: f64,
    pub y: f64,

    /// Data binding; defaults to `$.{fieldKey}`
    #[serde(default)]
    pub bind: Option<String>,

    #[serde(default)]
    pub kind: FieldKind,

    /// Font size in points (defaults per kind)
    #[serde(default)]
    pub size: Option<f32>,

    #[serde(default)]
    pub bold: bool,

    #[serde(default)]
    pub color: Option<TextColor>,
}

impl FieldPlacement {
    pub fn font_size(&self) -> f32 {
        self.size.unwrap_or_else(|| self.kind.default_size())
    }
}

/// What happens when a table has more rows than its printed area
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OverflowMode {
    /// Keep stepping down at the row pitch, even past the printed table
    #[default]
    Overrun,
    /// Continue on an appended page under a continuation heading
    Paginate,
}

impl FromStr for OverflowMode {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overrun" => Ok(OverflowMode::Overrun),
            "paginate" => Ok(OverflowMode::Paginate),
            other => Err(FormError::ConfigError(format!(
                "Unknown table overflow mode: {other}"
            ))),
        }
    }
}

/// Table column definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableColumn {
    /// Field name in each row object
    pub field: String,

    /// X position in points
    pub x: f64,

    #[serde(default)]
    pub kind: FieldKind,
}

fn default_row_height() -> f64 {
    26.0
}

fn default_continuation_top() -> f64 {
    780.0
}

fn default_heading_size() -> f32 {
    12.0
}

fn default_heading_gap() -> f64 {
    20.0
}

fn default_body_size() -> f32 {
    10.0
}

/// Fixed-pitch repeating rows (consumables, labor, personnel)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableLayout {
    /// Name other sections use to refer to this table's rows
    pub name: String,

    /// Binding to the array of row objects
    pub bind: String,

    /// Baseline of the first row
    #[serde(rename = "startY")]
    pub start_y: f64,

    /// Row pitch
    #[serde(rename = "rowHeight")]
    #[serde(default = "default_row_height")]
    pub row_height: f64,

    pub columns: Vec<TableColumn>,

    #[serde(default)]
    pub overflow: OverflowMode,

    /// Rows per page before paginating
    #[serde(rename = "maxRows")]
    #[serde(default)]
    pub max_rows: Option<usize>,

    /// Lowest baseline a row may use before paginating
    #[serde(rename = "minY")]
    #[serde(default)]
    pub min_y: f64,

    /// Heading drawn at the top of continuation pages
    #[serde(default)]
    pub heading: Option<String>,

    #[serde(rename = "continuationTop")]
    #[serde(default = "default_continuation_top")]
    pub continuation_top: f64,

    #[serde(rename = "headingSize")]
    #[serde(default = "default_heading_size")]
    pub heading_size: f32,

    #[serde(rename = "headingGap")]
    #[serde(default = "default_heading_gap")]
    pub heading_gap: f64,

    #[serde(default = "default_body_size")]
    pub size: f32,
}

impl TableLayout {
    /// Left edge of the table (leftmost column)
    pub fn left_edge(&self) -> f64 {
        self.columns
            .iter()
            .map(|c| c.x)
            .reduce(f64::min)
            .unwrap_or_default()
    }
}

fn default_max_width() -> f64 {
    550.0
}

fn default_line_height() -> f64 {
    14.0
}

fn default_bottom_margin() -> f64 {
    50.0
}

fn default_notes_heading() -> String {
    "Notes (Continued)".to_string()
}

/// Free text that wraps and paginates
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotesLayout {
    /// Field key of the text in the form data
    pub field: String,

    pub x: f64,

    /// Baseline of the first line on the first page
    #[serde(rename = "startY")]
    pub start_y: f64,

    #[serde(rename = "maxWidth")]
    #[serde(default = "default_max_width")]
    pub max_width: f64,

    #[serde(rename = "lineHeight")]
    #[serde(default = "default_line_height")]
    pub line_height: f64,

    #[serde(rename = "bottomMargin")]
    #[serde(default = "default_bottom_margin")]
    pub bottom_margin: f64,

    #[serde(rename = "continuationTop")]
    #[serde(default = "default_continuation_top")]
    pub continuation_top: f64,

    #[serde(rename = "continuationHeading")]
    #[serde(default = "default_notes_heading")]
    pub continuation_heading: String,

    #[serde(rename = "headingSize")]
    #[serde(default = "default_heading_size")]
    pub heading_size: f32,

    #[serde(rename = "headingGap")]
    #[serde(default = "default_heading_gap")]
    pub heading_gap: f64,

    #[serde(default = "default_body_size")]
    pub size: f32,
}

/// Number of signatures a layout places
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SignatureMode {
    /// One signature at a fixed anchor on the first page
    #[default]
    Single,
    /// One signature per row of a table, aligned to the row
    PerRow,
}

/// Signature anchor rectangle
///
/// In `perRow` mode `y` is an offset from each row's baseline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignatureLayout {
    /// Binding to a signature string, or an array of them in `perRow` mode
    #[serde(default)]
    pub bind: Option<String>,

    /// Field holding the signature inside each row object (`perRow` only)
    #[serde(rename = "rowField")]
    #[serde(default)]
    pub row_field: Option<String>,

    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,

    #[serde(default)]
    pub mode: SignatureMode,

    /// Table whose rows the signatures follow (`perRow` only)
    #[serde(default)]
    pub table: Option<String>,

    /// Treat a near-white background as transparent
    #[serde(rename = "normalizeAlpha")]
    #[serde(default)]
    pub normalize_alpha: bool,
}

/// Complete layout for one form type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormLayout {
    #[serde(rename = "formType")]
    pub form_type: FormType,

    /// Template file name inside the template directory
    #[serde(rename = "templateAsset")]
    pub template_asset: String,

    /// Binding to the Work Ticket ID
    #[serde(rename = "ticketField")]
    pub ticket_field: String,

    #[serde(default)]
    pub fields: BTreeMap<String, FieldPlacement>,

    #[serde(default)]
    pub tables: Vec<TableLayout>,

    #[serde(default)]
    pub notes: Option<NotesLayout>,

    #[serde(default)]
    pub signatures: Option<SignatureLayout>,
}

impl FormLayout {
    /// Built-in layout for a form type
    pub fn embedded(form_type: FormType) -> crate::Result<Self> {
        crate::parser::parse_layout(form_type.embedded_layout())
    }

    /// Look up a table by name
    pub fn table(&self, name: &str) -> Option<&TableLayout> {
        self.tables.iter().find(|t| t.name == name)
    }
}
