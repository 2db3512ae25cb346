//! Layout JSON parsing and data binding

use crate::{FormError, FormLayout, Result};

/// Parse a form layout from JSON string
pub fn parse_layout(json: &str) -> Result<FormLayout> {
    serde_json::from_str(json).map_err(|e| FormError::LayoutError(e.to_string()))
}

/// Resolve a JSONPath-like binding expression against data
///
/// Supports simple paths like:
/// - `$.field` - Root field
/// - `$.object.field` - Nested field
/// - `$.array[0]` - Array index
/// - `$.array[0].field` - Array element field
pub fn resolve_binding<'a>(
    path: &str,
    data: &'a serde_json::Value,
) -> Option<&'a serde_json::Value> {
    let path = path.strip_prefix("$.")?;
    let mut current = data;

    for segment in path.split('.') {
        if let Some(bracket_pos) = segment.find('[') {
            let field = &segment[..bracket_pos];
            let index: usize = segment[bracket_pos + 1..]
                .strip_suffix(']')?
                .parse()
                .ok()?;

            if !field.is_empty() {
                current = current.get(field)?;
            }
            current = current.get(index)?;
        } else {
            current = current.get(segment)?;
        }
    }

    Some(current)
}

/// Binding for a field key, `$.{key}` unless one is given
pub fn field_binding(key: &str, bind: Option<&str>) -> String {
    bind.map(str::to_string)
        .unwrap_or_else(|| format!("$.{key}"))
}

/// Convert a JSON value to string for rendering
pub fn value_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Null => String::new(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => value.to_string(),
    }
}

/// Check if a JSON value is truthy
///
/// Strings `"false"`, `"no"`, `"0"` and `"off"` count as false so checkbox
/// state captured as text behaves like a boolean.
pub fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0) != 0.0,
        serde_json::Value::String(s) => {
            let s = s.trim();
            !s.is_empty()
                && !["false", "no", "0", "off"]
                    .iter()
                    .any(|f| s.eq_ignore_ascii_case(f))
        }
        serde_json::Value::Array(a) => !a.is_empty(),
        serde_json::Value::Object(o) => !o.is_empty(),
    }
}
