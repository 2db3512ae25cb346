//! Text rendering utilities

use crate::document::Color;
use crate::Align;

/// Context for rendering text
pub struct TextRenderContext {
    /// PDF font resource name (e.g., "FmF1")
    pub font_name: String,
    /// Font size in points
    pub font_size: f32,
    /// Text width in points (for alignment)
    pub text_width: f64,
    /// Text color (RGB)
    pub color: Color,
}

/// Calculate X offset for text alignment
///
/// # Arguments
/// * `text_width` - Width of text in points
/// * `container_width` - Available width for alignment
/// * `align` - Desired alignment
pub fn calculate_x_offset(text_width: f64, container_width: f64, align: Align) -> f64 {
    match align {
        Align::Left => 0.0,
        Align::Center => (container_width - text_width) / 2.0,
        Align::Right => container_width - text_width,
    }
}

/// Escape encoded bytes as a PDF literal string operand, e.g. `(a\(b\))`
pub fn encode_literal(encoded: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded.len() + 2);
    out.push(b'(');
    for &byte in encoded {
        if matches!(byte, b'(' | b')' | b'\\') {
            out.push(b'\\');
        }
        out.push(byte);
    }
    out.push(b')');
    out
}

/// Generate PDF operators for text insertion
///
/// Creates the proper PDF text operators (BT, Tf, Td, Tj, ET) to render text
/// at a specific position with alignment support.
///
/// # Arguments
/// * `text_operand` - Encoded string operand (e.g., `(Hello)`)
/// * `x` - X coordinate in points (PDF coordinates, from left)
/// * `y` - Y coordinate in points (PDF coordinates, from bottom)
/// * `align` - Text alignment relative to `x`
/// * `ctx` - Text rendering context
pub fn generate_text_operators(
    text_operand: &[u8],
    x: f64,
    y: f64,
    align: Align,
    ctx: &TextRenderContext,
) -> Vec<u8> {
    let x_offset = match align {
        Align::Left => 0.0,
        Align::Center => -ctx.text_width / 2.0,
        Align::Right => -ctx.text_width,
    };
    let final_x = x + x_offset;

    let mut ops = Vec::new();
    ops.extend_from_slice(b"BT\n");
    ops.extend_from_slice(
        format!("{} {} {} rg\n", ctx.color.r, ctx.color.g, ctx.color.b).as_bytes(),
    );
    ops.extend_from_slice(format!("/{} {} Tf\n", ctx.font_name, ctx.font_size).as_bytes());
    ops.extend_from_slice(format!("{final_x} {y} Td\n").as_bytes());
    ops.extend_from_slice(text_operand);
    ops.extend_from_slice(b" Tj\nET\n");
    ops
}

/// Lazily wrapped lines of a text, bounded by a measured width
///
/// Tokens are split on whitespace and greedily joined with single spaces
/// while the measured width stays within `max_width`. A token that alone
/// exceeds the width is emitted on its own line rather than broken.
pub struct WrappedLines<'a, F>
where
    F: Fn(&str) -> f64,
{
    tokens: std::iter::Peekable<std::str::SplitWhitespace<'a>>,
    max_width: f64,
    measure: F,
}

impl<'a, F> Iterator for WrappedLines<'a, F>
where
    F: Fn(&str) -> f64,
{
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let mut line = String::from(self.tokens.next()?);

        while let Some(&token) = self.tokens.peek() {
            let candidate = format!("{line} {token}");
            if (self.measure)(&candidate) > self.max_width {
                break;
            }
            line = candidate;
            self.tokens.next();
        }

        Some(line)
    }
}

/// Wrap text to a maximum width using the supplied measuring function
///
/// # Example
/// ```ignore
/// let font = StandardFont::Helvetica;
/// let lines: Vec<String> =
///     wrap_to_width(notes, 550.0, |s| font.text_width_points(s, 10.0)).collect();
/// ```
pub fn wrap_to_width<F>(text: &str, max_width: f64, measure: F) -> WrappedLines<'_, F>
where
    F: Fn(&str) -> f64,
{
    WrappedLines {
        tokens: text.split_whitespace().peekable(),
        max_width,
        measure,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StandardFont;
    use pretty_assertions::assert_eq;

    /// Every character is 1pt wide
    fn unit_width(s: &str) -> f64 {
        s.chars().count() as f64
    }

    #[test]
    fn test_x_offset_left() {
        assert_eq!(calculate_x_offset(100.0, 500.0, Align::Left), 0.0);
    }

    #[test]
    fn test_x_offset_center() {
        assert_eq!(calculate_x_offset(100.0, 500.0, Align::Center), 200.0);
    }

    #[test]
    fn test_x_offset_right() {
        assert_eq!(calculate_x_offset(100.0, 500.0, Align::Right), 400.0);
    }

    #[test]
    fn test_encode_literal_escapes() {
        assert_eq!(encode_literal(b"plain"), b"(plain)".to_vec());
        assert_eq!(encode_literal(b"a(b)c"), b"(a\\(b\\)c)".to_vec());
        assert_eq!(encode_literal(b"C:\\tmp"), b"(C:\\\\tmp)".to_vec());
        assert_eq!(encode_literal(b""), b"()".to_vec());
    }

    #[test]
    fn test_generate_text_operators_left() {
        let ctx = TextRenderContext {
            font_name: "FmF1".to_string(),
            font_size: 10.0,
            text_width: 100.0,
            color: Color::black(),
        };

        let ops = generate_text_operators(b"(Hello)", 100.0, 700.0, Align::Left, &ctx);
        let ops_str = String::from_utf8(ops).unwrap();

        assert!(ops_str.starts_with("BT\n"));
        assert!(ops_str.contains("/FmF1 10 Tf"));
        assert!(ops_str.contains("100 700 Td"));
        assert!(ops_str.contains("(Hello) Tj"));
        assert!(ops_str.ends_with("ET\n"));
    }

    #[test]
    fn test_generate_text_operators_center() {
        let ctx = TextRenderContext {
            font_name: "FmF2".to_string(),
            font_size: 14.0,
            text_width: 100.0,
            color: Color::black(),
        };

        let ops = generate_text_operators(b"(Test)", 200.0, 600.0, Align::Center, &ctx);
        let ops_str = String::from_utf8(ops).unwrap();

        assert!(ops_str.contains("150 600 Td"));
    }

    #[test]
    fn test_generate_text_operators_right() {
        let ctx = TextRenderContext {
            font_name: "FmF1".to_string(),
            font_size: 16.0,
            text_width: 80.0,
            color: Color::black(),
        };

        let ops = generate_text_operators(b"(Right)", 300.0, 500.0, Align::Right, &ctx);
        let ops_str = String::from_utf8(ops).unwrap();

        assert!(ops_str.contains("220 500 Td"));
    }

    #[test]
    fn test_generate_text_operators_with_color() {
        let ctx = TextRenderContext {
            font_name: "FmF1".to_string(),
            font_size: 12.0,
            text_width: 10.0,
            color: Color::rgb(1.0, 0.0, 0.0),
        };

        let ops = generate_text_operators(b"(A)", 100.0, 700.0, Align::Left, &ctx);
        let ops_str = String::from_utf8(ops).unwrap();

        assert!(ops_str.contains("1 0 0 rg"));
    }

    #[test]
    fn test_generate_text_operators_keeps_high_bytes() {
        let ctx = TextRenderContext {
            font_name: "FmF1".to_string(),
            font_size: 10.0,
            text_width: 0.0,
            color: Color::black(),
        };

        let ops = generate_text_operators(&encode_literal(&[0xE9]), 0.0, 0.0, Align::Left, &ctx);
        assert!(ops.windows(3).any(|w| w == [b'(', 0xE9, b')']));
    }

    #[test]
    fn test_wrap_to_width_greedy() {
        let lines: Vec<String> =
            wrap_to_width("Hello world this is a test", 11.0, unit_width).collect();
        assert_eq!(lines, vec!["Hello world", "this is a", "test"]);
    }

    #[test]
    fn test_wrap_to_width_single_line() {
        let lines: Vec<String> = wrap_to_width("Short", 100.0, unit_width).collect();
        assert_eq!(lines, vec!["Short"]);
    }

    #[test]
    fn test_wrap_to_width_empty() {
        assert_eq!(wrap_to_width("", 10.0, unit_width).count(), 0);
        assert_eq!(wrap_to_width("   \n\t ", 10.0, unit_width).count(), 0);
    }

    #[test]
    fn test_wrap_to_width_long_token_kept_whole() {
        let lines: Vec<String> =
            wrap_to_width("a Supercalifragilistic b", 5.0, unit_width).collect();
        assert_eq!(lines, vec!["a", "Supercalifragilistic", "b"]);
    }

    #[test]
    fn test_wrap_to_width_collapses_whitespace() {
        let lines: Vec<String> = wrap_to_width("Hello    world\n\nagain", 100.0, unit_width).collect();
        assert_eq!(lines, vec!["Hello world again"]);
    }

    #[test]
    fn test_wrap_to_width_exact_fit() {
        let lines: Vec<String> = wrap_to_width("Hello world", 11.0, unit_width).collect();
        assert_eq!(lines, vec!["Hello world"]);

        let lines: Vec<String> = wrap_to_width("Hello world", 10.0, unit_width).collect();
        assert_eq!(lines, vec!["Hello", "world"]);
    }

    #[test]
    fn test_wrap_to_width_measured_font() {
        let font = StandardFont::Helvetica;
        let text = "word ".repeat(400);
        for line in wrap_to_width(&text, 550.0, |s| font.text_width_points(s, 10.0)) {
            assert!(font.text_width_points(&line, 10.0) <= 550.0);
        }
    }

    #[test]
    fn test_wrap_to_width_preserves_tokens() {
        let text = "the quick brown fox jumps over the lazy dog ".repeat(30);
        let rejoined: Vec<String> = wrap_to_width(&text, 37.0, unit_width)
            .flat_map(|line| {
                line.split_whitespace()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect();
        let original: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        assert_eq!(rejoined, original);
    }
}
