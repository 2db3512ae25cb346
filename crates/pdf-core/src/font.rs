//! Standard (base-14) font handling
//!
//! Form overlays are drawn with the PDF standard Helvetica faces, which every
//! conforming reader ships. Nothing is embedded; only the width metrics are
//! needed here so text can be measured for alignment and wrapping.

use lopdf::{Dictionary, Object};

/// Standard font faces available for text insertion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum StandardFont {
    #[default]
    Helvetica,
    HelveticaBold,
}

/// Helvetica advance widths for WinAnsi codes 32..=126 (1/1000 em)
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

/// Helvetica-Bold advance widths for WinAnsi codes 32..=126 (1/1000 em)
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    333, 333, 584, 584, 584, 611, 975, // ':'..'@'
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    333, 278, 333, 584, 556, 333, // '['..'`'
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // 'a'..'m'
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // 'n'..'z'
    389, 280, 389, 584, // '{'..'~'
];

/// Width used for Latin-1 supplement characters (approximate)
const LATIN1_WIDTH: u16 = 556;

/// WinAnsi codes 0x80..=0x9F: character, code, Helvetica width, Helvetica-Bold width
const WIN_ANSI_HIGH: [(char, u8, u16, u16); 27] = [
    ('\u{20AC}', 0x80, 556, 556),   // Euro
    ('\u{201A}', 0x82, 222, 278),   // quotesinglbase
    ('\u{0192}', 0x83, 556, 556),   // florin
    ('\u{201E}', 0x84, 333, 500),   // quotedblbase
    ('\u{2026}', 0x85, 1000, 1000), // ellipsis
    ('\u{2020}', 0x86, 556, 556),   // dagger
    ('\u{2021}', 0x87, 556, 556),   // daggerdbl
    ('\u{02C6}', 0x88, 333, 333),   // circumflex
    ('\u{2030}', 0x89, 1000, 1000), // perthousand
    ('\u{0160}', 0x8A, 667, 667),   // Scaron
    ('\u{2039}', 0x8B, 333, 333),   // guilsinglleft
    ('\u{0152}', 0x8C, 1000, 1000), // OE
    ('\u{017D}', 0x8E, 611, 611),   // Zcaron
    ('\u{2018}', 0x91, 222, 278),   // quoteleft
    ('\u{2019}', 0x92, 222, 278),   // quoteright
    ('\u{201C}', 0x93, 333, 500),   // quotedblleft
    ('\u{201D}', 0x94, 333, 500),   // quotedblright
    ('\u{2022}', 0x95, 350, 350),   // bullet
    ('\u{2013}', 0x96, 556, 556),   // endash
    ('\u{2014}', 0x97, 1000, 1000), // emdash
    ('\u{02DC}', 0x98, 333, 333),   // tilde
    ('\u{2122}', 0x99, 1000, 1000), // trademark
    ('\u{0161}', 0x9A, 500, 556),   // scaron
    ('\u{203A}', 0x9B, 333, 333),   // guilsinglright
    ('\u{0153}', 0x9C, 944, 944),   // oe
    ('\u{017E}', 0x9E, 500, 500),   // zcaron
    ('\u{0178}', 0x9F, 667, 667),   // Ydieresis
];

/// Byte substituted for characters the WinAnsi encoding cannot carry
const REPLACEMENT: u8 = b'?';

impl StandardFont {
    /// PostScript name used as `/BaseFont`
    pub fn base_font(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
        }
    }

    fn widths(&self) -> &'static [u16; 95] {
        match self {
            StandardFont::Helvetica => &HELVETICA_WIDTHS,
            StandardFont::HelveticaBold => &HELVETICA_BOLD_WIDTHS,
        }
    }

    /// Advance width of an encoded byte in font units (1000 per em)
    pub fn glyph_advance(&self, code: u8) -> u16 {
        match code {
            32..=126 => self.widths()[(code - 32) as usize],
            0xA0..=0xFF => LATIN1_WIDTH,
            _ => WIN_ANSI_HIGH
                .iter()
                .find(|(_, c, _, _)| *c == code)
                .map(|&(_, _, regular, bold)| match self {
                    StandardFont::Helvetica => regular,
                    StandardFont::HelveticaBold => bold,
                })
                .unwrap_or_else(|| self.widths()[(REPLACEMENT - 32) as usize]),
        }
    }

    /// Calculate text width in font units
    pub fn text_width(&self, text: &str) -> u32 {
        encode_win_ansi(text)
            .into_iter()
            .map(|code| self.glyph_advance(code) as u32)
            .sum()
    }

    /// Calculate text width in points for a given font size
    pub fn text_width_points(&self, text: &str, font_size: f32) -> f64 {
        self.text_width(text) as f64 / 1000.0 * font_size as f64
    }

    /// Font dictionary referenced from page resources
    pub fn to_pdf_dictionary(&self) -> Dictionary {
        Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            (
                "BaseFont",
                Object::Name(self.base_font().as_bytes().to_vec()),
            ),
            ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
        ])
    }
}

/// Encode text into single-byte WinAnsi codes
///
/// Printable ASCII and the Latin-1 supplement map to themselves, typographic
/// punctuation and the euro sign map into 0x80..=0x9F. Anything else
/// (control characters, emoji, CJK) becomes `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            code @ 32..=126 => code as u8,
            code @ 0xA0..=0xFF => code as u8,
            _ => WIN_ANSI_HIGH
                .iter()
                .find(|(ch, _, _, _)| *ch == c)
                .map_or(REPLACEMENT, |&(_, code, _, _)| code),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_font_names() {
        assert_eq!(StandardFont::Helvetica.base_font(), "Helvetica");
        assert_eq!(StandardFont::HelveticaBold.base_font(), "Helvetica-Bold");
    }

    #[test]
    fn test_default_font() {
        assert_eq!(StandardFont::default(), StandardFont::Helvetica);
    }

    #[test]
    fn test_ascii_widths() {
        let font = StandardFont::Helvetica;
        assert_eq!(font.glyph_advance(b' '), 278);
        assert_eq!(font.glyph_advance(b'A'), 667);
        assert_eq!(font.glyph_advance(b'W'), 944);
        assert_eq!(font.glyph_advance(b'i'), 222);
        assert_eq!(font.glyph_advance(b'~'), 584);
    }

    #[test]
    fn test_bold_is_wider() {
        let regular = StandardFont::Helvetica.text_width("Notes (Continued)");
        let bold = StandardFont::HelveticaBold.text_width("Notes (Continued)");
        assert!(bold > regular);
    }

    #[test]
    fn test_text_width() {
        let font = StandardFont::Helvetica;
        // H(722) + i(222)
        assert_eq!(font.text_width("Hi"), 944);
        assert_eq!(font.text_width(""), 0);
    }

    #[test]
    fn test_text_width_points() {
        let font = StandardFont::Helvetica;
        let w10 = font.text_width_points("Hi", 10.0);
        let w20 = font.text_width_points("Hi", 20.0);
        assert!((w10 - 9.44).abs() < 1e-9);
        assert!((w20 - 2.0 * w10).abs() < 1e-9);
    }

    #[test]
    fn test_encode_win_ansi() {
        assert_eq!(encode_win_ansi("AB"), vec![0x41, 0x42]);
        assert_eq!(encode_win_ansi("José"), vec![b'J', b'o', b's', 0xE9]);
        assert_eq!(encode_win_ansi("a\u{1F600}b"), vec![b'a', b'?', b'b']);
        assert_eq!(encode_win_ansi("\t"), vec![b'?']);
    }

    #[test]
    fn test_encode_typographic_punctuation() {
        let encoded = encode_win_ansi("Don\u{2019}t \u{201C}ok\u{201D} \u{2013} \u{20AC}5 \u{2022}");
        assert_eq!(
            encoded,
            vec![
                b'D', b'o', b'n', 0x92, b't', b' ', 0x93, b'o', b'k', 0x94, b' ', 0x96, b' ',
                0x80, b'5', b' ', 0x95,
            ]
        );
        assert!(!encoded.contains(&REPLACEMENT));
        // 0x81, 0x8D, 0x8F, 0x90 and 0x9D are unassigned
        assert_eq!(encode_win_ansi("\u{0081}\u{009D}"), vec![b'?', b'?']);
    }

    #[test]
    fn test_typographic_widths() {
        let regular = StandardFont::Helvetica;
        let bold = StandardFont::HelveticaBold;
        assert_eq!(regular.glyph_advance(0x92), 222);
        assert_eq!(bold.glyph_advance(0x92), 278);
        assert_eq!(regular.glyph_advance(0x97), 1000);
        assert_eq!(regular.glyph_advance(0x95), 350);
        assert_eq!(regular.text_width("\u{2019}"), 222);
    }

    #[test]
    fn test_unencodable_measures_as_replacement() {
        let font = StandardFont::Helvetica;
        assert_eq!(font.text_width("\u{4E2D}"), font.text_width("?"));
    }

    #[test]
    fn test_to_pdf_dictionary() {
        let dict = StandardFont::HelveticaBold.to_pdf_dictionary();
        assert_eq!(dict.get(b"Subtype").unwrap().as_name().unwrap(), b"Type1");
        assert_eq!(
            dict.get(b"BaseFont").unwrap().as_name().unwrap(),
            b"Helvetica-Bold"
        );
        assert_eq!(
            dict.get(b"Encoding").unwrap().as_name().unwrap(),
            b"WinAnsiEncoding"
        );
    }
}
