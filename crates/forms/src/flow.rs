//! Wrapped, paginating free text

use pdf_core::{wrap_to_width, Align, PdfDocument, StandardFont};
use tracing::debug;

use crate::schema::NotesLayout;
use crate::Result;

/// Where a text block ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlowOutcome {
    /// Lines drawn
    pub lines: usize,
    /// Continuation pages appended
    pub pages_added: usize,
    /// Page holding the last line
    pub last_page: usize,
}

/// Lays a text block out top to bottom, appending pages as needed
pub struct TextFlow<'a> {
    layout: &'a NotesLayout,
}

impl<'a> TextFlow<'a> {
    pub fn new(layout: &'a NotesLayout) -> Self {
        Self { layout }
    }

    /// Lines that fit on the first page
    pub fn first_page_capacity(&self) -> usize {
        self.capacity_from(self.layout.start_y)
    }

    /// Lines that fit on a continuation page, below the heading
    pub fn continuation_capacity(&self) -> usize {
        self.capacity_from(self.layout.continuation_top - self.layout.heading_gap)
    }

    fn capacity_from(&self, top: f64) -> usize {
        let usable = top - self.layout.bottom_margin;
        if usable < 0.0 {
            return 0;
        }
        (usable / self.layout.line_height).floor() as usize + 1
    }

    /// Render `text` starting on `page`
    ///
    /// Every whitespace-separated token is drawn on some page; nothing is
    /// truncated.
    pub fn render(&self, doc: &mut PdfDocument, page: usize, text: &str) -> Result<FlowOutcome> {
        let layout = self.layout;
        let font = StandardFont::Helvetica;
        let size = layout.size;

        let mut outcome = FlowOutcome {
            last_page: page,
            ..FlowOutcome::default()
        };
        let mut current_y = layout.start_y;

        for line in wrap_to_width(text, layout.max_width, |s| font.text_width_points(s, size)) {
            if current_y < layout.bottom_margin {
                outcome.last_page = doc.add_page()?;
                outcome.pages_added += 1;
                debug!(
                    page = outcome.last_page,
                    lines = outcome.lines,
                    "text continued on new page"
                );

                current_y = layout.continuation_top;
                doc.set_font(StandardFont::HelveticaBold, layout.heading_size);
                doc.insert_text(
                    &layout.continuation_heading,
                    outcome.last_page,
                    layout.x,
                    current_y,
                    Align::Left,
                )?;
                current_y -= layout.heading_gap;
            }

            doc.set_font(font, size);
            doc.insert_text(&line, outcome.last_page, layout.x, current_y, Align::Left)?;
            outcome.lines += 1;
            current_y -= layout.line_height;
        }

        Ok(outcome)
    }
}
