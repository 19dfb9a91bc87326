//! Markdown → paginated document rendering.
//!
//! ## Data Flow
//!
//! ```text
//! text ──▶ markdown ──▶ layout ──▶ pdf
//!          (blocks)     (pages)    (bytes)
//!              │
//!              └──▶ html (on-screen fragment)
//! ```
//!
//! Parsing and layout are pure and never fail; only the PDF writer can
//! return [`RenderError`]. The page model is kept alongside the bytes so
//! callers (and tests) can inspect what was drawn without parsing PDF.

pub mod html;
pub mod layout;
pub mod markdown;
pub mod pdf;

pub use html::markdown_to_html;
pub use layout::{DocumentStyles, Line, Page, Run};
pub use markdown::{parse_markdown, Block, Span};

use chrono::NaiveDate;
use tracing::debug;

use crate::error::RenderError;
use crate::request::TripRequest;

/// Title used when rendering arbitrary Markdown.
const DEFAULT_TITLE: &str = "Travel Itinerary";

/// A rendered PDF and the page model it was drawn from.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub pages: Vec<Page>,
    pub bytes: Vec<u8>,
}

impl RenderedDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Text of all pages in order, excluding page footers.
    pub fn text(&self) -> String {
        self.pages
            .iter()
            .map(Page::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Render Markdown-like text into a paginated PDF.
///
/// Total on any input: headings, bullets and bold spans are recognised when
/// present, and everything else is drawn as wrapped paragraphs.
pub fn render_document(
    text: &str,
    styles: &DocumentStyles,
) -> Result<RenderedDocument, RenderError> {
    render_blocks(DEFAULT_TITLE, &parse_markdown(text), styles)
}

/// Render an itinerary with a title and generation date above the body.
pub fn render_itinerary_document(
    request: &TripRequest,
    markdown: &str,
    generated_on: NaiveDate,
    styles: &DocumentStyles,
) -> Result<RenderedDocument, RenderError> {
    let title = format!("Your Travel Itinerary: {}", request.destination());
    let mut blocks = vec![
        Block::Heading {
            level: 0,
            spans: vec![Span::plain(title.clone())],
        },
        Block::Paragraph {
            spans: vec![Span::plain(format!(
                "Generated: {}",
                generated_on.format("%Y-%m-%d")
            ))],
        },
        Block::Break,
    ];
    blocks.extend(parse_markdown(markdown));
    render_blocks(&title, &blocks, styles)
}

fn render_blocks(
    title: &str,
    blocks: &[Block],
    styles: &DocumentStyles,
) -> Result<RenderedDocument, RenderError> {
    let pages = layout::layout_blocks(blocks, styles);
    debug!(blocks = blocks.len(), pages = pages.len(), "Layout complete");
    let bytes = pdf::write_pdf(title, &pages, styles)?;
    Ok(RenderedDocument { pages, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_is_total() {
        let styles = DocumentStyles::default();
        for input in ["", "   \n\n  ", "**unmatched", "****", "# ", "\u{1F30F} 東京"] {
            let doc = render_document(input, &styles).unwrap();
            assert!(doc.page_count() >= 1, "input {input:?}");
            assert!(doc.bytes.starts_with(b"%PDF"));
        }
    }

    #[test]
    fn bold_markers_not_in_document_text() {
        let doc = render_document(
            "Visit the **Eiffel Tower** at sunset",
            &DocumentStyles::default(),
        )
        .unwrap();
        assert_eq!(doc.text(), "Visit the Eiffel Tower at sunset");
    }

    #[test]
    fn itinerary_document_has_title_and_date() {
        let request = TripRequest::new("Kyoto", 3, "temples", "").unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
        let doc = render_itinerary_document(
            &request,
            "## Trip Overview\nText",
            date,
            &DocumentStyles::default(),
        )
        .unwrap();
        let text = doc.text();
        assert!(text.starts_with("Your Travel Itinerary: Kyoto\nGenerated: 2026-04-01"));
        assert!(text.contains("Trip Overview"));
        assert_eq!(doc.pages[0].lines[0].size, DocumentStyles::default().title_size);
    }

    #[test]
    fn footer_not_part_of_page_text() {
        let doc = render_document("hello", &DocumentStyles::default()).unwrap();
        assert!(!doc.text().contains("Page 1 of 1"));
    }
}
