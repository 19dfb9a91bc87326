//! HTML fragment for showing an itinerary inline on the web page.
//!
//! Uses the same block parser as the PDF so the page and the download agree.
//! All model text is escaped; only tags generated here reach the browser.

use super::markdown::{parse_markdown, Block, Span};

/// Render Markdown text as an escaped HTML fragment.
pub fn markdown_to_html(text: &str) -> String {
    let mut out = String::new();
    // Nesting depth of open <ul> elements.
    let mut open_lists: usize = 0;

    for block in parse_markdown(text) {
        let depth = match &block {
            Block::ListItem { depth, .. } => *depth as usize + 1,
            _ => 0,
        };
        while open_lists > depth {
            out.push_str("</ul>\n");
            open_lists -= 1;
        }
        while open_lists < depth {
            out.push_str("<ul>\n");
            open_lists += 1;
        }

        match &block {
            Block::Heading { level, spans } => {
                let tag = format!("h{}", (*level).clamp(1, 6));
                out.push_str(&format!("<{tag}>{}</{tag}>\n", inline_html(spans)));
            }
            Block::ListItem { spans, .. } => {
                out.push_str(&format!("<li>{}</li>\n", inline_html(spans)));
            }
            Block::Paragraph { spans } => {
                out.push_str(&format!("<p>{}</p>\n", inline_html(spans)));
            }
            Block::Break => {}
        }
    }

    while open_lists > 0 {
        out.push_str("</ul>\n");
        open_lists -= 1;
    }
    out
}

fn inline_html(spans: &[Span]) -> String {
    spans
        .iter()
        .map(|s| {
            if s.bold {
                format!("<strong>{}</strong>", escape_html(&s.text))
            } else {
                escape_html(&s.text)
            }
        })
        .collect()
}

/// Escape text for element content and quoted attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_and_bold() {
        let html = markdown_to_html("## Trip Overview\nVisit the **Eiffel Tower** at sunset");
        assert_eq!(
            html,
            "<h2>Trip Overview</h2>\n<p>Visit the <strong>Eiffel Tower</strong> at sunset</p>\n"
        );
    }

    #[test]
    fn nested_lists_balanced() {
        let html = markdown_to_html("- a\n  - b\n- c\ntext");
        assert_eq!(
            html,
            "<ul>\n<li>a</li>\n<ul>\n<li>b</li>\n</ul>\n<li>c</li>\n</ul>\n<p>text</p>\n"
        );
    }

    #[test]
    fn model_text_is_escaped() {
        let html = markdown_to_html("<script>alert('x')</script> & more");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("&amp; more"));
    }

    #[test]
    fn empty_text_is_empty_fragment() {
        assert_eq!(markdown_to_html(""), "");
    }
}
