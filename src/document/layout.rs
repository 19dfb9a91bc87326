//! Flowable layout: parsed blocks → wrapped lines → pages.
//!
//! All coordinates are PDF points with the origin at the bottom-left corner
//! of the page. Text width is measured with the standard Helvetica metrics,
//! which is what the PDF writer draws with, so a line that fits here fits on
//! paper.
//!
//! ## Pagination
//!
//! Lines are placed top-to-bottom. When the next line does not fit in the
//! remaining content height a new page begins. Vertical spacing that would
//! open a fresh page is dropped, and there is always at least one page even
//! for empty input.

use serde::{Deserialize, Serialize};

use super::markdown::{Block, Span};
use crate::error::ConfigError;

/// Glyph drawn before list items.
pub const BULLET: &str = "•";

// ── Styles ───────────────────────────────────────────────────────────────────

/// Page geometry and typography. All sizes in points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentStyles {
    pub page_width: f32,
    pub page_height: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub body_size: f32,
    /// Size of the document title (heading level 0).
    pub title_size: f32,
    /// Sizes for heading levels 1, 2, 3, …; deeper levels reuse the last.
    pub heading_sizes: Vec<f32>,
    /// Line advance as a multiple of the font size.
    pub line_height: f32,
    /// Horizontal indent per list nesting level.
    pub list_indent: f32,
    pub heading_space_before: f32,
    pub heading_space_after: f32,
    pub paragraph_space_after: f32,
    pub list_item_space_after: f32,
    /// Vertical space for a blank line.
    pub break_space: f32,
    pub footer_size: f32,
}

impl Default for DocumentStyles {
    /// US Letter, 0.5 in side margins, 0.7 in top/bottom margins.
    fn default() -> Self {
        Self {
            page_width: 612.0,
            page_height: 792.0,
            margin_left: 36.0,
            margin_right: 36.0,
            margin_top: 50.4,
            margin_bottom: 50.4,
            body_size: 10.0,
            title_size: 18.0,
            heading_sizes: vec![18.0, 16.0, 14.0, 12.0],
            line_height: 1.35,
            list_indent: 18.0,
            heading_space_before: 8.0,
            heading_space_after: 4.0,
            paragraph_space_after: 2.0,
            list_item_space_after: 1.0,
            break_space: 6.0,
            footer_size: 8.0,
        }
    }
}

impl DocumentStyles {
    /// Width available to body text.
    pub fn content_width(&self) -> f32 {
        self.page_width - self.margin_left - self.margin_right
    }

    pub fn content_height(&self) -> f32 {
        self.page_height - self.margin_top - self.margin_bottom
    }

    /// Font size for a heading level; level 0 is the document title.
    pub fn heading_size(&self, level: u8) -> f32 {
        if level == 0 {
            return self.title_size;
        }
        let idx = (level as usize - 1).min(self.heading_sizes.len().saturating_sub(1));
        self.heading_sizes
            .get(idx)
            .copied()
            .unwrap_or(self.body_size)
    }

    /// Reject geometry the layout cannot fill.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::InvalidConfig(msg));

        let margins = [
            self.margin_left,
            self.margin_right,
            self.margin_top,
            self.margin_bottom,
        ];
        if margins.iter().any(|m| !m.is_finite() || *m < 0.0) {
            return invalid("page margins must be finite and non-negative".into());
        }
        let sizes = [self.body_size, self.title_size, self.footer_size];
        if sizes
            .iter()
            .chain(self.heading_sizes.iter())
            .any(|s| !s.is_finite() || *s <= 0.0)
        {
            return invalid("font sizes must be positive".into());
        }
        if self.heading_sizes.is_empty() {
            return invalid("at least one heading size is required".into());
        }
        if !self.line_height.is_finite() || self.line_height < 1.0 {
            return invalid(format!(
                "line_height must be at least 1.0, got {}",
                self.line_height
            ));
        }
        let spacing = [
            self.list_indent,
            self.heading_space_before,
            self.heading_space_after,
            self.paragraph_space_after,
            self.list_item_space_after,
            self.break_space,
        ];
        if spacing.iter().any(|s| !s.is_finite() || *s < 0.0) {
            return invalid("spacing values must be finite and non-negative".into());
        }

        let tallest = self
            .heading_sizes
            .iter()
            .copied()
            .fold(self.title_size.max(self.body_size), f32::max)
            * self.line_height;
        if self.content_height() < tallest {
            return invalid(format!(
                "content height {:.1}pt cannot hold a single line",
                self.content_height()
            ));
        }
        // Deepest list level still needs room for a few characters.
        let deepest_indent = self.list_indent * (super::markdown::MAX_LIST_DEPTH as f32 + 1.0);
        if self.content_width() < deepest_indent + 4.0 * self.body_size {
            return invalid(format!(
                "content width {:.1}pt is too narrow",
                self.content_width()
            ));
        }
        Ok(())
    }
}

// ── Helvetica metrics ────────────────────────────────────────────────────────

/// Advance widths for printable ASCII (0x20..=0x7E), in 1/1000 em.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ␠ ! " # $ % & ' ( ) * + , - . /
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0-9 : ; < = > ?
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // @ A-O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // P-Z [ \ ] ^ _
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // ` a-o
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,      // p-z { | } ~
];

/// Helvetica-Bold advance widths, same range and units.
#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ␠ ! " # $ % & ' ( ) * + , - . /
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // 0-9 : ; < = > ?
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // @ A-O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // P-Z [ \ ] ^ _
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // ` a-o
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,      // p-z { | } ~
];

/// Fallback widths for characters outside the tables.
const DEFAULT_WIDTH: u16 = 556;
const DEFAULT_BOLD_WIDTH: u16 = 611;

fn char_width(c: char, bold: bool) -> u16 {
    match (c, bold) {
        (' '..='~', false) => HELVETICA_WIDTHS[c as usize - 0x20],
        (' '..='~', true) => HELVETICA_BOLD_WIDTHS[c as usize - 0x20],
        ('•', _) => 350,
        (_, false) => DEFAULT_WIDTH,
        (_, true) => DEFAULT_BOLD_WIDTH,
    }
}

/// Rendered width of `text` in points.
pub fn text_width(text: &str, size: f32, bold: bool) -> f32 {
    let units: u32 = text.chars().map(|c| char_width(c, bold) as u32).sum();
    units as f32 * size / 1000.0
}

// ── Page model ───────────────────────────────────────────────────────────────

/// A run of same-emphasis text on one line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Run {
    pub text: String,
    pub bold: bool,
    /// Offset from the line's `x`.
    pub x_offset: f32,
    /// Whether the source had whitespace between this run and the previous.
    pub space_before: bool,
}

/// One laid-out line of text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    /// Left edge of the text.
    pub x: f32,
    /// Baseline, measured up from the bottom of the page.
    pub baseline: f32,
    pub size: f32,
    pub runs: Vec<Run>,
    /// List glyph and its left edge, drawn before the text.
    pub marker: Option<(String, f32)>,
}

impl Line {
    /// Visible text of the line, without the list marker.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for (i, run) in self.runs.iter().enumerate() {
            if i > 0 && run.space_before {
                out.push(' ');
            }
            out.push_str(&run.text);
        }
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Page {
    pub lines: Vec<Line>,
}

impl Page {
    /// Text of every line, one per row.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(Line::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ── Word wrap ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
struct Word {
    text: String,
    bold: bool,
    space_before: bool,
}

/// Split spans into words, remembering where the source had whitespace.
fn words(spans: &[Span]) -> Vec<Word> {
    let mut out = Vec::new();
    let mut pending_space = false;

    for span in spans {
        let mut current = String::new();
        let mut current_space = pending_space;
        for c in span.text.chars() {
            if c.is_whitespace() {
                if !current.is_empty() {
                    out.push(Word {
                        text: std::mem::take(&mut current),
                        bold: span.bold,
                        space_before: current_space,
                    });
                }
                pending_space = true;
            } else {
                if current.is_empty() {
                    current_space = pending_space;
                    pending_space = false;
                }
                current.push(c);
            }
        }
        if !current.is_empty() {
            out.push(Word {
                text: current,
                bold: span.bold,
                space_before: current_space,
            });
        }
    }

    out
}

/// Split a word that is wider than `max_width` into pieces that fit.
fn split_long_word(word: &Word, size: f32, max_width: f32) -> Vec<Word> {
    let mut pieces = Vec::new();
    let mut current = String::new();

    for c in word.text.chars() {
        let mut candidate = current.clone();
        candidate.push(c);
        if !current.is_empty() && text_width(&candidate, size, word.bold) > max_width {
            pieces.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    if !current.is_empty() {
        pieces.push(current);
    }

    pieces
        .into_iter()
        .enumerate()
        .map(|(i, text)| Word {
            text,
            bold: word.bold,
            space_before: i == 0 && word.space_before,
        })
        .collect()
}

/// Greedy wrap into lines of runs no wider than `max_width`.
fn wrap(spans: &[Span], size: f32, force_bold: bool, max_width: f32) -> Vec<Vec<Run>> {
    let space = text_width(" ", size, false);
    let mut lines: Vec<Vec<Run>> = Vec::new();
    let mut line: Vec<Run> = Vec::new();
    let mut cursor = 0.0f32;

    let mut queue: Vec<Word> = words(spans);
    for word in queue.iter_mut() {
        word.bold |= force_bold;
    }

    let mut i = 0;
    while i < queue.len() {
        let word = queue[i].clone();
        let width = text_width(&word.text, size, word.bold);

        if width > max_width {
            let pieces = split_long_word(&word, size, max_width);
            if pieces.len() > 1 {
                queue.splice(i..=i, pieces);
                continue;
            }
        }

        let gap = if line.is_empty() || !word.space_before {
            0.0
        } else {
            space
        };

        if !line.is_empty() && cursor + gap + width > max_width {
            lines.push(std::mem::take(&mut line));
            cursor = 0.0;
            continue;
        }

        let x = cursor + gap;
        let space_before = !line.is_empty() && word.space_before;
        match line.last_mut() {
            Some(last) if last.bold == word.bold && space_before => {
                last.text.push(' ');
                last.text.push_str(&word.text);
            }
            _ => line.push(Run {
                text: word.text,
                bold: word.bold,
                x_offset: x,
                space_before,
            }),
        }
        cursor = x + width;
        i += 1;
    }

    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

// ── Pagination ───────────────────────────────────────────────────────────────

struct Paginator<'a> {
    styles: &'a DocumentStyles,
    pages: Vec<Page>,
    /// Distance from the top of the content area to the next line.
    cursor: f32,
    pending_space: f32,
}

impl<'a> Paginator<'a> {
    fn new(styles: &'a DocumentStyles) -> Self {
        Self {
            styles,
            pages: vec![Page::default()],
            cursor: 0.0,
            pending_space: 0.0,
        }
    }

    fn current_is_empty(&self) -> bool {
        self.pages.last().is_none_or(|p| p.lines.is_empty())
    }

    fn space(&mut self, amount: f32) {
        self.pending_space = self.pending_space.max(amount);
    }

    fn place(&mut self, runs: Vec<Run>, x: f32, size: f32, marker: Option<String>) {
        let advance = size * self.styles.line_height;

        if self.current_is_empty() {
            self.pending_space = 0.0;
        } else {
            let needed = self.cursor + self.pending_space + advance;
            if needed > self.styles.content_height() {
                self.pages.push(Page::default());
                self.cursor = 0.0;
                self.pending_space = 0.0;
            }
        }
        self.cursor += self.pending_space;
        self.pending_space = 0.0;

        // Baseline sits one font size below the top of the line box.
        let top = self.styles.page_height - self.styles.margin_top;
        let baseline = top - self.cursor - size;
        self.cursor += advance;

        let marker = marker.map(|glyph| {
            let gx = (x - self.styles.list_indent * 0.7).max(self.styles.margin_left);
            (glyph, gx)
        });
        if let Some(page) = self.pages.last_mut() {
            page.lines.push(Line {
                x,
                baseline,
                size,
                runs,
                marker,
            });
        }
    }

    fn finish(self) -> Vec<Page> {
        self.pages
    }
}

/// Lay blocks out onto pages.
///
/// Heading level 0 is reserved for a document title; parsed Markdown starts
/// at level 1.
pub fn layout_blocks(blocks: &[Block], styles: &DocumentStyles) -> Vec<Page> {
    let mut pager = Paginator::new(styles);
    let left = styles.margin_left;
    let width = styles.content_width();

    for block in blocks {
        match block {
            Block::Break => pager.space(styles.break_space),
            Block::Heading { level, spans } => {
                let size = styles.heading_size(*level);
                pager.space(styles.heading_space_before);
                for runs in wrap(spans, size, true, width) {
                    pager.place(runs, left, size, None);
                }
                pager.space(styles.heading_space_after);
            }
            Block::ListItem { depth, spans } => {
                let indent = styles.list_indent * (*depth as f32 + 1.0);
                let size = styles.body_size;
                for (i, runs) in wrap(spans, size, false, width - indent)
                    .into_iter()
                    .enumerate()
                {
                    let marker = (i == 0).then(|| BULLET.to_string());
                    pager.place(runs, left + indent, size, marker);
                }
                pager.space(styles.list_item_space_after);
            }
            Block::Paragraph { spans } => {
                let size = styles.body_size;
                for runs in wrap(spans, size, false, width) {
                    pager.place(runs, left, size, None);
                }
                pager.space(styles.paragraph_space_after);
            }
        }
    }

    pager.finish()
}

// ── Tests ────────────────────────────────────────────────────────────────────
