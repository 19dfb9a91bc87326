//! Line parser for the Markdown subset models produce for itineraries.
//!
//! The parser is total: every line maps to some [`Block`], and anything that
//! matches no rule becomes a paragraph. Section structure is never enforced.
//!
//! Rules, in priority order per line:
//!
//! | Line shape                         | Block                 |
//! |------------------------------------|-----------------------|
//! | blank                              | `Break`               |
//! | `---`, `***`, `___`                | `Break`               |
//! | `#`…`######` + space + text        | `Heading`             |
//! | `-`/`*`/`+`/`•` or `1.`/`1)` + space | `ListItem`          |
//! | anything else                      | `Paragraph`           |
//!
//! `**bold**` spans are recognised inside every block kind.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A run of text with uniform emphasis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub text: String,
    pub bold: bool,
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
        }
    }
}

/// One parsed line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    /// `level` is the number of `#` markers (1 = largest).
    Heading { level: u8, spans: Vec<Span> },
    /// `depth` 0 is a top-level item; each two columns of indentation add one.
    ListItem { depth: u8, spans: Vec<Span> },
    Paragraph { spans: Vec<Span> },
    /// Vertical space, no visible content.
    Break,
}

impl Block {
    pub fn spans(&self) -> &[Span] {
        match self {
            Block::Heading { spans, .. }
            | Block::ListItem { spans, .. }
            | Block::Paragraph { spans } => spans,
            Block::Break => &[],
        }
    }

    /// Visible text with markers stripped.
    pub fn text(&self) -> String {
        self.spans().iter().map(|s| s.text.as_str()).collect()
    }
}

/// Deepest list nesting kept; deeper items are drawn at this depth.
pub const MAX_LIST_DEPTH: u8 = 4;

static RE_RULE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:(?:-\s*){3,}|(?:\*\s*){3,}|(?:_\s*){3,})$").unwrap());

static RE_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(#+)(?:\s+(.*))?$").unwrap());

static RE_CLOSING_HASHES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+#+$").unwrap());

static RE_LIST_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[-*+•]|\d{1,3}[.)])\s+(.*)$").unwrap());

/// Parse text into blocks. Never fails.
///
/// Consecutive blank lines collapse into a single [`Block::Break`].
pub fn parse_markdown(text: &str) -> Vec<Block> {
    let mut blocks: Vec<Block> = Vec::new();

    for raw in text.lines() {
        let block = parse_line(raw);
        if block == Block::Break && matches!(blocks.last(), Some(Block::Break)) {
            continue;
        }
        blocks.push(block);
    }

    blocks
}

fn parse_line(raw: &str) -> Block {
    let line = raw.trim_end();
    let content = line.trim_start();

    if content.is_empty() || RE_RULE.is_match(content) {
        return Block::Break;
    }

    if let Some(caps) = RE_HEADING.captures(content) {
        let level = caps[1].len().min(u8::MAX as usize) as u8;
        let text = caps.get(2).map_or("", |m| m.as_str());
        let text = RE_CLOSING_HASHES.replace(text, "");
        let spans = parse_inline(text.trim());
        if spans.is_empty() {
            return Block::Break;
        }
        return Block::Heading { level, spans };
    }

    if let Some(caps) = RE_LIST_ITEM.captures(content) {
        let indent = indentation_width(line);
        let depth = ((indent / 2).min(MAX_LIST_DEPTH as usize)) as u8;
        return Block::ListItem {
            depth,
            spans: parse_inline(caps[1].trim()),
        };
    }

    Block::Paragraph {
        spans: parse_inline(content),
    }
}

/// Leading indentation in columns; a tab counts as four.
fn indentation_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

/// Parse inline `**bold**` segments.
///
/// Markers are stripped from matched pairs; an unmatched `**` stays in the
/// text as written. Empty spans are dropped and adjacent spans with the same
/// emphasis are merged.
pub fn parse_inline(text: &str) -> Vec<Span> {
    let mut spans: Vec<Span> = Vec::new();
    let mut remaining = text;

    while let Some(start) = remaining.find("**") {
        push_span(&mut spans, &remaining[..start], false);

        let after_start = &remaining[start + 2..];
        if let Some(end) = after_start.find("**") {
            push_span(&mut spans, &after_start[..end], true);
            remaining = &after_start[end + 2..];
        } else {
            // No closing **, treat rest as normal text
            push_span(&mut spans, &remaining[start..], false);
            return spans;
        }
    }

    push_span(&mut spans, remaining, false);
    spans
}

fn push_span(spans: &mut Vec<Span>, text: &str, bold: bool) {
    if text.is_empty() {
        return;
    }
    match spans.last_mut() {
        Some(last) if last.bold == bold => last.text.push_str(text),
        _ => spans.push(Span {
            text: text.to_string(),
            bold,
        }),
    }
}
