//! Post-processing: deterministic cleanup of model-generated itineraries.
//!
//! Even a well-prompted model occasionally wraps its answer in
//! ` ```markdown ` fences, opens with "Sure! Here's your plan:", or emits a
//! GFM table that the document renderer would print as raw pipes. These
//! rules fix such quirks without touching the itinerary content, so the
//! prompt can stay focused on *what to plan* rather than formatting.
//!
//! ## Rule Order
//!
//! Normalise line endings before trimming, strip fences before the preamble
//! check so heading detection sees clean input, and flatten tables before
//! collapsing blank lines.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all post-processing rules to the raw model output.
///
/// Rules (applied in order):
/// 1. Strip outer markdown fences
/// 2. Normalise line endings (CRLF → LF)
/// 3. Trim trailing whitespace per line
/// 4. Drop a conversational preamble before the first heading
/// 5. Flatten GFM tables into bold header lines and bullet rows
/// 6. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 7. Collapse runs of blank lines to a single blank line
/// 8. Ensure the text ends with exactly one newline
pub fn clean_itinerary(input: &str) -> String {
    let s = strip_markdown_fences(input);
    let s = normalise_line_endings(&s);
    let s = trim_trailing_whitespace(&s);
    let s = strip_preamble(&s);
    let s = flatten_tables(&s);
    let s = remove_invisible_chars(&s);
    let s = collapse_blank_lines(&s);
    ensure_final_newline(&s)
}

// ── Rule 1: Strip outer markdown fences ──────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:markdown|md)?\r?\n(.*)\r?\n```\s*$").unwrap());

fn strip_markdown_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 4: Drop conversational preamble ─────────────────────────────────────
//
// Only lines before the first heading are considered, and only when they open
// with a stock assistant phrase. Anything else before the first heading is
// real content and stays.

static RE_PREAMBLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:sure|certainly|absolutely|of course|great|here(?:'s| is| are))\b").unwrap()
});

fn strip_preamble(input: &str) -> String {
    let lines: Vec<&str> = input.lines().collect();
    let Some(first_heading) = lines.iter().position(|l| l.trim_start().starts_with('#')) else {
        return input.to_string();
    };
    let preamble = &lines[..first_heading];
    let is_chatter = preamble
        .iter()
        .filter(|l| !l.trim().is_empty())
        .all(|l| RE_PREAMBLE.is_match(l.trim()));
    if first_heading == 0 || !is_chatter {
        return input.to_string();
    }
    lines[first_heading..].join("\n")
}

// ── Rule 5: Flatten GFM tables ───────────────────────────────────────────────

/// Turn a pipe table into a bold header line followed by one bullet per row,
/// cells joined by " · ". Separator rows are dropped.
fn flatten_tables(input: &str) -> String {
    let mut result: Vec<String> = Vec::new();
    let mut in_table = false;

    for line in input.lines() {
        if !is_table_row(line) {
            in_table = false;
            result.push(line.to_string());
            continue;
        }
        if is_separator_row(line) {
            continue;
        }
        let cells = table_cells(line).join(" · ");
        if in_table {
            result.push(format!("- {cells}"));
        } else {
            in_table = true;
            result.push(format!("**{cells}**"));
        }
    }

    result.join("\n")
}

fn table_cells(line: &str) -> Vec<&str> {
    line.trim()
        .trim_matches('|')
        .split('|')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect()
}

fn is_table_row(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with('|') && trimmed.ends_with('|') && trimmed.len() > 2
}

fn is_separator_row(line: &str) -> bool {
    let trimmed = line.trim();
    if !trimmed.starts_with('|') {
        return false;
    }
    // A separator row contains only |, -, :, and whitespace
    trimmed
        .chars()
        .all(|c| c == '|' || c == '-' || c == ':' || c == ' ')
}

// ── Rule 6: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 7: Collapse excessive blank lines ───────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").to_string()
}

// ── Rule 8: Ensure text ends with single newline ─────────────────────────────

fn ensure_final_newline(input: &str) -> String {
    let trimmed = input.trim_end();
    if trimmed.is_empty() {
        String::from("\n")
    } else {
        format!("{}\n", trimmed)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
