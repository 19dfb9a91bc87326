//! PDF writer: laid-out pages → PDF bytes via `printpdf`.
//!
//! Only the two built-in Helvetica faces are used, so no font files are
//! embedded and the output stays small. Built-in fonts cover the WinAnsi
//! character set; [`sanitize`] folds common typographic characters into that
//! range and replaces the rest with `?` rather than emitting unreadable glyphs.

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Pt};
use tracing::debug;

use super::layout::{text_width, DocumentStyles, Page};
use crate::error::RenderError;

fn pdf_err(e: impl std::fmt::Debug) -> RenderError {
    RenderError::Pdf(format!("{e:?}"))
}

fn mm(points: f32) -> Mm {
    Mm::from(Pt(points))
}

/// Draw `pages` into a PDF with a `Page N of M` footer on each page.
pub fn write_pdf(
    title: &str,
    pages: &[Page],
    styles: &DocumentStyles,
) -> Result<Vec<u8>, RenderError> {
    let (doc, first_page, first_layer) = PdfDocument::new(
        sanitize(title),
        mm(styles.page_width),
        mm(styles.page_height),
        "Layer 1",
    );
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(pdf_err)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_err)?;

    let total = pages.len().max(1);
    let empty = Page::default();
    let pages: Vec<&Page> = if pages.is_empty() {
        vec![&empty]
    } else {
        pages.iter().collect()
    };

    for (idx, page) in pages.iter().enumerate() {
        let layer = if idx == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (p, l) = doc.add_page(mm(styles.page_width), mm(styles.page_height), "Layer 1");
            doc.get_page(p).get_layer(l)
        };

        draw_page(&layer, page, &regular, &bold);
        draw_footer(&layer, idx + 1, total, styles, &regular);
    }

    let bytes = doc.save_to_bytes().map_err(pdf_err)?;
    debug!(pages = total, bytes = bytes.len(), "PDF written");
    Ok(bytes)
}

fn draw_page(
    layer: &PdfLayerReference,
    page: &Page,
    regular: &IndirectFontRef,
    bold: &IndirectFontRef,
) {
    for line in &page.lines {
        if let Some((glyph, gx)) = &line.marker {
            layer.use_text(
                sanitize(glyph),
                line.size,
                mm(*gx),
                mm(line.baseline),
                regular,
            );
        }
        for run in &line.runs {
            let font = if run.bold { bold } else { regular };
            layer.use_text(
                sanitize(&run.text),
                line.size,
                mm(line.x + run.x_offset),
                mm(line.baseline),
                font,
            );
        }
    }
}

fn draw_footer(
    layer: &PdfLayerReference,
    number: usize,
    total: usize,
    styles: &DocumentStyles,
    font: &IndirectFontRef,
) {
    let label = format!("Page {number} of {total}");
    let width = text_width(&label, styles.footer_size, false);
    let x = (styles.page_width - width) / 2.0;
    let y = (styles.margin_bottom - styles.footer_size) / 2.0;
    layer.use_text(label, styles.footer_size, mm(x), mm(y.max(0.0)), font);
}

/// Fold text into what the built-in fonts can draw.
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => out.push('"'),
            '\u{2010}'..='\u{2015}' | '\u{2212}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            '\u{00A0}' | '\u{2002}'..='\u{200A}' | '\u{202F}' => out.push(' '),
            '\t' => out.push(' '),
            '•' | '€' => out.push(c),
            c if c.is_control() => {}
            c if (c as u32) < 0x100 => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}
