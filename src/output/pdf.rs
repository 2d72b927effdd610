//! Paginated PDF audit report.
//!
//! Emits a minimal PDF 1.4 file using the built-in Helvetica fonts, so no
//! font data is embedded. Latin-1 text is written as WinAnsi octal escapes;
//! anything beyond it is replaced with `?`.
//!
//! Layout (A4, points): title block, date, health score and file details on
//! page 1, then a grid table `Type | Attacker IP | Log Fragment` that flows
//! onto following pages with its header repeated. Every page carries a
//! `Page i of n` footer.

use std::fmt::Write as _;

use crate::error::{LogShieldError, Result};
use crate::output::{excerpt, ReportDocument, ReportRow};

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN_LEFT: f32 = 40.0;
const MARGIN_BOTTOM: f32 = 60.0;
const TABLE_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN_LEFT;

/// Top of the table on the first page, below the title block.
const FIRST_TABLE_TOP: f32 = 700.0;
/// Top of the table on continuation pages.
const NEXT_TABLE_TOP: f32 = 800.0;
const HEADER_HEIGHT: f32 = 18.0;
const ROW_HEIGHT: f32 = 16.0;
const CELL_PAD: f32 = 4.0;
const BODY_SIZE: f32 = 9.0;

/// (heading, width, max characters) per column.
const COLUMNS: [(&str, f32, usize); 3] = [
    ("Type", 110.0, 20),
    ("Attacker IP", 110.0, 20),
    ("Log Fragment", TABLE_WIDTH - 220.0, 60),
];

/// Longest data-warning line on the title block.
const WARNING_CHARS: usize = 110;

/// Table header fill, rgb 59/130/246.
const HEADER_FILL: (f32, f32, f32) = (0.231, 0.510, 0.965);

/// Render the report document as PDF bytes.
pub fn render(doc: &ReportDocument) -> Result<Vec<u8>> {
    let pages = paginate(&doc.rows);
    let page_count = pages.len();

    let mut streams = Vec::with_capacity(page_count);
    for (index, rows) in pages.iter().enumerate() {
        let mut canvas = Canvas::default();
        let table_top = if index == 0 {
            draw_title_block(&mut canvas, doc);
            FIRST_TABLE_TOP
        } else {
            NEXT_TABLE_TOP
        };
        draw_table(&mut canvas, table_top, rows);
        if index == 0 && doc.rows.is_empty() {
            canvas.text(
                MARGIN_LEFT,
                table_top - HEADER_HEIGHT - 16.0,
                Font::Regular,
                10.0,
                "No threats detected.",
            );
        }
        canvas.gray(0.4);
        canvas.text(
            PAGE_WIDTH - MARGIN_LEFT - 60.0,
            30.0,
            Font::Regular,
            8.0,
            &format!("Page {} of {}", index + 1, page_count),
        );
        streams.push(canvas.finish());
    }

    let bytes = assemble(doc, &streams)?;
    tracing::debug!(pages = page_count, bytes = bytes.len(), "pdf assembled");
    Ok(bytes)
}

/// Split rows across pages. Always returns at least one page.
fn paginate(rows: &[ReportRow]) -> Vec<&[ReportRow]> {
    let first = rows_fitting(FIRST_TABLE_TOP);
    let next = rows_fitting(NEXT_TABLE_TOP);

    let split = first.min(rows.len());
    let mut pages = vec![&rows[..split]];
    pages.extend(rows[split..].chunks(next));
    pages
}

fn rows_fitting(table_top: f32) -> usize {
    ((table_top - HEADER_HEIGHT - MARGIN_BOTTOM) / ROW_HEIGHT).floor() as usize
}

fn draw_title_block(canvas: &mut Canvas, doc: &ReportDocument) {
    canvas.gray(0.16);
    canvas.text(MARGIN_LEFT, 800.0, Font::Regular, 20.0, doc.title);

    canvas.gray(0.4);
    canvas.text(MARGIN_LEFT, 778.0, Font::Regular, 11.0, &doc.date_line());
    canvas.text(MARGIN_LEFT, 760.0, Font::Regular, 11.0, &doc.score_line());
    canvas.text(
        MARGIN_LEFT,
        742.0,
        Font::Regular,
        9.0,
        &format!(
            "File: {}  |  Lines scanned: {}  |  Threats found: {}  |  {}",
            doc.source_file,
            doc.total_lines_scanned,
            doc.threat_count,
            doc.health.status.label()
        ),
    );
    if let Some(fingerprint) = &doc.fingerprint {
        canvas.text(
            MARGIN_LEFT,
            728.0,
            Font::Regular,
            8.0,
            &format!("SHA-256: {fingerprint}"),
        );
    }
    if let Some(line) = warning_line(&doc.warnings) {
        canvas.text(MARGIN_LEFT, 714.0, Font::Regular, 8.0, &line);
    }
}

/// One title-block line summarising the data warnings, clipped to the page.
fn warning_line(warnings: &[String]) -> Option<String> {
    let line = match warnings {
        [] => return None,
        [only] => format!("Data warning: {only}"),
        [first, ..] => format!("Data warnings: {}, first: {first}", warnings.len()),
    };
    Some(excerpt(&line, WARNING_CHARS))
}

fn draw_table(canvas: &mut Canvas, top: f32, rows: &[ReportRow]) {
    let header_bottom = top - HEADER_HEIGHT;
    canvas.fill_rect(MARGIN_LEFT, header_bottom, TABLE_WIDTH, HEADER_HEIGHT, HEADER_FILL);

    canvas.gray(1.0);
    let mut x = MARGIN_LEFT;
    for (heading, width, _) in COLUMNS {
        canvas.text(x + CELL_PAD, header_bottom + 5.0, Font::Bold, 10.0, heading);
        x += width;
    }

    canvas.gray(0.2);
    let mut y = header_bottom;
    for row in rows {
        y -= ROW_HEIGHT;
        let cells = [&row.category, &row.source_address, &row.excerpt];
        let mut x = MARGIN_LEFT;
        for ((_, width, max_chars), value) in COLUMNS.iter().zip(cells) {
            canvas.stroke_rect(x, y, *width, ROW_HEIGHT);
            canvas.text(
                x + CELL_PAD,
                y + 5.0,
                Font::Regular,
                BODY_SIZE,
                &excerpt(value, *max_chars),
            );
            x += width;
        }
    }
}

#[derive(Clone, Copy)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Self::Regular => "F1",
            Self::Bold => "F2",
        }
    }
}

/// Accumulates one page's content stream operators.
#[derive(Default)]
struct Canvas {
    ops: String,
}

impl Canvas {
    fn text(&mut self, x: f32, y: f32, font: Font, size: f32, text: &str) {
        let _ = writeln!(
            self.ops,
            "BT /{} {size:.1} Tf {x:.2} {y:.2} Td ({}) Tj ET",
            font.resource(),
            pdf_string(text)
        );
    }

    fn gray(&mut self, level: f32) {
        let _ = writeln!(self.ops, "{level:.3} g");
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, (r, g, b): (f32, f32, f32)) {
        let _ = writeln!(self.ops, "{r:.3} {g:.3} {b:.3} rg {x:.2} {y:.2} {w:.2} {h:.2} re f");
    }

    fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let _ = writeln!(
            self.ops,
            "0.5 w 0.75 G {x:.2} {y:.2} {w:.2} {h:.2} re S"
        );
    }

    fn finish(self) -> String {
        self.ops
    }
}

/// Escape text for a PDF literal string.
fn pdf_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            ' '..='~' => out.push(c),
            '\t' | '\r' | '\n' => out.push(' '),
            '\u{A0}'..='\u{FF}' => {
                let _ = write!(out, "\\{:03o}", c as u32);
            }
            _ => out.push('?'),
        }
    }
    out
}

/// Write catalog, page tree, fonts, info, pages and xref.
///
/// Object numbers: 1 catalog, 2 pages, 3 Helvetica, 4 Helvetica-Bold,
/// 5 info, then a page / content pair per page starting at 6.
fn assemble(doc: &ReportDocument, streams: &[String]) -> Result<Vec<u8>> {
    if streams.is_empty() {
        return Err(LogShieldError::Export {
            format: "pdf".into(),
            message: "report has no pages".into(),
        });
    }

    let page_id = |i: usize| 6 + 2 * i;
    let kids: Vec<String> = (0..streams.len())
        .map(|i| format!("{} 0 R", page_id(i)))
        .collect();

    let mut objects: Vec<String> = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            streams.len()
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>"
            .to_string(),
        format!(
            "<< /Title ({}) /Producer (LogShield {}) /CreationDate (D:{}Z) >>",
            pdf_string(doc.title),
            env!("CARGO_PKG_VERSION"),
            doc.generated_at.format("%Y%m%d%H%M%S")
        ),
    ];

    for (i, stream) in streams.iter().enumerate() {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH:.0} {PAGE_HEIGHT:.0}] \
             /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
            page_id(i) + 1
        ));
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}endstream",
            stream.len(),
            stream
        ));
    }

    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }

    let xref_offset = out.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in &offsets {
        let _ = write!(xref, "{offset:010} 00000 n \n");
    }
    let _ = write!(
        xref,
        "trailer\n<< /Size {} /Root 1 0 R /Info 5 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_offset
    );
    out.extend_from_slice(xref.as_bytes());

    Ok(out)
}
