//! Plain PDF 1.4 writer.
//!
//! Lays out the export document as wrapped text lines on A4 pages using the
//! standard Helvetica fonts, so no font embedding is needed. Characters
//! outside WinAnsi are replaced with `?`.

use std::io::Write;

use crate::domain::ports::{DocumentRenderError, DocumentRenderer};
use crate::domain::{ExportDocument, SectionBody};

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 42.0;
/// Rough Helvetica advance width as a fraction of the font size.
const AVERAGE_GLYPH_WIDTH: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Face {
    Regular,
    Bold,
}

impl Face {
    const fn resource(self) -> &'static str {
        match self {
            Self::Regular => "F1",
            Self::Bold => "F2",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Style {
    face: Face,
    size: f32,
    leading: f32,
}

const TITLE: Style = Style {
    face: Face::Bold,
    size: 16.0,
    leading: 20.0,
};
const HEADER: Style = Style {
    face: Face::Regular,
    size: 12.0,
    leading: 16.0,
};
const HEADING: Style = Style {
    face: Face::Bold,
    size: 13.0,
    leading: 18.0,
};
const BODY: Style = Style {
    face: Face::Regular,
    size: 11.0,
    leading: 14.0,
};

/// A positioned run of text on one page.
#[derive(Debug, Clone, PartialEq)]
struct PlacedLine {
    face: Face,
    size: f32,
    y: f32,
    text: String,
}

/// Renders exports as PDF without a layout engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainPdfRenderer;

impl DocumentRenderer for PlainPdfRenderer {
    fn render(&self, document: &ExportDocument) -> Result<Vec<u8>, DocumentRenderError> {
        let pages = paginate(&flow_lines(document));
        write_pdf(&pages).map_err(|err| DocumentRenderError::write(err.to_string()))
    }
}

/// Styled paragraphs in reading order, with blank gaps as `None`.
fn flow_lines(document: &ExportDocument) -> Vec<Option<(Style, String)>> {
    let mut lines = vec![Some((TITLE, document.title.clone()))];
    lines.extend(
        document
            .header_lines()
            .into_iter()
            .map(|line| Some((HEADER, line))),
    );
    lines.push(None);
    for section in document.sections() {
        lines.push(Some((HEADING, section.title.to_owned())));
        match section.body {
            SectionBody::Text(text) => lines.push(Some((BODY, text))),
            SectionBody::Lines(entries) => lines.extend(
                entries
                    .into_iter()
                    .map(|entry| Some((BODY, format!("- {entry}")))),
            ),
        }
        lines.push(None);
    }
    lines
}

fn wrap(text: &str, size: f32) -> Vec<String> {
    let usable = PAGE_WIDTH - 2.0 * MARGIN;
    let max_chars = ((usable / (size * AVERAGE_GLYPH_WIDTH)) as usize).max(1);

    let mut wrapped = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let needed = if current.is_empty() {
                word.chars().count()
            } else {
                current.chars().count() + 1 + word.chars().count()
            };
            if needed > max_chars && !current.is_empty() {
                wrapped.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            while current.chars().count() > max_chars {
                let head: String = current.chars().take(max_chars).collect();
                let tail: String = current.chars().skip(max_chars).collect();
                wrapped.push(head);
                current = tail;
            }
        }
        wrapped.push(current);
    }
    if wrapped.is_empty() {
        wrapped.push(String::new());
    }
    wrapped
}

fn paginate(lines: &[Option<(Style, String)>]) -> Vec<Vec<PlacedLine>> {
    let mut pages = vec![Vec::new()];
    let mut y = PAGE_HEIGHT - MARGIN;
    for entry in lines {
        let Some((style, text)) = entry else {
            y -= BODY.leading / 2.0;
            continue;
        };
        for segment in wrap(text, style.size) {
            if y - style.leading < MARGIN {
                pages.push(Vec::new());
                y = PAGE_HEIGHT - MARGIN;
            }
            y -= style.leading;
            if let Some(page) = pages.last_mut() {
                page.push(PlacedLine {
                    face: style.face,
                    size: style.size,
                    y,
                    text: segment,
                });
            }
        }
    }
    pages
}

/// Encode `text` as a PDF literal string body in WinAnsi.
fn escape_text(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '(' | ')' | '\\' => {
                out.push(b'\\');
                out.push(ch as u8);
            }
            '\u{20}'..='\u{7e}' => out.push(ch as u8),
            '\u{a0}'..='\u{ff}' => out.push(u32::from(ch) as u8),
            _ => out.push(b'?'),
        }
    }
    out
}

fn content_stream(page: &[PlacedLine]) -> std::io::Result<Vec<u8>> {
    let mut stream = Vec::new();
    for line in page {
        write!(
            stream,
            "BT /{} {:.1} Tf {:.1} {:.1} Td (",
            line.face.resource(),
            line.size,
            MARGIN,
            line.y
        )?;
        stream.extend_from_slice(&escape_text(&line.text));
        stream.extend_from_slice(b") Tj ET\n");
    }
    Ok(stream)
}

fn write_pdf(pages: &[Vec<PlacedLine>]) -> std::io::Result<Vec<u8>> {
    // Objects 1-4 are fixed; each page then adds a page and a content object.
    let page_ids: Vec<usize> = (0..pages.len()).map(|index| 5 + index * 2).collect();
    let kids = page_ids
        .iter()
        .map(|id| format!("{id} 0 R"))
        .collect::<Vec<_>>()
        .join(" ");

    let mut objects: Vec<Vec<u8>> = vec![
        b"<< /Type /Catalog /Pages 2 0 R >>".to_vec(),
        format!("<< /Type /Pages /Kids [{kids}] /Count {} >>", pages.len()).into_bytes(),
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_vec(),
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>"
            .to_vec(),
    ];
    for (page, page_id) in pages.iter().zip(&page_ids) {
        objects.push(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH:.0} {PAGE_HEIGHT:.0}] \
                 /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
                page_id + 1
            )
            .into_bytes(),
        );
        let stream = content_stream(page)?;
        let mut body = format!("<< /Length {} >>\nstream\n", stream.len()).into_bytes();
        body.extend_from_slice(&stream);
        body.extend_from_slice(b"endstream");
        objects.push(body);
    }

    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        writeln!(out, "{} 0 obj", index + 1)?;
        out.extend_from_slice(body);
        out.extend_from_slice(b"\nendobj\n");
    }
    let xref_offset = out.len();
    write!(out, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1)?;
    for offset in offsets {
        write!(out, "{offset:010} 00000 n \n")?;
    }
    write!(
        out,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
        objects.len() + 1
    )?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn document() -> ExportDocument {
        ExportDocument {
            title: "Water Cycle (Basics)".to_owned(),
            subject: "Science".to_owned(),
            grade_level: "5".to_owned(),
            objective: Some("Explain evaporation".to_owned()),
            duration_minutes: Some(45),
            standards: vec!["5-ESS2-1".to_owned()],
            materials: vec!["Material: Beakers".to_owned()],
            flow: vec!["Warm-up (5 min): Puddle photos".to_owned()],
            differentiation: Vec::new(),
            assessments: Vec::new(),
            accommodations: Vec::new(),
        }
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|window| window == needle)
    }

    #[rstest]
    fn renders_a_complete_pdf(document: ExportDocument) {
        let bytes = PlainPdfRenderer.render(&document).expect("render");
        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert!(bytes.ends_with(b"%%EOF\n"));
        assert!(contains(&bytes, br"(Water Cycle \(Basics\)) Tj"));
        assert!(contains(&bytes, b"(- 5-ESS2-1) Tj"));
        assert!(contains(&bytes, b"/Count 1"));
    }

    #[rstest]
    fn long_documents_break_across_pages(mut document: ExportDocument) {
        document.flow = (1..=120).map(|step| format!("Step {step}")).collect();
        let bytes = PlainPdfRenderer.render(&document).expect("render");
        assert!(!contains(&bytes, b"/Count 1 >>"));
        assert!(contains(&bytes, b"(- Step 120) Tj"));
    }

    #[rstest]
    fn xref_offsets_point_at_objects(document: ExportDocument) {
        let bytes = PlainPdfRenderer.render(&document).expect("render");
        let text = String::from_utf8_lossy(&bytes);
        let xref = text.find("xref\n").expect("xref table");
        let first_entry = text[xref..]
            .lines()
            .nth(3)
            .expect("first object entry");
        let offset: usize = first_entry[..10].parse().expect("offset");
        assert!(bytes[offset..].starts_with(b"1 0 obj"));
    }

    #[rstest]
    #[case("plain", b"plain".to_vec())]
    #[case(r"a\b", br"a\\b".to_vec())]
    #[case("café", b"caf\xe9".to_vec())]
    #[case("→", b"?".to_vec())]
    fn text_is_escaped_for_literal_strings(#[case] input: &str, #[case] expected: Vec<u8>) {
        assert_eq!(escape_text(input), expected);
    }

    #[rstest]
    fn wrapping_respects_the_line_width() {
        let text = "word ".repeat(60);
        let lines = wrap(&text, 11.0);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|line| line.chars().count() <= 92));
    }
}
