//! Minimal WordprocessingML writer.
//!
//! The package holds only the three parts Word needs to open a document:
//! `[Content_Types].xml`, the root relationships, and `word/document.xml`.
//! Entries are stored uncompressed. Headings use direct run formatting so
//! no styles part is required.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::domain::ports::{DocumentRenderError, DocumentRenderer};
use crate::domain::{ExportDocument, SectionBody};

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

/// Half-point sizes for heading runs.
const TITLE_SIZE: u32 = 32;
const HEADING_SIZE: u32 = 26;

/// Renders exports as `.docx` packages.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocxRenderer;

impl DocumentRenderer for DocxRenderer {
    fn render(&self, document: &ExportDocument) -> Result<Vec<u8>, DocumentRenderError> {
        package(&document_xml(document))
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

fn paragraph(text: &str) -> String {
    format!(
        r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        escape_xml(text)
    )
}

fn heading(text: &str, half_points: u32) -> String {
    format!(
        r#"<w:p><w:r><w:rPr><w:b/><w:sz w:val="{half_points}"/></w:rPr><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        escape_xml(text)
    )
}

fn document_xml(document: &ExportDocument) -> String {
    let mut body = heading(&document.title, TITLE_SIZE);
    body.push_str(&paragraph(&format!("Subject: {}", document.subject)));
    body.push_str(&paragraph(&format!("Grade Level: {}", document.grade_level)));
    if let Some(minutes) = document.duration_minutes.filter(|minutes| *minutes > 0) {
        body.push_str(&paragraph(&format!("Duration: {minutes} minutes")));
    }
    body.push_str("<w:p/>");

    for section in document.sections() {
        body.push_str(&heading(section.title, HEADING_SIZE));
        match section.body {
            SectionBody::Text(text) => body.push_str(&paragraph(&text)),
            SectionBody::Lines(entries) => {
                for entry in entries {
                    body.push_str(&paragraph(&format!("\u{2022} {entry}")));
                }
            }
        }
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1134" w:right="1134" w:bottom="1134" w:left="1134" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr></w:body></w:document>"#
    )
}

fn package(document_xml: &str) -> Result<Vec<u8>, DocumentRenderError> {
    let map_zip = |err: zip::result::ZipError| DocumentRenderError::write(err.to_string());
    let map_io = |err: std::io::Error| DocumentRenderError::write(err.to_string());

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in [
        ("[Content_Types].xml", CONTENT_TYPES_XML),
        ("_rels/.rels", ROOT_RELS_XML),
        ("word/document.xml", document_xml),
    ] {
        writer.start_file(name, options).map_err(map_zip)?;
        writer.write_all(contents.as_bytes()).map_err(map_io)?;
    }
    let cursor = writer.finish().map_err(map_zip)?;
    Ok(cursor.into_inner())
}
