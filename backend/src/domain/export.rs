//! Export formats and the format-neutral document model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Value, json};

use super::lesson::{Lesson, LessonVersion};

/// Media type for PDF exports.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";
/// Media type for DOCX exports.
pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const GDOC_MESSAGE: &str = "Stubbed Google Docs export. Upload manually to Google Docs interface.";

/// Supported export targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Pdf,
    Docx,
    Gdoc,
}

/// Error returned for an unknown export format.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported export format")]
pub struct UnsupportedFormatError;

impl ExportFormat {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Gdoc => "gdoc",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = UnsupportedFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            "gdoc" => Ok(Self::Gdoc),
            _ => Err(UnsupportedFormatError),
        }
    }
}

/// Body of a document section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionBody {
    Text(String),
    Lines(Vec<String>),
}

/// Titled section rendered in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: &'static str,
    pub body: SectionBody,
}

/// Lesson content flattened into printable lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDocument {
    pub title: String,
    pub subject: String,
    pub grade_level: String,
    pub objective: Option<String>,
    pub duration_minutes: Option<u32>,
    pub standards: Vec<String>,
    pub materials: Vec<String>,
    pub flow: Vec<String>,
    pub differentiation: Vec<String>,
    pub assessments: Vec<String>,
    pub accommodations: Vec<String>,
}

impl ExportDocument {
    /// Flatten `version` of `lesson` with its aligned standard codes.
    pub fn build(lesson: &Lesson, version: &LessonVersion, standard_codes: Vec<String>) -> Self {
        let content = &version.content;
        Self {
            title: lesson.title.clone(),
            subject: lesson.subject.clone(),
            grade_level: lesson.grade_level.clone(),
            objective: content.objective.clone(),
            duration_minutes: content.duration_minutes,
            standards: standard_codes,
            materials: content
                .materials
                .iter()
                .map(|item| {
                    format!(
                        "{}: {}",
                        item.label.as_deref().unwrap_or("Material"),
                        item.value
                    )
                })
                .collect(),
            flow: content
                .flow
                .iter()
                .map(|step| {
                    format!(
                        "{} ({} min): {}",
                        step.phase.as_deref().unwrap_or("Activity"),
                        step.minutes
                            .map_or_else(|| "?".to_owned(), |minutes| minutes.to_string()),
                        step.content_md
                    )
                })
                .collect(),
            differentiation: content
                .differentiation
                .iter()
                .map(|entry| format!("{}: {}", entry.strategy, entry.description))
                .collect(),
            assessments: content
                .assessments
                .iter()
                .map(|note| format!("{}: {}", note.kind, note.description))
                .collect(),
            accommodations: content
                .accommodations
                .iter()
                .map(|note| format!("{}: {}", note.kind, note.description))
                .collect(),
        }
    }

    /// Subject/grade and duration lines printed under the title.
    pub fn header_lines(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "Subject: {} (Grade {})",
            self.subject, self.grade_level
        )];
        if let Some(minutes) = self.duration_minutes.filter(|minutes| *minutes > 0) {
            lines.push(format!("Duration: {minutes} minutes"));
        }
        lines
    }

    /// Non-empty sections in print order.
    pub fn sections(&self) -> Vec<Section> {
        let mut sections = Vec::new();
        if let Some(objective) = self.objective.as_ref().filter(|text| !text.is_empty()) {
            sections.push(Section {
                title: "Objective",
                body: SectionBody::Text(objective.clone()),
            });
        }
        for (title, lines) in [
            ("Standards", &self.standards),
            ("Materials", &self.materials),
            ("Lesson Flow", &self.flow),
            ("Differentiation", &self.differentiation),
            ("Assessments", &self.assessments),
            ("Accommodations", &self.accommodations),
        ] {
            if !lines.is_empty() {
                sections.push(Section {
                    title,
                    body: SectionBody::Lines(lines.clone()),
                });
            }
        }
        sections
    }

    /// Placeholder payload for the Google Docs target.
    pub fn gdoc_payload(&self, generated_at: DateTime<Utc>) -> Value {
        json!({
            "title": self.title,
            "subject": self.subject,
            "grade_level": self.grade_level,
            "generated_at": generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            "sections": {
                "objective": self.objective,
                "standards": self.standards,
                "materials": self.materials,
                "flow": self.flow,
                "differentiation": self.differentiation,
                "assessments": self.assessments,
                "accommodations": self.accommodations,
            },
            "status": "ready",
            "message": GDOC_MESSAGE,
        })
    }
}

/// Filename stem derived from a lesson title.
pub fn filename_base(title: &str) -> String {
    let base = title.trim().to_lowercase().replace(' ', "-");
    if base.is_empty() {
        "lesson".to_owned()
    } else {
        base
    }
}

/// Result of an export.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportArtifact {
    /// Downloadable document.
    File {
        content_type: &'static str,
        filename: String,
        bytes: Vec<u8>,
    },
    /// Structured payload returned inline.
    Json(Value),
}
