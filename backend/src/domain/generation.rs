//! Lesson generation inputs, job lifecycle, prompts, and fallback content.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::ids::{GenerationJobId, LessonId, TenantId, UserId, VersionId};
use super::lesson::{
    DEFAULT_LANGUAGE, DifferentiationEntry, FlowStep, MaterialItem, TypedNote, VersionContent,
};

/// Shortest lesson the generator accepts, in minutes.
pub const MIN_DURATION_MINUTES: u32 = 5;
/// Longest lesson the generator accepts, in minutes.
pub const MAX_DURATION_MINUTES: u32 = 180;

/// Prompt used when no template file is configured.
pub const DEFAULT_PROMPT_TEMPLATE: &str = "You are an instructional coach generating a lesson. \
Subject: {subject}. Grade level: {grade_level}. Topic: {topic}. \
Duration: {duration_minutes} minutes. Teaching style: {teaching_style}. \
Focus keywords: {focus_keywords}.";

/// Provenance marker recorded for template-generated content.
pub const FALLBACK_GENERATOR: &str = "fallback";

/// Validation failures for [`GenerationInput`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationInputError {
    #[error("{field} must not be empty")]
    Blank { field: &'static str },
    #[error("durationMinutes must be between {min} and {max}")]
    DurationOutOfRange { min: u32, max: u32 },
}

impl GenerationInputError {
    /// Request field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Blank { field } => field,
            Self::DurationOutOfRange { .. } => "durationMinutes",
        }
    }
}

/// Parameters of one generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationInput {
    pub subject: String,
    pub grade_level: String,
    pub topic: String,
    pub duration_minutes: u32,
    pub teaching_style: String,
    pub focus_keywords: Vec<String>,
    pub standard_codes: Option<Vec<String>>,
}

impl GenerationInput {
    /// Check required text fields and the duration range.
    pub fn validate(&self) -> Result<(), GenerationInputError> {
        for (field, value) in [
            ("subject", &self.subject),
            ("gradeLevel", &self.grade_level),
            ("topic", &self.topic),
            ("teachingStyle", &self.teaching_style),
        ] {
            if value.trim().is_empty() {
                return Err(GenerationInputError::Blank { field });
            }
        }
        if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&self.duration_minutes) {
            return Err(GenerationInputError::DurationOutOfRange {
                min: MIN_DURATION_MINUTES,
                max: MAX_DURATION_MINUTES,
            });
        }
        Ok(())
    }

    /// Keywords used for standards suggestion: focus keywords plus the topic.
    pub fn suggestion_keywords(&self) -> Vec<String> {
        let mut keywords = self.focus_keywords.clone();
        keywords.push(self.topic.clone());
        keywords
    }

    /// Explicit standard codes, ignoring an empty list.
    pub fn explicit_codes(&self) -> Option<&[String]> {
        self.standard_codes
            .as_deref()
            .filter(|codes| !codes.is_empty())
    }

    /// Fill `template` placeholders with this input.
    pub fn render_prompt(&self, template: &str) -> String {
        template
            .replace("{subject}", &self.subject)
            .replace("{grade_level}", &self.grade_level)
            .replace("{topic}", &self.topic)
            .replace("{duration_minutes}", &self.duration_minutes.to_string())
            .replace("{teaching_style}", &self.teaching_style)
            .replace("{focus_keywords}", &self.focus_keywords.join(", "))
    }
}

/// Lifecycle of a generation job.
///
/// Jobs start `Processing` and finish exactly once; repositories refuse to
/// finish a job that is no longer `Processing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown job status: {other}")),
        }
    }
}

/// Audit record of one generation attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationJob {
    pub id: GenerationJobId,
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub status: JobStatus,
    pub prompt_payload: Value,
    pub result_payload: Option<Value>,
    pub error_message: Option<String>,
    pub lesson_id: Option<LessonId>,
    pub lesson_version_id: Option<VersionId>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Terminal update applied to a processing job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Completed {
        lesson_id: LessonId,
        lesson_version_id: VersionId,
        title: String,
    },
    Failed {
        error_message: String,
    },
}

impl JobOutcome {
    pub const fn status(&self) -> JobStatus {
        match self {
            Self::Completed { .. } => JobStatus::Completed,
            Self::Failed { .. } => JobStatus::Failed,
        }
    }

    /// JSON stored in `result_payload` for completed jobs.
    pub fn result_payload(&self) -> Option<Value> {
        match self {
            Self::Completed {
                lesson_id,
                lesson_version_id,
                title,
            } => Some(json!({
                "lesson_id": lesson_id.to_string(),
                "lesson_version_id": lesson_version_id.to_string(),
                "title": title,
            })),
            Self::Failed { .. } => None,
        }
    }
}

/// Content produced by a generator, before persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedLesson {
    pub title: String,
    pub language: String,
    pub content: VersionContent,
}

/// Shape accepted from a model response. Every field is optional so a
/// partially filled object still yields a lesson.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProviderLesson {
    title: Option<String>,
    language: Option<String>,
    objective: Option<String>,
    teacher_script_md: Option<String>,
    materials: Vec<MaterialItem>,
    flow: Vec<FlowStep>,
    differentiation: Vec<DifferentiationEntry>,
    assessments: Vec<TypedNote>,
    accommodations: Vec<TypedNote>,
}

/// Errors raised when a model response cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderOutputError {
    #[error("model output is not a JSON object")]
    NotAnObject,
    #[error("model output has an unexpected shape: {0}")]
    Shape(String),
}

fn fallback_title(input: &GenerationInput) -> String {
    format!("{} ({})", input.topic, input.subject)
}

fn source_marker(generator: &str) -> Map<String, Value> {
    let mut source = Map::new();
    source.insert("generator".to_owned(), Value::from(generator));
    source
}

/// Interpret raw model output, which must be a JSON object.
pub fn parse_provider_output(
    raw: &str,
    input: &GenerationInput,
    generator: &str,
) -> Result<GeneratedLesson, ProviderOutputError> {
    let value: Value =
        serde_json::from_str(raw.trim()).map_err(|_| ProviderOutputError::NotAnObject)?;
    if !value.is_object() {
        return Err(ProviderOutputError::NotAnObject);
    }
    let parsed: ProviderLesson = serde_json::from_value(value)
        .map_err(|error| ProviderOutputError::Shape(error.to_string()))?;

    Ok(GeneratedLesson {
        title: parsed
            .title
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| fallback_title(input)),
        language: parsed
            .language
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_owned()),
        content: VersionContent {
            objective: parsed.objective,
            duration_minutes: Some(input.duration_minutes),
            teacher_script_md: parsed.teacher_script_md,
            materials: parsed.materials,
            flow: parsed.flow,
            differentiation: parsed.differentiation,
            assessments: parsed.assessments,
            accommodations: parsed.accommodations,
            source: source_marker(generator),
        },
    })
}

fn note(kind: &str, description: &str) -> TypedNote {
    TypedNote {
        kind: kind.to_owned(),
        description: description.to_owned(),
    }
}

fn step(phase: &str, minutes: u32, content_md: String) -> FlowStep {
    FlowStep {
        phase: Some(phase.to_owned()),
        minutes: Some(minutes),
        content_md,
    }
}

/// Deterministic template lesson used whenever the model is unavailable.
pub fn fallback_lesson(input: &GenerationInput) -> GeneratedLesson {
    let topic = input.topic.as_str();
    let focus = if input.focus_keywords.is_empty() {
        topic.to_owned()
    } else {
        input.focus_keywords.join(", ")
    };

    GeneratedLesson {
        title: fallback_title(input),
        language: DEFAULT_LANGUAGE.to_owned(),
        content: VersionContent {
            objective: Some(format!(
                "Students will explore {topic} through {} learning.",
                input.teaching_style.to_lowercase()
            )),
            duration_minutes: Some(input.duration_minutes),
            teacher_script_md: Some(format!(
                "### Engage\nIntroduce the topic of {topic}.\n\n### Explore\nGuide learners through an activity centered on {focus}."
            )),
            materials: vec![MaterialItem {
                kind: Some("text".to_owned()),
                label: Some("Materials".to_owned()),
                value: "Projector, slide deck, exit ticket".to_owned(),
            }],
            flow: vec![
                step("Engage", 10, format!("Warm-up discussion about {topic}.")),
                step(
                    "Explore",
                    input.duration_minutes.saturating_sub(20),
                    "Facilitated group activity with scaffolded prompts.".to_owned(),
                ),
                step(
                    "Reflect",
                    10,
                    "Students share takeaways and complete exit ticket.".to_owned(),
                ),
            ],
            differentiation: vec![
                DifferentiationEntry {
                    strategy: "ELL".to_owned(),
                    description: "Provide sentence starters and visuals.".to_owned(),
                },
                DifferentiationEntry {
                    strategy: "Extension".to_owned(),
                    description: "Offer challenge problems for early finishers.".to_owned(),
                },
            ],
            assessments: vec![note("exit_ticket", "Collect quick reflection on learning.")],
            accommodations: vec![note(
                "iep",
                "Allow additional think time during discussion.",
            )],
            source: source_marker(FALLBACK_GENERATOR),
        },
    }
}
