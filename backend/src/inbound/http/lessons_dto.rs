//! Lesson DTOs and parsing helpers.
//!
//! Request bodies mirror the version content fields in camelCase. List
//! entries are typed, so a material without a `value` or a flow step without
//! `contentMd` is rejected by the JSON extractor before reaching a handler.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::domain::ports::NewVersionRequest;
use crate::domain::{
    Audience, BlockDraft, DEFAULT_LANGUAGE, DifferentiationEntry, Error, FlowStep, Lesson,
    LessonBlock, LessonDetail, LessonFilters, LessonHeader, LessonStatus, LessonVersion,
    MaterialItem, RestoredVersion, TypedNote, VersionContent, VersionDraft,
};
use crate::inbound::http::validation::{
    FieldName, invalid_audience_error, missing_field_error, parse_value, require_text,
};

#[derive(Debug, Deserialize)]
pub(super) struct LessonPath {
    pub(super) lesson_id: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct RestorePath {
    pub(super) lesson_id: String,
    pub(super) version_no: u32,
}

/// Query string for `GET /api/v1/lessons`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonListQuery {
    pub subject: Option<String>,
    pub grade_level: Option<String>,
    /// Comma-separated; every tag must be present.
    pub tags: Option<String>,
}

impl From<LessonListQuery> for LessonFilters {
    fn from(query: LessonListQuery) -> Self {
        let non_blank = |value: Option<String>| {
            value
                .map(|raw| raw.trim().to_owned())
                .filter(|trimmed| !trimmed.is_empty())
        };
        Self {
            subject: non_blank(query.subject),
            grade_level: non_blank(query.grade_level),
            tags: query
                .tags
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(str::to_owned)
                .collect(),
        }
    }
}

/// Query string for `GET /api/v1/lessons/{lesson_id}/export`.
#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
}

/// A material needed to run the lesson.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaterialDto {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub label: Option<String>,
    pub value: String,
}

/// One timed phase of the lesson.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlowStepDto {
    pub phase: Option<String>,
    pub minutes: Option<u32>,
    pub content_md: String,
}

/// Differentiation strategy.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct DifferentiationDto {
    pub strategy: String,
    pub description: String,
}

/// Assessment or accommodation note.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct TypedNoteDto {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
}

/// Block submitted with a version.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlockDto {
    pub block_type: Option<String>,
    pub sequence: Option<u32>,
    #[serde(default)]
    pub content_md: String,
    pub est_minutes: Option<u32>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub metadata: Map<String, Value>,
}

/// Content fields shared by lesson creation and new versions.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct VersionFields {
    pub objective: Option<String>,
    pub duration_minutes: Option<u32>,
    pub teacher_script_md: Option<String>,
    pub materials: Vec<MaterialDto>,
    pub flow: Vec<FlowStepDto>,
    pub differentiation: Vec<DifferentiationDto>,
    pub assessments: Vec<TypedNoteDto>,
    pub accommodations: Vec<TypedNoteDto>,
    #[schema(value_type = Object)]
    pub source: Map<String, Value>,
    pub blocks: Vec<BlockDto>,
}

impl From<MaterialDto> for MaterialItem {
    fn from(dto: MaterialDto) -> Self {
        Self {
            kind: dto.kind,
            label: dto.label,
            value: dto.value,
        }
    }
}

impl From<FlowStepDto> for FlowStep {
    fn from(dto: FlowStepDto) -> Self {
        Self {
            phase: dto.phase,
            minutes: dto.minutes,
            content_md: dto.content_md,
        }
    }
}

impl From<DifferentiationDto> for DifferentiationEntry {
    fn from(dto: DifferentiationDto) -> Self {
        Self {
            strategy: dto.strategy,
            description: dto.description,
        }
    }
}

impl From<TypedNoteDto> for TypedNote {
    fn from(dto: TypedNoteDto) -> Self {
        Self {
            kind: dto.kind,
            description: dto.description,
        }
    }
}

fn convert<A, B: From<A>>(items: Vec<A>) -> Vec<B> {
    items.into_iter().map(B::from).collect()
}

impl From<VersionFields> for VersionDraft {
    fn from(fields: VersionFields) -> Self {
        let content = VersionContent {
            objective: fields.objective,
            duration_minutes: fields.duration_minutes,
            teacher_script_md: fields.teacher_script_md,
            materials: convert(fields.materials),
            flow: convert(fields.flow),
            differentiation: convert(fields.differentiation),
            assessments: convert(fields.assessments),
            accommodations: convert(fields.accommodations),
            source: fields.source,
        };
        let blocks = fields
            .blocks
            .into_iter()
            .enumerate()
            .map(|(position, block)| {
                BlockDraft::new(
                    position,
                    block.block_type,
                    block.sequence,
                    block.content_md,
                    block.est_minutes,
                    block.metadata,
                )
            })
            .collect();
        Self { content, blocks }
    }
}

/// Request body for `POST /api/v1/lessons`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLessonBody {
    pub title: Option<String>,
    pub subject: Option<String>,
    pub grade_level: Option<String>,
    /// Defaults to `en`.
    pub language: Option<String>,
    /// `draft` (default), `published`, or `archived`.
    pub status: Option<String>,
    /// `private` (default), `tenant`, or `public`.
    pub visibility: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub metadata: Map<String, Value>,
    #[serde(flatten)]
    pub version: VersionFields,
}

impl CreateLessonBody {
    /// Validate the header and split the body into header and first version.
    pub fn into_parts(self) -> Result<(LessonHeader, VersionDraft), Error> {
        let header = LessonHeader {
            title: require_text(self.title, FieldName::new("title"))?,
            subject: require_text(self.subject, FieldName::new("subject"))?,
            grade_level: require_text(self.grade_level, FieldName::new("gradeLevel"))?,
            language: self
                .language
                .map(|raw| raw.trim().to_owned())
                .filter(|lang| !lang.is_empty())
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_owned()),
            status: parse_optional(self.status, FieldName::new("status"))?.unwrap_or_default(),
            visibility: parse_optional(self.visibility, FieldName::new("visibility"))?
                .unwrap_or_default(),
            tags: self
                .tags
                .into_iter()
                .map(|tag| tag.trim().to_owned())
                .filter(|tag| !tag.is_empty())
                .collect(),
            metadata: self.metadata,
        };
        Ok((header, VersionDraft::from(self.version)))
    }
}

fn parse_optional<T>(raw: Option<String>, field: FieldName) -> Result<Option<T>, Error>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.map(|value| parse_value(&value, field)).transpose()
}

/// Request body for `POST /api/v1/lessons/{lesson_id}/versions`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewVersionBody {
    /// Optional status override applied to the lesson.
    pub status: Option<String>,
    #[serde(flatten)]
    pub version: VersionFields,
}

impl TryFrom<NewVersionBody> for NewVersionRequest {
    type Error = Error;

    fn try_from(body: NewVersionBody) -> Result<Self, Self::Error> {
        Ok(Self {
            status: parse_optional::<LessonStatus>(body.status, FieldName::new("status"))?,
            draft: VersionDraft::from(body.version),
        })
    }
}

/// Request body for `POST /api/v1/lessons/{lesson_id}/differentiate`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DifferentiateBody {
    /// `ELL`, `IEP`, or `GIFTED`.
    pub audience: Option<String>,
    pub notes: Option<String>,
}

impl DifferentiateBody {
    pub fn audience(&self) -> Result<Audience, Error> {
        let field = FieldName::new("audience");
        let raw = self
            .audience
            .as_deref()
            .ok_or_else(|| missing_field_error(field))?;
        raw.parse::<Audience>()
            .map_err(|_| invalid_audience_error(field, raw))
    }
}

/// Lesson block as returned by the API.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LessonBlockResponse {
    pub id: String,
    pub block_type: String,
    pub sequence: u32,
    pub content_md: String,
    pub est_minutes: Option<u32>,
    #[schema(value_type = Object)]
    pub metadata: Map<String, Value>,
}

impl From<LessonBlock> for LessonBlockResponse {
    fn from(block: LessonBlock) -> Self {
        Self {
            id: block.id.to_string(),
            block_type: block.block_type,
            sequence: block.sequence,
            content_md: block.content_md,
            est_minutes: block.est_minutes,
            metadata: block.metadata,
        }
    }
}

/// Immutable lesson version.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LessonVersionResponse {
    pub id: String,
    pub lesson_id: String,
    pub version_no: u32,
    pub objective: Option<String>,
    pub duration_minutes: Option<u32>,
    pub teacher_script_md: Option<String>,
    pub materials: Vec<MaterialDto>,
    pub flow: Vec<FlowStepDto>,
    pub differentiation: Vec<DifferentiationDto>,
    pub assessments: Vec<TypedNoteDto>,
    pub accommodations: Vec<TypedNoteDto>,
    #[schema(value_type = Object)]
    pub source: Map<String, Value>,
    pub blocks: Vec<LessonBlockResponse>,
    pub created_by_user_id: Option<String>,
    pub created_at: String,
    pub published_at: Option<String>,
}

impl From<LessonVersion> for LessonVersionResponse {
    fn from(version: LessonVersion) -> Self {
        let content = version.content;
        Self {
            id: version.id.to_string(),
            lesson_id: version.lesson_id.to_string(),
            version_no: version.version_no,
            objective: content.objective,
            duration_minutes: content.duration_minutes,
            teacher_script_md: content.teacher_script_md,
            materials: convert(content.materials),
            flow: convert(content.flow),
            differentiation: convert(content.differentiation),
            assessments: convert(content.assessments),
            accommodations: convert(content.accommodations),
            source: content.source,
            blocks: convert(version.blocks),
            created_by_user_id: version.created_by_user_id.map(|id| id.to_string()),
            created_at: version.created_at.to_rfc3339(),
            published_at: version.published_at.map(|at| at.to_rfc3339()),
        }
    }
}

impl From<MaterialItem> for MaterialDto {
    fn from(item: MaterialItem) -> Self {
        Self {
            kind: item.kind,
            label: item.label,
            value: item.value,
        }
    }
}

impl From<FlowStep> for FlowStepDto {
    fn from(step: FlowStep) -> Self {
        Self {
            phase: step.phase,
            minutes: step.minutes,
            content_md: step.content_md,
        }
    }
}

impl From<DifferentiationEntry> for DifferentiationDto {
    fn from(entry: DifferentiationEntry) -> Self {
        Self {
            strategy: entry.strategy,
            description: entry.description,
        }
    }
}

impl From<TypedNote> for TypedNoteDto {
    fn from(note: TypedNote) -> Self {
        Self {
            kind: note.kind,
            description: note.description,
        }
    }
}

/// Lesson header as listed.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LessonSummaryResponse {
    pub id: String,
    pub title: String,
    pub subject: String,
    pub grade_level: String,
    pub language: String,
    #[schema(example = "draft")]
    pub status: String,
    #[schema(example = "private")]
    pub visibility: String,
    pub tags: Vec<String>,
    pub current_version_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Lesson> for LessonSummaryResponse {
    fn from(lesson: Lesson) -> Self {
        Self {
            id: lesson.id.to_string(),
            title: lesson.title,
            subject: lesson.subject,
            grade_level: lesson.grade_level,
            language: lesson.language,
            status: lesson.status.to_string(),
            visibility: lesson.visibility.to_string(),
            tags: lesson.tags,
            current_version_id: lesson.current_version_id.map(|id| id.to_string()),
            created_at: lesson.created_at.to_rfc3339(),
            updated_at: lesson.updated_at.to_rfc3339(),
        }
    }
}

/// Lesson with every version, oldest first.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LessonDetailResponse {
    #[serde(flatten)]
    pub summary: LessonSummaryResponse,
    pub owner_user_id: String,
    #[schema(value_type = Object)]
    pub metadata: Map<String, Value>,
    pub versions: Vec<LessonVersionResponse>,
}

impl From<LessonDetail> for LessonDetailResponse {
    fn from(detail: LessonDetail) -> Self {
        let LessonDetail { lesson, mut versions } = detail;
        versions.sort_by_key(|version| version.version_no);
        let owner_user_id = lesson.owner_user_id.to_string();
        let metadata = lesson.metadata.clone();
        Self {
            summary: LessonSummaryResponse::from(lesson),
            owner_user_id,
            metadata,
            versions: convert(versions),
        }
    }
}

/// Result of moving the current-version pointer.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RestoreResponse {
    pub lesson_id: String,
    pub current_version_id: String,
    pub restored_version: u32,
}

impl From<RestoredVersion> for RestoreResponse {
    fn from(restored: RestoredVersion) -> Self {
        Self {
            lesson_id: restored.lesson_id.to_string(),
            current_version_id: restored.current_version_id.to_string(),
            restored_version: restored.restored_version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Visibility;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn list_query_splits_and_trims_tags() {
        let filters = LessonFilters::from(LessonListQuery {
            subject: Some("  ".to_owned()),
            grade_level: Some("5".to_owned()),
            tags: Some("water, ,cycle ".to_owned()),
        });
        assert_eq!(filters.subject, None);
        assert_eq!(filters.grade_level.as_deref(), Some("5"));
        assert_eq!(filters.tags, vec!["water".to_owned(), "cycle".to_owned()]);
    }

    #[rstest]
    fn create_body_applies_header_defaults() {
        let body: CreateLessonBody = serde_json::from_value(json!({
            "title": " Water Cycle ",
            "subject": "Science",
            "gradeLevel": "5",
            "objective": "Explain evaporation",
            "flow": [{ "phase": "Engage", "minutes": 10, "contentMd": "Warm-up" }],
            "blocks": [{ "contentMd": "Intro" }, { "blockType": "quiz", "contentMd": "Check" }]
        }))
        .expect("body parses");
        let (header, draft) = body.into_parts().expect("valid header");

        assert_eq!(header.title, "Water Cycle");
        assert_eq!(header.language, DEFAULT_LANGUAGE);
        assert_eq!(header.status, LessonStatus::Draft);
        assert_eq!(header.visibility, Visibility::Private);
        assert_eq!(draft.content.objective.as_deref(), Some("Explain evaporation"));
        assert_eq!(draft.content.flow.first().map(|s| s.content_md.as_str()), Some("Warm-up"));
        let sequences: Vec<u32> = draft.blocks.iter().map(|b| b.sequence).collect();
        assert_eq!(sequences, vec![1, 2]);
        assert_eq!(draft.blocks.get(1).map(|b| b.block_type.as_str()), Some("quiz"));
    }

    #[rstest]
    #[case::missing_title(json!({ "subject": "Science", "gradeLevel": "5" }), "title")]
    #[case::blank_grade(json!({ "title": "T", "subject": "Science", "gradeLevel": " " }), "gradeLevel")]
    #[case::bad_status(json!({ "title": "T", "subject": "S", "gradeLevel": "5", "status": "live" }), "status")]
    #[case::bad_visibility(json!({ "title": "T", "subject": "S", "gradeLevel": "5", "visibility": "everyone" }), "visibility")]
    fn create_body_rejects_invalid_headers(#[case] raw: Value, #[case] field: &str) {
        let body: CreateLessonBody = serde_json::from_value(raw).expect("body parses");
        let err = body.into_parts().expect_err("rejected");
        assert_eq!(err.details().and_then(|d| d.get("field")), Some(&json!(field)));
    }

    #[rstest]
    fn materials_require_a_value() {
        let parsed = serde_json::from_value::<NewVersionBody>(json!({
            "materials": [{ "type": "text", "label": "Slides" }]
        }));
        assert!(parsed.is_err());
    }

    #[rstest]
    #[case("ell", Audience::Ell)]
    #[case("GIFTED", Audience::Gifted)]
    fn audience_parses_case_insensitively(#[case] raw: &str, #[case] expected: Audience) {
        let body = DifferentiateBody {
            audience: Some(raw.to_owned()),
            notes: None,
        };
        assert_eq!(body.audience().expect("audience"), expected);
    }

    #[rstest]
    fn unknown_audience_is_reported() {
        let body = DifferentiateBody {
            audience: Some("ADVANCED".to_owned()),
            notes: None,
        };
        let err = body.audience().expect_err("rejected");
        assert_eq!(
            err.details().and_then(|d| d.get("code")),
            Some(&json!("invalid_audience"))
        );
    }
}
