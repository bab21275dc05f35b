//! Lesson aggregate: a mutable header pointing at immutable versions.
//!
//! A [`Lesson`] carries the searchable header fields and the
//! `current_version_id` pointer. Content lives in [`LessonVersion`] snapshots
//! that are never mutated after creation; edits, restores, and
//! differentiation only append versions or move the pointer.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ids::{BlockId, LessonId, TenantId, UserId, VersionId};

/// Default language applied to lessons that do not specify one.
pub const DEFAULT_LANGUAGE: &str = "en";
/// Block type used when a block omits one.
pub const DEFAULT_BLOCK_TYPE: &str = "content";

/// Error returned when parsing a lesson enum from text fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised {kind}: {value}")]
pub struct ParseLessonEnumError {
    kind: &'static str,
    value: String,
}

/// Publication status of a lesson.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl LessonStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for LessonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LessonStatus {
    type Err = ParseLessonEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "archived" => Ok(Self::Archived),
            _ => Err(ParseLessonEnumError {
                kind: "lesson status",
                value: s.to_owned(),
            }),
        }
    }
}

/// Who may see a lesson.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Private,
    Tenant,
    Public,
}

impl Visibility {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Tenant => "tenant",
            Self::Public => "public",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = ParseLessonEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "private" => Ok(Self::Private),
            "tenant" => Ok(Self::Tenant),
            "public" => Ok(Self::Public),
            _ => Err(ParseLessonEnumError {
                kind: "visibility",
                value: s.to_owned(),
            }),
        }
    }
}

/// Mutable lesson header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: LessonId,
    pub tenant_id: TenantId,
    pub owner_user_id: UserId,
    pub title: String,
    pub subject: String,
    pub grade_level: String,
    pub language: String,
    pub status: LessonStatus,
    pub visibility: Visibility,
    pub tags: Vec<String>,
    pub current_version_id: Option<VersionId>,
    pub metadata: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Header fields supplied when creating a lesson.
#[derive(Debug, Clone, PartialEq)]
pub struct LessonHeader {
    pub title: String,
    pub subject: String,
    pub grade_level: String,
    pub language: String,
    pub status: LessonStatus,
    pub visibility: Visibility,
    pub tags: Vec<String>,
    pub metadata: Map<String, Value>,
}

/// A material needed to run the lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialItem {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub value: String,
}

/// One timed phase of the lesson flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowStep {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minutes: Option<u32>,
    pub content_md: String,
}

/// A differentiation strategy for a group of learners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifferentiationEntry {
    pub strategy: String,
    pub description: String,
}

/// A typed note used for assessments and accommodations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedNote {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
}

/// Content fields of a lesson version.
///
/// Missing list fields are empty and missing scalars are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionContent {
    pub objective: Option<String>,
    pub duration_minutes: Option<u32>,
    pub teacher_script_md: Option<String>,
    pub materials: Vec<MaterialItem>,
    pub flow: Vec<FlowStep>,
    pub differentiation: Vec<DifferentiationEntry>,
    pub assessments: Vec<TypedNote>,
    pub accommodations: Vec<TypedNote>,
    pub source: Map<String, Value>,
}

/// Ordered presentational fragment of a version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonBlock {
    pub id: BlockId,
    pub lesson_version_id: VersionId,
    pub block_type: String,
    pub sequence: u32,
    pub content_md: String,
    pub est_minutes: Option<u32>,
    pub metadata: Map<String, Value>,
}

/// Block awaiting persistence alongside a new version.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockDraft {
    pub block_type: String,
    pub sequence: u32,
    pub content_md: String,
    pub est_minutes: Option<u32>,
    pub metadata: Map<String, Value>,
}

impl BlockDraft {
    /// Build a draft, defaulting the type to `content` and the sequence to
    /// the 1-based `position` in the submitted list.
    pub fn new(
        position: usize,
        block_type: Option<String>,
        sequence: Option<u32>,
        content_md: String,
        est_minutes: Option<u32>,
        metadata: Map<String, Value>,
    ) -> Self {
        let fallback_sequence = u32::try_from(position.saturating_add(1)).unwrap_or(u32::MAX);
        Self {
            block_type: block_type
                .filter(|kind| !kind.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BLOCK_TYPE.to_owned()),
            sequence: sequence.unwrap_or(fallback_sequence),
            content_md,
            est_minutes,
            metadata,
        }
    }
}

/// Content and blocks for a version that has not been numbered yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VersionDraft {
    pub content: VersionContent,
    pub blocks: Vec<BlockDraft>,
}

impl VersionDraft {
    pub fn from_content(content: VersionContent) -> Self {
        Self {
            content,
            blocks: Vec::new(),
        }
    }
}

/// Immutable content snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonVersion {
    pub id: VersionId,
    pub lesson_id: LessonId,
    pub version_no: u32,
    pub content: VersionContent,
    pub blocks: Vec<LessonBlock>,
    pub created_by_user_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

/// A lesson together with every version, ascending by `version_no`.
#[derive(Debug, Clone, PartialEq)]
pub struct LessonDetail {
    pub lesson: Lesson,
    pub versions: Vec<LessonVersion>,
}

impl LessonDetail {
    /// The most recent snapshot, regardless of where the pointer sits.
    pub fn latest_version(&self) -> Option<&LessonVersion> {
        self.versions.iter().max_by_key(|version| version.version_no)
    }
}

/// Outcome of moving the current-version pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoredVersion {
    pub lesson_id: LessonId,
    pub current_version_id: VersionId,
    pub restored_version: u32,
}

/// Listing filters; every requested tag must be present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LessonFilters {
    pub subject: Option<String>,
    pub grade_level: Option<String>,
    pub tags: Vec<String>,
}

impl LessonFilters {
    /// Case-insensitive subset check of the requested tags.
    pub fn tags_match(&self, lesson_tags: &[String]) -> bool {
        self.tags.iter().all(|wanted| {
            lesson_tags
                .iter()
                .any(|tag| tag.trim().eq_ignore_ascii_case(wanted.trim()))
        })
    }

    pub fn matches(&self, lesson: &Lesson) -> bool {
        self.subject
            .as_deref()
            .is_none_or(|subject| lesson.subject == subject)
            && self
                .grade_level
                .as_deref()
                .is_none_or(|grade| lesson.grade_level == grade)
            && self.tags_match(&lesson.tags)
    }
}

/// Next version number given the highest existing one.
pub fn next_version_no(current_max: Option<u32>) -> u32 {
    current_max.map_or(1, |max| max.saturating_add(1))
}
