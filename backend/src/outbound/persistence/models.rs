//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use super::schema::{
    districts, events, generation_jobs, lesson_blocks, lesson_standards, lesson_versions,
    lessons, lms_connections, lms_pushes, metrics_daily, schools, shares, standards,
    standards_frameworks, tenants, user_roles, users,
};

// ---------------------------------------------------------------------------
// Tenancy and user models
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tenants)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TenantRow {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tenants)]
pub(crate) struct NewTenantRow<'a> {
    pub id: Uuid,
    pub name: &'a str,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = districts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DistrictRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = schools)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SchoolRow {
    pub id: Uuid,
    pub district_id: Uuid,
    pub name: String,
}

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub locale: String,
    pub preferred_subjects: Vec<String>,
    pub preferred_grade_levels: Vec<String>,
    pub is_active: bool,
    pub is_superuser: bool,
    pub district_id: Option<Uuid>,
    pub school_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for creating new user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub email: &'a str,
    pub full_name: Option<&'a str>,
    pub avatar_url: Option<&'a str>,
    pub district_id: Option<Uuid>,
    pub school_id: Option<Uuid>,
}

/// Changeset for partial user updates; `None` fields are skipped.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
pub(crate) struct UserChangeset<'a> {
    pub full_name: Option<&'a str>,
    pub avatar_url: Option<&'a str>,
    pub is_active: Option<bool>,
    pub district_id: Option<Uuid>,
    pub school_id: Option<Uuid>,
    pub locale: Option<&'a str>,
    pub preferred_subjects: Option<&'a [String]>,
    pub preferred_grade_levels: Option<&'a [String]>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = user_roles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRoleRow {
    pub user_id: Uuid,
    pub role: String,
}

// ---------------------------------------------------------------------------
// Lesson models
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = lessons)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LessonRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub owner_user_id: Uuid,
    pub title: String,
    pub subject: String,
    pub grade_level: String,
    pub language: String,
    pub status: String,
    pub visibility: String,
    pub tags: Vec<String>,
    pub current_version_id: Option<Uuid>,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = lessons)]
pub(crate) struct NewLessonRow<'a> {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub owner_user_id: Uuid,
    pub title: &'a str,
    pub subject: &'a str,
    pub grade_level: &'a str,
    pub language: &'a str,
    pub status: &'a str,
    pub visibility: &'a str,
    pub tags: &'a [String],
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Pointer move applied when a version is appended; `None` keeps the status.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = lessons)]
pub(crate) struct LessonPointerChangeset<'a> {
    pub current_version_id: Option<Uuid>,
    pub status: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = lesson_versions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LessonVersionRow {
    pub id: Uuid,
    pub lesson_id: Uuid,
    pub version_no: i32,
    pub objective: Option<String>,
    pub duration_minutes: Option<i32>,
    pub teacher_script_md: Option<String>,
    pub materials: Value,
    pub flow: Value,
    pub differentiation: Value,
    pub assessments: Value,
    pub accommodations: Value,
    pub source: Value,
    pub created_by_user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = lesson_versions)]
pub(crate) struct NewLessonVersionRow<'a> {
    pub id: Uuid,
    pub lesson_id: Uuid,
    pub version_no: i32,
    pub objective: Option<&'a str>,
    pub duration_minutes: Option<i32>,
    pub teacher_script_md: Option<&'a str>,
    pub materials: Value,
    pub flow: Value,
    pub differentiation: Value,
    pub assessments: Value,
    pub accommodations: Value,
    pub source: Value,
    pub created_by_user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = lesson_blocks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LessonBlockRow {
    pub id: Uuid,
    pub lesson_version_id: Uuid,
    pub block_type: String,
    pub sequence: i32,
    pub content_md: String,
    pub est_minutes: Option<i32>,
    pub metadata: Value,
}

// ---------------------------------------------------------------------------
// Standards models
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = standards_frameworks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct StandardsFrameworkRow {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub jurisdiction: Option<String>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = standards)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct StandardRow {
    pub id: Uuid,
    pub framework_id: Uuid,
    pub code: String,
    pub grade_band: Option<String>,
    pub subject: String,
    pub description: String,
    pub tags: Vec<String>,
    pub metadata: Value,
}

#[derive(Debug, Clone, Copy, Insertable)]
#[diesel(table_name = lesson_standards)]
pub(crate) struct LessonStandardRow {
    pub lesson_version_id: Uuid,
    pub standard_id: Uuid,
}

// ---------------------------------------------------------------------------
// Generation job models
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = generation_jobs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct GenerationJobRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub prompt_payload: Value,
    pub result_payload: Option<Value>,
    pub error_message: Option<String>,
    pub lesson_id: Option<Uuid>,
    pub lesson_version_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = generation_jobs)]
pub(crate) struct NewGenerationJobRow<'a> {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub status: &'a str,
    pub prompt_payload: &'a Value,
    pub created_at: DateTime<Utc>,
}

/// Terminal update written when a job finishes.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = generation_jobs)]
pub(crate) struct FinishJobChangeset<'a> {
    pub status: &'a str,
    pub result_payload: Option<Value>,
    pub error_message: Option<&'a str>,
    pub lesson_id: Option<Uuid>,
    pub lesson_version_id: Option<Uuid>,
    pub completed_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Event and metric models
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct EventRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = metrics_daily)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct MetricRow {
    pub tenant_id: Uuid,
    pub metric_date: NaiveDate,
    pub metric_name: String,
    pub value: i64,
}

// ---------------------------------------------------------------------------
// Share and LMS models
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = shares)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ShareRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub lesson_id: Uuid,
    pub lesson_version_id: Uuid,
    pub token: String,
    pub created_by_user_id: Option<Uuid>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = lms_connections)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LmsConnectionRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub provider: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = lms_pushes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LmsPushRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub connection_id: Uuid,
    pub lesson_id: Uuid,
    pub lesson_version_id: Option<Uuid>,
    pub course_id: String,
    pub topic_id: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub status: String,
    pub external_assignment_id: Option<String>,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}
