//! Port abstraction for lesson and version persistence.
//!
//! Every mutating method runs in a single transaction together with the
//! audit event it is handed, so the event log and the daily metrics never
//! drift from the lesson tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Lesson, LessonDetail, LessonFilters, LessonHeader, LessonId, LessonStatus, LessonVersion,
    NewEvent, RestoredVersion, StandardId, TenantId, UserId, VersionDraft, VersionId,
};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by lesson repository adapters.
    pub enum LessonRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "lesson repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "lesson repository query failed: {message}",
        /// The lesson does not exist in the caller's tenant.
        LessonNotFound => "lesson not found",
        /// A concurrent writer claimed the same version number.
        Conflict { message: String } => "lesson version conflict: {message}",
    }
}

/// A lesson and its first version, inserted together.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLesson {
    pub lesson_id: LessonId,
    pub tenant_id: TenantId,
    pub owner_user_id: UserId,
    pub header: LessonHeader,
    pub first_version: VersionDraft,
    /// Standards linked to the first version.
    pub standard_ids: Vec<StandardId>,
    pub created_at: DateTime<Utc>,
}

/// A version appended to an existing lesson.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionAppend {
    pub tenant_id: TenantId,
    pub lesson_id: LessonId,
    pub created_by_user_id: Option<UserId>,
    pub draft: VersionDraft,
    /// Replaces the lesson status when present.
    pub status: Option<LessonStatus>,
    pub created_at: DateTime<Utc>,
}

/// Result of a pointer move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    Restored(RestoredVersion),
    LessonMissing,
    VersionMissing,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LessonRepository: Send + Sync {
    /// Insert a lesson, version #1, its standards links, and `event`, then
    /// point the lesson at the new version.
    async fn create_lesson(
        &self,
        lesson: &NewLesson,
        event: &NewEvent,
    ) -> Result<LessonDetail, LessonRepositoryError>;

    /// Number, insert, and point at a new version.
    ///
    /// Version numbering is serialised per lesson so concurrent appends
    /// never share a number or leave a gap.
    async fn append_version<'e>(
        &self,
        append: &VersionAppend,
        event: Option<&'e NewEvent>,
    ) -> Result<LessonVersion, LessonRepositoryError>;

    /// Point the lesson at an existing version without creating one.
    async fn restore_version(
        &self,
        tenant_id: &TenantId,
        lesson_id: &LessonId,
        version_no: u32,
    ) -> Result<RestoreOutcome, LessonRepositoryError>;

    /// Fetch a lesson with all versions, scoped to `tenant_id`.
    async fn find_lesson(
        &self,
        tenant_id: &TenantId,
        lesson_id: &LessonId,
    ) -> Result<Option<LessonDetail>, LessonRepositoryError>;

    /// Fetch only the lesson header, scoped to `tenant_id`.
    async fn find_header(
        &self,
        tenant_id: &TenantId,
        lesson_id: &LessonId,
    ) -> Result<Option<Lesson>, LessonRepositoryError>;

    /// Fetch one version by id regardless of tenant (share resolution).
    async fn find_version(
        &self,
        version_id: &VersionId,
    ) -> Result<Option<LessonVersion>, LessonRepositoryError>;

    /// Tenant lessons matching `filters`, most recently updated first.
    async fn list_lessons(
        &self,
        tenant_id: &TenantId,
        filters: &LessonFilters,
    ) -> Result<Vec<Lesson>, LessonRepositoryError>;

    /// Count of lessons in the tenant.
    async fn count_lessons(&self, tenant_id: &TenantId) -> Result<i64, LessonRepositoryError>;
}

/// Repository used when no database is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureLessonRepository;

fn unavailable() -> LessonRepositoryError {
    LessonRepositoryError::connection("database not configured")
}

#[async_trait]
impl LessonRepository for FixtureLessonRepository {
    async fn create_lesson(
        &self,
        _lesson: &NewLesson,
        _event: &NewEvent,
    ) -> Result<LessonDetail, LessonRepositoryError> {
        Err(unavailable())
    }

    async fn append_version<'e>(
        &self,
        _append: &VersionAppend,
        _event: Option<&'e NewEvent>,
    ) -> Result<LessonVersion, LessonRepositoryError> {
        Err(unavailable())
    }

    async fn restore_version(
        &self,
        _tenant_id: &TenantId,
        _lesson_id: &LessonId,
        _version_no: u32,
    ) -> Result<RestoreOutcome, LessonRepositoryError> {
        Err(unavailable())
    }

    async fn find_lesson(
        &self,
        _tenant_id: &TenantId,
        _lesson_id: &LessonId,
    ) -> Result<Option<LessonDetail>, LessonRepositoryError> {
        Ok(None)
    }

    async fn find_header(
        &self,
        _tenant_id: &TenantId,
        _lesson_id: &LessonId,
    ) -> Result<Option<Lesson>, LessonRepositoryError> {
        Ok(None)
    }

    async fn find_version(
        &self,
        _version_id: &VersionId,
    ) -> Result<Option<LessonVersion>, LessonRepositoryError> {
        Ok(None)
    }

    async fn list_lessons(
        &self,
        _tenant_id: &TenantId,
        _filters: &LessonFilters,
    ) -> Result<Vec<Lesson>, LessonRepositoryError> {
        Ok(Vec::new())
    }

    async fn count_lessons(&self, _tenant_id: &TenantId) -> Result<i64, LessonRepositoryError> {
        Ok(0)
    }
}
