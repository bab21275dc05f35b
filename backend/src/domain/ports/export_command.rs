//! Driving port for lesson exports.

use async_trait::async_trait;

use crate::domain::{Error, ExportArtifact, ExportFormat, LessonId, User};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExportCommand: Send + Sync {
    /// Export the lesson's latest version and record the export.
    async fn export_lesson(
        &self,
        actor: &User,
        lesson_id: &LessonId,
        format: ExportFormat,
    ) -> Result<ExportArtifact, Error>;
}
