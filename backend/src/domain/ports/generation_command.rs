//! Driving port for lesson generation.

use async_trait::async_trait;

use crate::domain::{Error, GenerationInput, GenerationJob, LessonDetail, Standard, User};

/// Everything produced by one successful generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOutcome {
    /// The job row in its terminal `completed` state.
    pub job: GenerationJob,
    pub lesson: LessonDetail,
    /// Standards aligned to version #1.
    pub standards: Vec<Standard>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationCommand: Send + Sync {
    /// Generate, align, and persist a new lesson, auditing the attempt.
    async fn generate_lesson(
        &self,
        actor: &User,
        input: GenerationInput,
    ) -> Result<GenerationOutcome, Error>;
}
