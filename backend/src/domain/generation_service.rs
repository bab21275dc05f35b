//! Lesson generation orchestration.
//!
//! A job row is written before any work starts and finalised afterwards in
//! its own transaction, so failed attempts stay auditable even when the
//! lesson itself was never persisted. Provider failures never surface to
//! the caller; they fall back to the deterministic template lesson.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::{Map, json};
use tracing::{error, info, warn};

use crate::domain::port_error_mapping::{map_job_error, map_lesson_error};
use crate::domain::ports::{
    ContentGenerator, ContentSource, GenerationCommand, GenerationJobRepository,
    GenerationMetrics, GenerationOutcome, LessonRepository, NewLesson, NoOpGenerationMetrics,
    StandardsRepository,
};
use crate::domain::standards_service::StandardsService;
use crate::domain::{
    Error, GeneratedLesson, GenerationInput, GenerationJobId, JobOutcome, LessonDetail,
    LessonHeader, LessonId, LessonStatus, NewEvent, Standard, User, VersionDraft, Visibility,
    actions, fallback_lesson, parse_provider_output,
};

/// Generation service implementing [`GenerationCommand`].
pub struct GenerationService<J, L, S> {
    jobs: Arc<J>,
    lessons: Arc<L>,
    standards: StandardsService<S>,
    generator: Arc<dyn ContentGenerator>,
    metrics: Arc<dyn GenerationMetrics>,
    prompt_template: String,
    clock: Arc<dyn Clock>,
}

impl<J, L, S> GenerationService<J, L, S> {
    pub fn new(
        jobs: Arc<J>,
        lessons: Arc<L>,
        standards: StandardsService<S>,
        generator: Arc<dyn ContentGenerator>,
        prompt_template: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            jobs,
            lessons,
            standards,
            generator,
            metrics: Arc::new(NoOpGenerationMetrics),
            prompt_template: prompt_template.into(),
            clock,
        }
    }

    /// Replace the default no-op content source counter.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn GenerationMetrics>) -> Self {
        self.metrics = metrics;
        self
    }
}

impl<J, L, S> GenerationService<J, L, S>
where
    J: GenerationJobRepository,
    L: LessonRepository,
    S: StandardsRepository,
{
    async fn generate_content(&self, input: &GenerationInput) -> GeneratedLesson {
        let prompt = input.render_prompt(&self.prompt_template);
        let (source, lesson) = match self.generator.generate(&prompt).await {
            Ok(reply) => match parse_provider_output(&reply.text, input, &reply.model) {
                Ok(lesson) => (ContentSource::Provider, lesson),
                Err(err) => {
                    warn!(error = %err, model = %reply.model, "unusable model output; using fallback lesson");
                    (ContentSource::Fallback, fallback_lesson(input))
                }
            },
            Err(err) => {
                warn!(error = %err, "content generator failed; using fallback lesson");
                (ContentSource::Fallback, fallback_lesson(input))
            }
        };
        if let Err(err) = self.metrics.record_content(source).await {
            warn!(error = %err, %source, "failed to record generation metric");
        }
        lesson
    }

    async fn produce(
        &self,
        actor: &User,
        input: &GenerationInput,
        job_id: GenerationJobId,
    ) -> Result<(LessonDetail, Vec<Standard>), Error> {
        let generated = self.generate_content(input).await;
        let standards = self.standards.resolve_for(input).await?;

        let now = self.clock.utc();
        let lesson_id = LessonId::random();
        let lesson = NewLesson {
            lesson_id,
            tenant_id: actor.tenant_id,
            owner_user_id: actor.id,
            header: LessonHeader {
                title: generated.title,
                subject: input.subject.clone(),
                grade_level: input.grade_level.clone(),
                language: generated.language,
                status: LessonStatus::Draft,
                visibility: Visibility::Private,
                tags: input.focus_keywords.clone(),
                metadata: Map::new(),
            },
            first_version: VersionDraft::from_content(generated.content),
            standard_ids: standards.iter().map(|standard| standard.id).collect(),
            created_at: now,
        };
        let event = NewEvent::new(actor.tenant_id, Some(actor.id), actions::LESSON_GENERATED, now)
            .with("lesson_id", lesson_id.to_string())
            .with("job_id", job_id.to_string());

        let detail = self
            .lessons
            .create_lesson(&lesson, &event)
            .await
            .map_err(map_lesson_error)?;
        Ok((detail, standards))
    }
}

fn invalid_input(err: &crate::domain::GenerationInputError) -> Error {
    Error::invalid_request(err.to_string()).with_details(json!({
        "field": err.field(),
        "code": "invalid_field",
    }))
}

#[async_trait]
impl<J, L, S> GenerationCommand for GenerationService<J, L, S>
where
    J: GenerationJobRepository,
    L: LessonRepository,
    S: StandardsRepository,
{
    async fn generate_lesson(
        &self,
        actor: &User,
        input: GenerationInput,
    ) -> Result<GenerationOutcome, Error> {
        input.validate().map_err(|err| invalid_input(&err))?;
        let prompt_payload = serde_json::to_value(&input)
            .map_err(|err| Error::internal(format!("failed to serialise prompt payload: {err}")))?;
        let job = self
            .jobs
            .start_job(&actor.tenant_id, &actor.id, &prompt_payload, self.clock.utc())
            .await
            .map_err(map_job_error)?;

        match self.produce(actor, &input, job.id).await {
            Ok((lesson, standards)) => {
                let current_version_id = lesson.lesson.current_version_id.ok_or_else(|| {
                    Error::internal("generated lesson has no current version")
                })?;
                let outcome = JobOutcome::Completed {
                    lesson_id: lesson.lesson.id,
                    lesson_version_id: current_version_id,
                    title: lesson.lesson.title.clone(),
                };
                let job = self
                    .jobs
                    .finish_job(&job.id, &outcome, self.clock.utc())
                    .await
                    .map_err(map_job_error)?;
                info!(job_id = %job.id, lesson_id = %lesson.lesson.id, "lesson generated");
                Ok(GenerationOutcome {
                    job,
                    lesson,
                    standards,
                })
            }
            Err(err) => {
                error!(job_id = %job.id, error = %err, "lesson generation failed");
                let outcome = JobOutcome::Failed {
                    error_message: err.message().to_owned(),
                };
                if let Err(finish_err) = self
                    .jobs
                    .finish_job(&job.id, &outcome, self.clock.utc())
                    .await
                {
                    error!(job_id = %job.id, error = %finish_err, "failed to record job failure");
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[path = "generation_service_tests.rs"]
mod tests;
