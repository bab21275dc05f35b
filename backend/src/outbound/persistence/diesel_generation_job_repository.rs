//! PostgreSQL-backed `GenerationJobRepository` implementation using Diesel ORM.
//!
//! Jobs start as `processing` and may be finished exactly once; the finishing
//! update is guarded on the current status so a second call cannot overwrite
//! a terminal row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::ports::{GenerationJobRepository, GenerationJobRepositoryError};
use crate::domain::{
    GenerationJob, GenerationJobId, JobOutcome, JobStatus, LessonId, TenantId, UserId, VersionId,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{FinishJobChangeset, GenerationJobRow, NewGenerationJobRow};
use super::pool::{DbPool, PoolError};
use super::schema::generation_jobs;

/// Diesel-backed implementation of the `GenerationJobRepository` port.
#[derive(Clone)]
pub struct DieselGenerationJobRepository {
    pool: DbPool,
}

impl DieselGenerationJobRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> GenerationJobRepositoryError {
    map_basic_pool_error(error, GenerationJobRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> GenerationJobRepositoryError {
    map_basic_diesel_error(
        error,
        GenerationJobRepositoryError::query,
        GenerationJobRepositoryError::connection,
    )
}

fn row_to_job(row: GenerationJobRow) -> Result<GenerationJob, GenerationJobRepositoryError> {
    let status: JobStatus = row
        .status
        .parse()
        .map_err(GenerationJobRepositoryError::query)?;
    Ok(GenerationJob {
        id: GenerationJobId::from_uuid(row.id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        user_id: UserId::from_uuid(row.user_id),
        status,
        prompt_payload: row.prompt_payload,
        result_payload: row.result_payload,
        error_message: row.error_message,
        lesson_id: row.lesson_id.map(LessonId::from_uuid),
        lesson_version_id: row.lesson_version_id.map(VersionId::from_uuid),
        created_at: row.created_at,
        completed_at: row.completed_at,
    })
}

fn finish_changeset(outcome: &JobOutcome, completed_at: DateTime<Utc>) -> FinishJobChangeset<'_> {
    let (lesson_id, lesson_version_id, error_message) = match outcome {
        JobOutcome::Completed {
            lesson_id,
            lesson_version_id,
            ..
        } => (
            Some(*lesson_id.as_uuid()),
            Some(*lesson_version_id.as_uuid()),
            None,
        ),
        JobOutcome::Failed { error_message } => (None, None, Some(error_message.as_str())),
    };
    FinishJobChangeset {
        status: outcome.status().as_str(),
        result_payload: outcome.result_payload(),
        error_message,
        lesson_id,
        lesson_version_id,
        completed_at,
    }
}

#[async_trait]
impl GenerationJobRepository for DieselGenerationJobRepository {
    async fn start_job(
        &self,
        tenant_id: &TenantId,
        user_id: &UserId,
        prompt_payload: &Value,
        started_at: DateTime<Utc>,
    ) -> Result<GenerationJob, GenerationJobRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewGenerationJobRow {
            id: Uuid::new_v4(),
            tenant_id: *tenant_id.as_uuid(),
            user_id: *user_id.as_uuid(),
            status: JobStatus::Processing.as_str(),
            prompt_payload,
            created_at: started_at,
        };
        let stored: GenerationJobRow = diesel::insert_into(generation_jobs::table)
            .values(&row)
            .returning(GenerationJobRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        row_to_job(stored)
    }

    async fn finish_job(
        &self,
        job_id: &GenerationJobId,
        outcome: &JobOutcome,
        completed_at: DateTime<Utc>,
    ) -> Result<GenerationJob, GenerationJobRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated: Option<GenerationJobRow> = diesel::update(
            generation_jobs::table
                .filter(generation_jobs::id.eq(job_id.as_uuid()))
                .filter(generation_jobs::status.eq(JobStatus::Processing.as_str())),
        )
        .set(&finish_changeset(outcome, completed_at))
        .returning(GenerationJobRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(map_diesel_error)?;

        match updated {
            Some(row) => row_to_job(row),
            None => {
                let exists: Option<Uuid> = generation_jobs::table
                    .filter(generation_jobs::id.eq(job_id.as_uuid()))
                    .select(generation_jobs::id)
                    .first(&mut conn)
                    .await
                    .optional()
                    .map_err(map_diesel_error)?;
                Err(match exists {
                    Some(_) => GenerationJobRepositoryError::already_finished(job_id.to_string()),
                    None => GenerationJobRepositoryError::query("generation job not found"),
                })
            }
        }
    }
}
