//! Port abstraction for generation job audit rows.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::{GenerationJob, GenerationJobId, JobOutcome, TenantId, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by generation job repository adapters.
    pub enum GenerationJobRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "generation job repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "generation job repository query failed: {message}",
        /// The job is no longer processing.
        AlreadyFinished { job_id: String } => "generation job {job_id} already finished",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationJobRepository: Send + Sync {
    /// Insert a job in `processing`.
    async fn start_job(
        &self,
        tenant_id: &TenantId,
        user_id: &UserId,
        prompt_payload: &Value,
        started_at: DateTime<Utc>,
    ) -> Result<GenerationJob, GenerationJobRepositoryError>;

    /// Move a processing job to its terminal state.
    async fn finish_job(
        &self,
        job_id: &GenerationJobId,
        outcome: &JobOutcome,
        completed_at: DateTime<Utc>,
    ) -> Result<GenerationJob, GenerationJobRepositoryError>;
}

/// Job store used when no database is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureGenerationJobRepository;

#[async_trait]
impl GenerationJobRepository for FixtureGenerationJobRepository {
    async fn start_job(
        &self,
        _tenant_id: &TenantId,
        _user_id: &UserId,
        _prompt_payload: &Value,
        _started_at: DateTime<Utc>,
    ) -> Result<GenerationJob, GenerationJobRepositoryError> {
        Err(GenerationJobRepositoryError::connection("database not configured"))
    }

    async fn finish_job(
        &self,
        _job_id: &GenerationJobId,
        _outcome: &JobOutcome,
        _completed_at: DateTime<Utc>,
    ) -> Result<GenerationJob, GenerationJobRepositoryError> {
        Err(GenerationJobRepositoryError::connection("database not configured"))
    }
}
