//! Readiness probe that pings PostgreSQL through the pool.

use async_trait::async_trait;
use tracing::warn;

use crate::domain::ports::{ReadinessError, ReadinessProbe};

use super::pool::DbPool;

/// Reports ready while `SELECT 1` succeeds on a pooled connection.
#[derive(Clone)]
pub struct DieselReadinessProbe {
    pool: DbPool,
}

impl DieselReadinessProbe {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReadinessProbe for DieselReadinessProbe {
    async fn check(&self) -> Result<(), ReadinessError> {
        self.pool.ping().await.map_err(|err| {
            warn!(error = %err, "database readiness check failed");
            ReadinessError::unavailable(err.to_string())
        })
    }
}
