//! Port abstraction for the audit event log and daily metric aggregates.

use async_trait::async_trait;

use crate::domain::{Event, MetricTotals, NewEvent, SummaryWindow, TenantId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by event repository adapters.
    pub enum EventRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "event repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "event repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Append `event` and bump its metric for the event's UTC day, atomically.
    async fn record(&self, event: &NewEvent) -> Result<Event, EventRepositoryError>;

    /// Sum each metric for `tenant_id` over `window`.
    async fn metric_totals(
        &self,
        tenant_id: &TenantId,
        window: SummaryWindow,
    ) -> Result<MetricTotals, EventRepositoryError>;

    /// Replace the tenant's daily aggregates with counts recomputed from the
    /// event log. Returns the number of aggregate rows written.
    async fn rebuild_metrics(&self, tenant_id: &TenantId) -> Result<u64, EventRepositoryError>;
}

/// Event log used when no database is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureEventRepository;

#[async_trait]
impl EventRepository for FixtureEventRepository {
    async fn record(&self, _event: &NewEvent) -> Result<Event, EventRepositoryError> {
        Err(EventRepositoryError::connection("database not configured"))
    }

    async fn metric_totals(
        &self,
        _tenant_id: &TenantId,
        _window: SummaryWindow,
    ) -> Result<MetricTotals, EventRepositoryError> {
        Ok(MetricTotals::default())
    }

    async fn rebuild_metrics(&self, _tenant_id: &TenantId) -> Result<u64, EventRepositoryError> {
        Err(EventRepositoryError::connection("database not configured"))
    }
}
