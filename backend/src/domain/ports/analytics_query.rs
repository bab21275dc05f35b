//! Driving ports for tenant analytics.

use async_trait::async_trait;

use crate::domain::{AnalyticsSummary, Error, TenantId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalyticsQuery: Send + Sync {
    /// Metric totals over the last `days` UTC days, today included.
    async fn summary(&self, tenant_id: &TenantId, days: u32) -> Result<AnalyticsSummary, Error>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetricsRebuildCommand: Send + Sync {
    /// Recompute the tenant's daily aggregates from the event log.
    async fn rebuild_metrics(&self, tenant_id: &TenantId) -> Result<u64, Error>;
}
