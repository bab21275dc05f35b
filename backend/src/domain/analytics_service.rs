//! Tenant analytics over the daily metric aggregates.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::port_error_mapping::{map_event_error, map_lesson_error};
use crate::domain::ports::{
    AnalyticsQuery, EventRepository, LessonRepository, MetricsRebuildCommand,
};
use crate::domain::{AnalyticsSummary, Error, MAX_SUMMARY_DAYS, SummaryWindow, TenantId};

/// Analytics service implementing the analytics driving ports.
#[derive(Clone)]
pub struct AnalyticsService<E, L> {
    events: Arc<E>,
    lessons: Arc<L>,
    clock: Arc<dyn Clock>,
}

impl<E, L> AnalyticsService<E, L> {
    pub fn new(events: Arc<E>, lessons: Arc<L>, clock: Arc<dyn Clock>) -> Self {
        Self {
            events,
            lessons,
            clock,
        }
    }
}

#[async_trait]
impl<E, L> AnalyticsQuery for AnalyticsService<E, L>
where
    E: EventRepository,
    L: LessonRepository,
{
    async fn summary(&self, tenant_id: &TenantId, days: u32) -> Result<AnalyticsSummary, Error> {
        if !(1..=MAX_SUMMARY_DAYS).contains(&days) {
            return Err(Error::invalid_request(format!(
                "days must be between 1 and {MAX_SUMMARY_DAYS}"
            )));
        }
        let window = SummaryWindow::ending(self.clock.utc().date_naive(), days);
        let totals = self
            .events
            .metric_totals(tenant_id, window)
            .await
            .map_err(map_event_error)?;
        let total_lessons = self
            .lessons
            .count_lessons(tenant_id)
            .await
            .map_err(map_lesson_error)?;
        Ok(AnalyticsSummary::new(window, totals, total_lessons))
    }
}

#[async_trait]
impl<E, L> MetricsRebuildCommand for AnalyticsService<E, L>
where
    E: EventRepository,
    L: LessonRepository,
{
    async fn rebuild_metrics(&self, tenant_id: &TenantId) -> Result<u64, Error> {
        let rows = self
            .events
            .rebuild_metrics(tenant_id)
            .await
            .map_err(map_event_error)?;
        info!(tenant_id = %tenant_id, rows, "daily metrics rebuilt from event log");
        Ok(rows)
    }
}
