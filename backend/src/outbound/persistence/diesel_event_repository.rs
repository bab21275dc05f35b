//! PostgreSQL-backed `EventRepository` implementation using Diesel ORM.
//!
//! Events are append-only. `metrics_daily` is a derived aggregate: every
//! counted event bumps its row in the same transaction, and
//! [`EventRepository::rebuild_metrics`] recomputes a tenant's rows from the
//! log when the two are suspected to have drifted.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::info;

use crate::domain::ports::{EventRepository, EventRepositoryError};
use crate::domain::{Event, MetricTotals, NewEvent, SummaryWindow, TenantId, metric_for_action};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::diesel_helpers::{insert_event, row_to_event};
use super::models::MetricRow;
use super::pool::{DbPool, PoolError};
use super::schema::{events, metrics_daily};

/// Diesel-backed implementation of the `EventRepository` port.
#[derive(Clone)]
pub struct DieselEventRepository {
    pool: DbPool,
}

impl DieselEventRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> EventRepositoryError {
    map_basic_pool_error(error, EventRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> EventRepositoryError {
    map_basic_diesel_error(
        error,
        EventRepositoryError::query,
        EventRepositoryError::connection,
    )
}

/// Count counted actions per day and metric.
fn aggregate_events(
    tenant_id: uuid::Uuid,
    logged: Vec<(String, DateTime<Utc>)>,
) -> Vec<MetricRow> {
    let mut counts: BTreeMap<(NaiveDate, &'static str), i64> = BTreeMap::new();
    for (action, created_at) in logged {
        if let Some(metric) = metric_for_action(&action) {
            *counts.entry((created_at.date_naive(), metric)).or_insert(0) += 1;
        }
    }
    counts
        .into_iter()
        .map(|((metric_date, metric_name), value)| MetricRow {
            tenant_id,
            metric_date,
            metric_name: metric_name.to_owned(),
            value,
        })
        .collect()
}

#[async_trait]
impl EventRepository for DieselEventRepository {
    async fn record(&self, event: &NewEvent) -> Result<Event, EventRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = conn
            .transaction(|conn| async move { insert_event(conn, event).await }.scope_boxed())
            .await
            .map_err(map_diesel_error)?;
        Ok(row_to_event(row))
    }

    async fn metric_totals(
        &self,
        tenant_id: &TenantId,
        window: SummaryWindow,
    ) -> Result<MetricTotals, EventRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<MetricRow> = metrics_daily::table
            .filter(metrics_daily::tenant_id.eq(tenant_id.as_uuid()))
            .filter(metrics_daily::metric_date.between(window.start, window.end))
            .select(MetricRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let mut totals = MetricTotals::default();
        for row in rows {
            totals.add(&row.metric_name, row.value);
        }
        Ok(totals)
    }

    async fn rebuild_metrics(&self, tenant_id: &TenantId) -> Result<u64, EventRepositoryError> {
        let tenant_uuid = *tenant_id.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = conn
            .transaction(|conn| {
                async move {
                    diesel::delete(
                        metrics_daily::table.filter(metrics_daily::tenant_id.eq(tenant_uuid)),
                    )
                    .execute(conn)
                    .await?;
                    let logged: Vec<(String, DateTime<Utc>)> = events::table
                        .filter(events::tenant_id.eq(tenant_uuid))
                        .select((events::action, events::created_at))
                        .load(conn)
                        .await?;
                    let rebuilt = aggregate_events(tenant_uuid, logged);
                    if !rebuilt.is_empty() {
                        diesel::insert_into(metrics_daily::table)
                            .values(&rebuilt)
                            .execute(conn)
                            .await?;
                    }
                    Ok(rebuilt.len())
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        info!(tenant_id = %tenant_id, rows, "daily metrics rebuilt");
        Ok(u64::try_from(rows).unwrap_or(u64::MAX))
    }
}
