//! Tenant analytics handlers.
//!
//! ```text
//! GET  /api/v1/analytics/summary?days=30
//! POST /api/v1/analytics/rebuild
//! ```

use actix_web::{get, post, web};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::domain::{AnalyticsSummary, DEFAULT_SUMMARY_DAYS, Error, MAX_SUMMARY_DAYS};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::{current_admin, current_user};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, out_of_range_error};

#[derive(Debug, Default, Deserialize)]
pub(super) struct SummaryQuery {
    days: Option<i64>,
}

impl SummaryQuery {
    fn days(&self) -> Result<u32, Error> {
        let Some(days) = self.days else {
            return Ok(DEFAULT_SUMMARY_DAYS);
        };
        u32::try_from(days)
            .ok()
            .filter(|days| (1..=MAX_SUMMARY_DAYS).contains(days))
            .ok_or_else(|| {
                out_of_range_error(
                    FieldName::new("days"),
                    format!("days must be between 1 and {MAX_SUMMARY_DAYS}"),
                )
            })
    }
}

/// Metric totals over the requested window.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummaryResponse {
    #[schema(example = "2026-09-18")]
    pub window_start: String,
    #[schema(example = "2026-10-17")]
    pub window_end: String,
    pub lessons_created: i64,
    pub lessons_generated: i64,
    pub lessons_differentiated: i64,
    pub exports: i64,
    pub lms_pushes: i64,
    pub shares_created: i64,
    pub total_lessons: i64,
    pub estimated_time_saved_minutes: i64,
}

impl From<AnalyticsSummary> for AnalyticsSummaryResponse {
    fn from(value: AnalyticsSummary) -> Self {
        let (start, end) = value.window;
        let totals = value.totals;
        Self {
            window_start: start.to_string(),
            window_end: end.to_string(),
            lessons_created: totals.lessons_created,
            lessons_generated: totals.lessons_generated,
            lessons_differentiated: totals.lessons_differentiated,
            exports: totals.exports,
            lms_pushes: totals.lms_pushes,
            shares_created: totals.shares_created,
            total_lessons: value.total_lessons,
            estimated_time_saved_minutes: value.estimated_time_saved_minutes,
        }
    }
}

/// Rebuild acknowledgement.
#[derive(Debug, Serialize, ToSchema)]
pub struct RebuildResponse {
    /// Daily aggregate rows written.
    pub rows: u64,
}

/// Summarise the caller's tenant activity.
#[utoipa::path(
    get,
    path = "/api/v1/analytics/summary",
    params(("days" = Option<u32>, Query, description = "Window length, 1 to 90 (default 30)")),
    responses(
        (status = 200, description = "Summary", body = AnalyticsSummaryResponse),
        (status = 400, description = "days out of range", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["analytics"],
    operation_id = "analyticsSummary"
)]
#[get("/analytics/summary")]
pub async fn summary(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<SummaryQuery>,
) -> ApiResult<web::Json<AnalyticsSummaryResponse>> {
    let days = query.days()?;
    let user = current_user(&state, &session).await?;
    let report = state.analytics.summary(&user.tenant_id, days).await?;
    Ok(web::Json(AnalyticsSummaryResponse::from(report)))
}

/// Recompute the tenant's daily aggregates from the event log.
#[utoipa::path(
    post,
    path = "/api/v1/analytics/rebuild",
    responses(
        (status = 200, description = "Aggregates rebuilt", body = RebuildResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema)
    ),
    tags = ["analytics"],
    operation_id = "rebuildAnalytics"
)]
#[post("/analytics/rebuild")]
pub async fn rebuild(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<RebuildResponse>> {
    let admin = current_admin(&state, &session).await?;
    let rows = state.metrics_rebuild.rebuild_metrics(&admin.tenant_id).await?;
    info!(tenant_id = %admin.tenant_id, rows, "metrics rebuilt");
    Ok(web::Json(RebuildResponse { rows }))
}
