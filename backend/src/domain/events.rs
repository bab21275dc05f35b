//! Append-only audit events and the daily metrics derived from them.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ids::{EventId, TenantId, UserId};

/// Minutes credited to each generated lesson in the time-saved estimate.
pub const MINUTES_SAVED_PER_GENERATED_LESSON: i64 = 30;
/// Default analytics window in days.
pub const DEFAULT_SUMMARY_DAYS: u32 = 30;
/// Largest analytics window accepted.
pub const MAX_SUMMARY_DAYS: u32 = 90;

/// Actions recorded by the lesson workflows.
pub mod actions {
    pub const LESSON_CREATED: &str = "lesson_created";
    pub const LESSON_GENERATED: &str = "lesson_generated";
    pub const LESSON_DIFFERENTIATED: &str = "lesson_differentiated";
    pub const LESSON_EXPORTED: &str = "lesson_exported";
    pub const LMS_PUSH: &str = "lms_push";
    pub const LESSON_SHARED: &str = "lesson_shared";
    pub const USER_LOGGED_IN: &str = "user_logged_in";
}

/// Daily counter names.
pub mod metrics {
    pub const LESSONS_CREATED: &str = "lessons_created";
    pub const LESSONS_GENERATED: &str = "lessons_generated";
    pub const LESSONS_DIFFERENTIATED: &str = "lessons_differentiated";
    pub const EXPORTS: &str = "exports";
    pub const LMS_PUSHES: &str = "lms_pushes";
    pub const SHARES_CREATED: &str = "shares_created";
}

/// Metric incremented for `action`, if the action is counted at all.
pub fn metric_for_action(action: &str) -> Option<&'static str> {
    match action {
        actions::LESSON_CREATED => Some(metrics::LESSONS_CREATED),
        actions::LESSON_GENERATED => Some(metrics::LESSONS_GENERATED),
        actions::LESSON_DIFFERENTIATED => Some(metrics::LESSONS_DIFFERENTIATED),
        actions::LESSON_EXPORTED => Some(metrics::EXPORTS),
        actions::LMS_PUSH => Some(metrics::LMS_PUSHES),
        actions::LESSON_SHARED => Some(metrics::SHARES_CREATED),
        _ => None,
    }
}

/// Event about to be appended.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub tenant_id: TenantId,
    pub user_id: Option<UserId>,
    pub action: String,
    pub metadata: Map<String, Value>,
    pub occurred_at: DateTime<Utc>,
}

impl NewEvent {
    pub fn new(
        tenant_id: TenantId,
        user_id: Option<UserId>,
        action: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            tenant_id,
            user_id,
            action: action.into(),
            metadata: Map::new(),
            occurred_at,
        }
    }

    /// Add a metadata entry.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_owned(), value.into());
        self
    }

    /// Metric this event increments, if any.
    pub fn metric(&self) -> Option<&'static str> {
        metric_for_action(&self.action)
    }

    /// UTC calendar day the metric increment is attributed to.
    pub fn metric_date(&self) -> NaiveDate {
        self.occurred_at.date_naive()
    }
}

/// Persisted audit event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub tenant_id: TenantId,
    pub user_id: Option<UserId>,
    pub action: String,
    pub metadata: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

/// Inclusive UTC date range `[today - (days - 1), today]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SummaryWindow {
    /// Window ending on `today` covering `days` calendar days.
    pub fn ending(today: NaiveDate, days: u32) -> Self {
        let span = u64::from(days.max(1) - 1);
        let start = today.checked_sub_days(Days::new(span)).unwrap_or(NaiveDate::MIN);
        Self { start, end: today }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Per-metric totals for one tenant over a window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricTotals {
    pub lessons_created: i64,
    pub lessons_generated: i64,
    pub lessons_differentiated: i64,
    pub exports: i64,
    pub lms_pushes: i64,
    pub shares_created: i64,
}

impl MetricTotals {
    /// Add `value` to the named metric; unknown names are ignored.
    pub fn add(&mut self, metric: &str, value: i64) {
        let slot = match metric {
            metrics::LESSONS_CREATED => &mut self.lessons_created,
            metrics::LESSONS_GENERATED => &mut self.lessons_generated,
            metrics::LESSONS_DIFFERENTIATED => &mut self.lessons_differentiated,
            metrics::EXPORTS => &mut self.exports,
            metrics::LMS_PUSHES => &mut self.lms_pushes,
            metrics::SHARES_CREATED => &mut self.shares_created,
            _ => return,
        };
        *slot += value;
    }
}

/// Analytics summary returned to dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub window: (NaiveDate, NaiveDate),
    pub totals: MetricTotals,
    pub total_lessons: i64,
    pub estimated_time_saved_minutes: i64,
}

impl AnalyticsSummary {
    pub fn new(window: SummaryWindow, totals: MetricTotals, total_lessons: i64) -> Self {
        Self {
            window: (window.start, window.end),
            totals,
            total_lessons,
            estimated_time_saved_minutes: totals.lessons_generated
                * MINUTES_SAVED_PER_GENERATED_LESSON,
        }
    }
}
