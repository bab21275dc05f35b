//! Integration tests for `DieselEventRepository` against embedded PostgreSQL.

mod support;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use lessonplan::domain::ports::EventRepository;
use lessonplan::domain::{MetricTotals, NewEvent, SummaryWindow, TenantId, User, actions};
use lessonplan::outbound::persistence::DieselEventRepository;
use rstest::{fixture, rstest};

use support::{TestDatabase, test_database};

struct EventContext {
    database: TestDatabase,
    repository: DieselEventRepository,
    teacher: User,
}

impl EventContext {
    fn record(&self, tenant_id: TenantId, action: &str, occurred_at: DateTime<Utc>) {
        let event = NewEvent::new(tenant_id, Some(self.teacher.id), action, occurred_at)
            .with("lessonId", "2f4d7b0c-7d4e-4f0c-9a55-3a7c0a1c2b3d");
        let stored = self
            .database
            .runtime
            .block_on(self.repository.record(&event))
            .expect("event recorded");
        assert_eq!(stored.action, action);
    }

    fn totals(&self, tenant_id: &TenantId, window: SummaryWindow) -> MetricTotals {
        self.database
            .runtime
            .block_on(self.repository.metric_totals(tenant_id, window))
            .expect("totals load")
    }
}

fn march(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn march_window() -> SummaryWindow {
    SummaryWindow::ending(
        NaiveDate::from_ymd_opt(2026, 3, 31).expect("valid date"),
        31,
    )
}

#[fixture]
fn event_context() -> Option<EventContext> {
    let database = test_database(4)?;
    let teacher = database.seed_teacher("Lincoln Unified", "teacher@lincoln.example");
    let repository = DieselEventRepository::new(database.pool.clone());
    Some(EventContext {
        database,
        repository,
        teacher,
    })
}

#[rstest]
fn each_counted_event_bumps_its_daily_metric(event_context: Option<EventContext>) {
    let Some(context) = event_context else {
        return;
    };
    let tenant = context.teacher.tenant_id;

    context.record(tenant, actions::LESSON_CREATED, march(2, 9));
    assert_eq!(context.totals(&tenant, march_window()).lessons_created, 1);

    context.record(tenant, actions::LESSON_CREATED, march(2, 15));
    assert_eq!(context.totals(&tenant, march_window()).lessons_created, 2);
}

#[rstest]
fn uncounted_actions_leave_totals_alone(event_context: Option<EventContext>) {
    let Some(context) = event_context else {
        return;
    };
    let tenant = context.teacher.tenant_id;

    context.record(tenant, actions::USER_LOGGED_IN, march(3, 8));

    assert_eq!(
        context.totals(&tenant, march_window()),
        MetricTotals::default()
    );
}

#[rstest]
fn totals_respect_the_window_and_tenant(event_context: Option<EventContext>) {
    let Some(context) = event_context else {
        return;
    };
    let tenant = context.teacher.tenant_id;
    let stranger = context.database.seed_tenant("Franklin County");

    context.record(tenant, actions::LESSON_SHARED, march(10, 12));
    context.record(tenant, actions::LESSON_SHARED, march(1, 12));

    let last_week = SummaryWindow::ending(
        NaiveDate::from_ymd_opt(2026, 3, 14).expect("valid date"),
        7,
    );
    assert_eq!(context.totals(&tenant, last_week).shares_created, 1);
    assert_eq!(context.totals(&tenant, march_window()).shares_created, 2);
    assert_eq!(
        context.totals(&stranger, march_window()),
        MetricTotals::default()
    );
}

#[rstest]
fn rebuild_recomputes_the_same_totals_from_the_log(event_context: Option<EventContext>) {
    let Some(context) = event_context else {
        return;
    };
    let tenant = context.teacher.tenant_id;
    context.record(tenant, actions::LESSON_CREATED, march(2, 9));
    context.record(tenant, actions::LESSON_CREATED, march(2, 10));
    context.record(tenant, actions::LESSON_CREATED, march(4, 9));
    context.record(tenant, actions::LESSON_EXPORTED, march(4, 11));
    context.record(tenant, actions::USER_LOGGED_IN, march(4, 12));
    let before = context.totals(&tenant, march_window());

    let rows = context
        .database
        .runtime
        .block_on(context.repository.rebuild_metrics(&tenant))
        .expect("rebuild succeeds");

    // (2nd, created), (4th, created), (4th, exports)
    assert_eq!(rows, 3);
    assert_eq!(context.totals(&tenant, march_window()), before);
    assert_eq!(before.lessons_created, 3);
    assert_eq!(before.exports, 1);
}
