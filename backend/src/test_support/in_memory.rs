//! In-memory lesson and event repositories sharing one store.
//!
//! Mutations take a single lock, so a lesson write and its event land
//! together the way they do inside a database transaction.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::ports::{
    EventRepository, EventRepositoryError, LessonRepository, LessonRepositoryError, NewLesson,
    RestoreOutcome, VersionAppend,
};
use crate::domain::{
    BlockDraft, BlockId, Event, EventId, Lesson, LessonBlock, LessonDetail, LessonFilters,
    LessonId, LessonVersion, MetricTotals, NewEvent, RestoredVersion, SummaryWindow, TenantId,
    UserId, VersionDraft, VersionId, next_version_no,
};

type MetricKey = (TenantId, NaiveDate, &'static str);

#[derive(Default)]
struct State {
    lessons: HashMap<LessonId, LessonDetail>,
    events: Vec<Event>,
    metrics: BTreeMap<MetricKey, i64>,
}

impl State {
    fn record(&mut self, event: &NewEvent) -> Event {
        let stored = Event {
            id: EventId::random(),
            tenant_id: event.tenant_id,
            user_id: event.user_id,
            action: event.action.clone(),
            metadata: event.metadata.clone(),
            created_at: event.occurred_at,
        };
        if let Some(metric) = event.metric() {
            *self
                .metrics
                .entry((event.tenant_id, event.metric_date(), metric))
                .or_insert(0) += 1;
        }
        self.events.push(stored.clone());
        stored
    }
}

/// Store backing both [`LessonRepository`] and [`EventRepository`].
#[derive(Default)]
pub struct InMemoryLessonStore {
    state: Mutex<State>,
}

impl InMemoryLessonStore {
    fn lock(&self) -> MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("in-memory store mutex"),
        }
    }

    /// Every stored event, in insertion order.
    pub fn events(&self) -> Vec<Event> {
        self.lock().events.clone()
    }

    /// Record an event written by a collaborating test repository.
    pub fn push_event(&self, event: &NewEvent) -> Event {
        self.lock().record(event)
    }

    /// Raw counter value for one day.
    pub fn metric_value(&self, tenant_id: TenantId, date: NaiveDate, metric: &'static str) -> i64 {
        self.lock()
            .metrics
            .get(&(tenant_id, date, metric))
            .copied()
            .unwrap_or(0)
    }

    /// Overwrite a counter, simulating drift between aggregates and events.
    pub fn set_metric(&self, tenant_id: TenantId, date: NaiveDate, metric: &'static str, value: i64) {
        self.lock().metrics.insert((tenant_id, date, metric), value);
    }
}

fn build_version(
    lesson_id: LessonId,
    version_no: u32,
    draft: &VersionDraft,
    created_by_user_id: Option<UserId>,
    created_at: chrono::DateTime<chrono::Utc>,
) -> LessonVersion {
    let id = VersionId::random();
    let mut blocks: Vec<LessonBlock> = draft
        .blocks
        .iter()
        .map(|block: &BlockDraft| LessonBlock {
            id: BlockId::random(),
            lesson_version_id: id,
            block_type: block.block_type.clone(),
            sequence: block.sequence,
            content_md: block.content_md.clone(),
            est_minutes: block.est_minutes,
            metadata: block.metadata.clone(),
        })
        .collect();
    blocks.sort_by_key(|block| block.sequence);
    LessonVersion {
        id,
        lesson_id,
        version_no,
        content: draft.content.clone(),
        blocks,
        created_by_user_id,
        created_at,
        published_at: None,
    }
}

#[async_trait]
impl LessonRepository for InMemoryLessonStore {
    async fn create_lesson(
        &self,
        lesson: &NewLesson,
        event: &NewEvent,
    ) -> Result<LessonDetail, LessonRepositoryError> {
        let mut state = self.lock();
        let version = build_version(
            lesson.lesson_id,
            1,
            &lesson.first_version,
            Some(lesson.owner_user_id),
            lesson.created_at,
        );
        let header = &lesson.header;
        let detail = LessonDetail {
            lesson: Lesson {
                id: lesson.lesson_id,
                tenant_id: lesson.tenant_id,
                owner_user_id: lesson.owner_user_id,
                title: header.title.clone(),
                subject: header.subject.clone(),
                grade_level: header.grade_level.clone(),
                language: header.language.clone(),
                status: header.status,
                visibility: header.visibility,
                tags: header.tags.clone(),
                current_version_id: Some(version.id),
                metadata: header.metadata.clone(),
                created_at: lesson.created_at,
                updated_at: lesson.created_at,
            },
            versions: vec![version],
        };
        state.lessons.insert(lesson.lesson_id, detail.clone());
        state.record(event);
        Ok(detail)
    }

    async fn append_version<'e>(
        &self,
        append: &VersionAppend,
        event: Option<&'e NewEvent>,
    ) -> Result<LessonVersion, LessonRepositoryError> {
        let mut state = self.lock();
        let detail = state
            .lessons
            .get_mut(&append.lesson_id)
            .filter(|detail| detail.lesson.tenant_id == append.tenant_id)
            .ok_or_else(LessonRepositoryError::lesson_not_found)?;
        let current_max = detail.versions.iter().map(|v| v.version_no).max();
        let version = build_version(
            append.lesson_id,
            next_version_no(current_max),
            &append.draft,
            append.created_by_user_id,
            append.created_at,
        );
        detail.lesson.current_version_id = Some(version.id);
        detail.lesson.updated_at = append.created_at;
        if let Some(status) = append.status {
            detail.lesson.status = status;
        }
        detail.versions.push(version.clone());
        if let Some(event) = event {
            state.record(event);
        }
        Ok(version)
    }

    async fn restore_version(
        &self,
        tenant_id: &TenantId,
        lesson_id: &LessonId,
        version_no: u32,
    ) -> Result<RestoreOutcome, LessonRepositoryError> {
        let mut state = self.lock();
        let Some(detail) = state
            .lessons
            .get_mut(lesson_id)
            .filter(|detail| detail.lesson.tenant_id == *tenant_id)
        else {
            return Ok(RestoreOutcome::LessonMissing);
        };
        let Some(version_id) = detail
            .versions
            .iter()
            .find(|version| version.version_no == version_no)
            .map(|version| version.id)
        else {
            return Ok(RestoreOutcome::VersionMissing);
        };
        detail.lesson.current_version_id = Some(version_id);
        Ok(RestoreOutcome::Restored(RestoredVersion {
            lesson_id: *lesson_id,
            current_version_id: version_id,
            restored_version: version_no,
        }))
    }

    async fn find_lesson(
        &self,
        tenant_id: &TenantId,
        lesson_id: &LessonId,
    ) -> Result<Option<LessonDetail>, LessonRepositoryError> {
        Ok(self
            .lock()
            .lessons
            .get(lesson_id)
            .filter(|detail| detail.lesson.tenant_id == *tenant_id)
            .cloned()
            .map(|mut detail| {
                detail.versions.sort_by_key(|version| version.version_no);
                detail
            }))
    }

    async fn find_header(
        &self,
        tenant_id: &TenantId,
        lesson_id: &LessonId,
    ) -> Result<Option<Lesson>, LessonRepositoryError> {
        Ok(self
            .find_lesson(tenant_id, lesson_id)
            .await?
            .map(|detail| detail.lesson))
    }

    async fn find_version(
        &self,
        version_id: &VersionId,
    ) -> Result<Option<LessonVersion>, LessonRepositoryError> {
        Ok(self
            .lock()
            .lessons
            .values()
            .flat_map(|detail| detail.versions.iter())
            .find(|version| version.id == *version_id)
            .cloned())
    }

    async fn list_lessons(
        &self,
        tenant_id: &TenantId,
        filters: &LessonFilters,
    ) -> Result<Vec<Lesson>, LessonRepositoryError> {
        let mut lessons: Vec<Lesson> = self
            .lock()
            .lessons
            .values()
            .map(|detail| detail.lesson.clone())
            .filter(|lesson| lesson.tenant_id == *tenant_id && filters.matches(lesson))
            .collect();
        lessons.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(lessons)
    }

    async fn count_lessons(&self, tenant_id: &TenantId) -> Result<i64, LessonRepositoryError> {
        let count = self
            .lock()
            .lessons
            .values()
            .filter(|detail| detail.lesson.tenant_id == *tenant_id)
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }
}

#[async_trait]
impl EventRepository for InMemoryLessonStore {
    async fn record(&self, event: &NewEvent) -> Result<Event, EventRepositoryError> {
        Ok(self.lock().record(event))
    }

    async fn metric_totals(
        &self,
        tenant_id: &TenantId,
        window: SummaryWindow,
    ) -> Result<MetricTotals, EventRepositoryError> {
        let mut totals = MetricTotals::default();
        for ((tenant, date, metric), value) in &self.lock().metrics {
            if tenant == tenant_id && window.contains(*date) {
                totals.add(metric, *value);
            }
        }
        Ok(totals)
    }

    async fn rebuild_metrics(&self, tenant_id: &TenantId) -> Result<u64, EventRepositoryError> {
        let mut state = self.lock();
        state.metrics.retain(|(tenant, _, _), _| tenant != tenant_id);
        let mut rebuilt: BTreeMap<MetricKey, i64> = BTreeMap::new();
        for event in state.events.iter().filter(|event| event.tenant_id == *tenant_id) {
            if let Some(metric) = crate::domain::metric_for_action(&event.action) {
                *rebuilt
                    .entry((event.tenant_id, event.created_at.date_naive(), metric))
                    .or_insert(0) += 1;
            }
        }
        let rows = u64::try_from(rebuilt.len()).unwrap_or(u64::MAX);
        state.metrics.extend(rebuilt);
        Ok(rows)
    }
}
