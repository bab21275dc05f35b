//! Integration tests for `DieselLessonRepository` against embedded PostgreSQL.

mod support;

use futures_util::future::join_all;
use lessonplan::domain::ports::{LessonRepository, NewLesson, RestoreOutcome, VersionAppend};
use lessonplan::domain::{
    LessonDetail, LessonHeader, LessonId, LessonStatus, NewEvent, TenantId, User, VersionContent,
    VersionDraft, Visibility, actions,
};
use lessonplan::outbound::persistence::DieselLessonRepository;
use rstest::{fixture, rstest};
use serde_json::Map;

use support::{TestDatabase, now, test_database};

const CONCURRENT_APPENDS: u32 = 8;

struct LessonContext {
    database: TestDatabase,
    repository: DieselLessonRepository,
    teacher: User,
    lesson: LessonDetail,
}

fn draft(objective: &str) -> VersionDraft {
    VersionDraft::from_content(VersionContent {
        objective: Some(objective.to_owned()),
        ..VersionContent::default()
    })
}

fn append_for(teacher: &User, lesson_id: LessonId, objective: &str) -> VersionAppend {
    VersionAppend {
        tenant_id: teacher.tenant_id,
        lesson_id,
        created_by_user_id: Some(teacher.id),
        draft: draft(objective),
        status: None,
        created_at: now(),
    }
}

#[fixture]
fn lesson_context() -> Option<LessonContext> {
    let database = test_database(CONCURRENT_APPENDS)?;
    let teacher = database.seed_teacher("Lincoln Unified", "teacher@lincoln.example");
    let repository = DieselLessonRepository::new(database.pool.clone());

    let created_at = now();
    let new_lesson = NewLesson {
        lesson_id: LessonId::random(),
        tenant_id: teacher.tenant_id,
        owner_user_id: teacher.id,
        header: LessonHeader {
            title: "Fractions on a number line".to_owned(),
            subject: "Math".to_owned(),
            grade_level: "3".to_owned(),
            language: "en".to_owned(),
            status: LessonStatus::Draft,
            visibility: Visibility::Private,
            tags: vec!["fractions".to_owned()],
            metadata: Map::new(),
        },
        first_version: draft("Place unit fractions on a number line"),
        standard_ids: Vec::new(),
        created_at,
    };
    let event = NewEvent::new(
        teacher.tenant_id,
        Some(teacher.id),
        actions::LESSON_CREATED,
        created_at,
    );
    let lesson = database
        .runtime
        .block_on(repository.create_lesson(&new_lesson, &event))
        .expect("lesson created");

    Some(LessonContext {
        database,
        repository,
        teacher,
        lesson,
    })
}

fn reload(context: &LessonContext, tenant_id: &TenantId) -> Option<LessonDetail> {
    context
        .database
        .runtime
        .block_on(
            context
                .repository
                .find_lesson(tenant_id, &context.lesson.lesson.id),
        )
        .expect("lesson query succeeds")
}

#[rstest]
fn created_lesson_points_at_its_first_version(lesson_context: Option<LessonContext>) {
    let Some(context) = lesson_context else {
        return;
    };
    let detail = reload(&context, &context.teacher.tenant_id).expect("lesson exists");

    assert_eq!(detail.versions.len(), 1);
    assert_eq!(detail.versions[0].version_no, 1);
    assert_eq!(detail.lesson.current_version_id, Some(detail.versions[0].id));
    assert_eq!(
        detail.versions[0].content.objective.as_deref(),
        Some("Place unit fractions on a number line")
    );
}

#[rstest]
fn concurrent_appends_take_consecutive_numbers(lesson_context: Option<LessonContext>) {
    let Some(context) = lesson_context else {
        return;
    };
    let lesson_id = context.lesson.lesson.id;
    let appends: Vec<_> = (0..CONCURRENT_APPENDS)
        .map(|n| append_for(&context.teacher, lesson_id, &format!("revision {n}")))
        .collect();

    let results = context.database.runtime.block_on(join_all(
        appends
            .iter()
            .map(|append| context.repository.append_version(append, None)),
    ));
    let mut numbers: Vec<u32> = results
        .into_iter()
        .map(|result| result.expect("append succeeds").version_no)
        .collect();
    numbers.sort_unstable();

    assert_eq!(numbers, (2..=CONCURRENT_APPENDS + 1).collect::<Vec<_>>());

    let detail = reload(&context, &context.teacher.tenant_id).expect("lesson exists");
    let latest = detail.latest_version().expect("versions exist");
    assert_eq!(latest.version_no, CONCURRENT_APPENDS + 1);
    assert_eq!(detail.lesson.current_version_id, Some(latest.id));
}

#[rstest]
fn append_applies_a_requested_status(lesson_context: Option<LessonContext>) {
    let Some(context) = lesson_context else {
        return;
    };
    let mut append = append_for(&context.teacher, context.lesson.lesson.id, "final cut");
    append.status = Some(LessonStatus::Published);
    let stored = context
        .database
        .runtime
        .block_on(context.repository.append_version(&append, None))
        .expect("append succeeds");

    let detail = reload(&context, &context.teacher.tenant_id).expect("lesson exists");
    assert_eq!(stored.version_no, 2);
    assert_eq!(detail.lesson.status, LessonStatus::Published);
}

#[rstest]
fn restore_moves_the_pointer_without_adding_versions(lesson_context: Option<LessonContext>) {
    let Some(context) = lesson_context else {
        return;
    };
    let lesson_id = context.lesson.lesson.id;
    for objective in ["second", "third"] {
        let append = append_for(&context.teacher, lesson_id, objective);
        context
            .database
            .runtime
            .block_on(context.repository.append_version(&append, None))
            .expect("append succeeds");
    }

    let outcome = context
        .database
        .runtime
        .block_on(
            context
                .repository
                .restore_version(&context.teacher.tenant_id, &lesson_id, 2),
        )
        .expect("restore succeeds");
    let RestoreOutcome::Restored(restored) = outcome else {
        panic!("expected a restore, got {outcome:?}");
    };

    let detail = reload(&context, &context.teacher.tenant_id).expect("lesson exists");
    let second = detail
        .versions
        .iter()
        .find(|version| version.version_no == 2)
        .expect("version 2 kept");
    assert_eq!(detail.versions.len(), 3);
    assert_eq!(restored.restored_version, 2);
    assert_eq!(restored.current_version_id, second.id);
    assert_eq!(detail.lesson.current_version_id, Some(second.id));
}

#[rstest]
fn restore_reports_what_is_missing(lesson_context: Option<LessonContext>) {
    let Some(context) = lesson_context else {
        return;
    };
    let lesson_id = context.lesson.lesson.id;
    let stranger = context.database.seed_tenant("Franklin County");

    let (foreign, unknown_version) = context.database.runtime.block_on(async {
        (
            context
                .repository
                .restore_version(&stranger, &lesson_id, 1)
                .await
                .expect("restore runs"),
            context
                .repository
                .restore_version(&context.teacher.tenant_id, &lesson_id, 42)
                .await
                .expect("restore runs"),
        )
    });

    assert_eq!(foreign, RestoreOutcome::LessonMissing);
    assert_eq!(unknown_version, RestoreOutcome::VersionMissing);
    let detail = reload(&context, &context.teacher.tenant_id).expect("lesson exists");
    assert_eq!(
        detail.lesson.current_version_id,
        context.lesson.lesson.current_version_id
    );
}

#[rstest]
fn lessons_are_invisible_to_other_tenants(lesson_context: Option<LessonContext>) {
    let Some(context) = lesson_context else {
        return;
    };
    let stranger = context.database.seed_tenant("Franklin County");

    assert!(reload(&context, &stranger).is_none());

    let append = VersionAppend {
        tenant_id: stranger,
        ..append_for(&context.teacher, context.lesson.lesson.id, "intrusion")
    };
    let result = context
        .database
        .runtime
        .block_on(context.repository.append_version(&append, None));
    assert!(result.is_err(), "foreign tenant appended a version");
    let detail = reload(&context, &context.teacher.tenant_id).expect("lesson exists");
    assert_eq!(detail.versions.len(), 1);
}
