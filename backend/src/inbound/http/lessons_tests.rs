//! Tests for lesson API handlers.

use super::*;
use crate::domain::{
    Audience, LessonDetail, LessonStatus, RestoredVersion, TenantId, VersionId,
};
use crate::inbound::http::auth::callback;
use crate::inbound::http::test_utils::{MockPorts, login_cookie, test_session_middleware};
use crate::test_support::fixtures;
use actix_web::http::StatusCode;
use actix_web::http::header;
use actix_web::{App, test as actix_test};
use chrono::{Duration, Utc};
use rstest::rstest;
use serde_json::{Value, json};

fn test_app(
    state: HttpState,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .wrap(test_session_middleware())
        .service(
            web::scope("/api/v1")
                .service(callback)
                .service(list_lessons)
                .service(create_lesson)
                .service(get_lesson)
                .service(create_version)
                .service(restore_version)
                .service(differentiate_lesson)
                .service(export_lesson),
        )
}

fn detail_with_versions(tenant: TenantId, count: u32) -> LessonDetail {
    let lesson = fixtures::lesson(tenant, "Water Cycle");
    let start = Utc::now() - Duration::hours(i64::from(count));
    // Deliberately newest first to exercise response ordering.
    let versions = (1..=count)
        .rev()
        .map(|no| fixtures::version(lesson.id, no, start + Duration::hours(i64::from(no))))
        .collect();
    LessonDetail { lesson, versions }
}

#[actix_web::test]
async fn lessons_require_a_session() {
    let app = actix_test::init_service(test_app(MockPorts::default().into_state())).await;
    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get().uri("/api/v1/lessons").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn list_forwards_parsed_filters() {
    let user = fixtures::teacher(TenantId::random());
    let mut ports = MockPorts::default().signed_in_as(&user);
    let lesson = fixtures::lesson(user.tenant_id, "Water Cycle");
    ports
        .lessons_query
        .expect_list_lessons()
        .withf(|_, filters| {
            filters.subject.as_deref() == Some("Science")
                && filters.grade_level.is_none()
                && filters.tags == vec!["water".to_owned(), "cycle".to_owned()]
        })
        .times(1)
        .returning(move |_, _| Ok(vec![lesson.clone()]));
    let app = actix_test::init_service(test_app(ports.into_state())).await;
    let cookie = login_cookie(&app).await;

    let body: Value = actix_test::call_and_read_body_json(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/lessons?subject=Science&gradeLevel=%20&tags=water,%20cycle,")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(body[0]["title"], "Water Cycle");
    assert_eq!(body[0]["gradeLevel"], "5");
}

#[actix_web::test]
async fn create_returns_the_lesson_with_its_first_version() {
    let user = fixtures::teacher(TenantId::random());
    let mut ports = MockPorts::default().signed_in_as(&user);
    let detail = detail_with_versions(user.tenant_id, 1);
    ports
        .lessons
        .expect_create_lesson()
        .withf(|_, header, draft| {
            header.title == "Water Cycle"
                && header.status == LessonStatus::Draft
                && draft.content.objective.as_deref() == Some("Describe evaporation")
        })
        .times(1)
        .returning(move |_, _, _| Ok(detail.clone()));
    let app = actix_test::init_service(test_app(ports.into_state())).await;
    let cookie = login_cookie(&app).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/lessons")
            .cookie(cookie)
            .set_json(json!({
                "title": "Water Cycle",
                "subject": "Science",
                "gradeLevel": "5",
                "objective": "Describe evaporation"
            }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["versions"].as_array().map(Vec::len), Some(1));
}

#[actix_web::test]
async fn create_rejects_a_missing_title_before_calling_the_service() {
    let user = fixtures::teacher(TenantId::random());
    let app = actix_test::init_service(test_app(MockPorts::default().signed_in_as(&user).into_state())).await;
    let cookie = login_cookie(&app).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/lessons")
            .cookie(cookie)
            .set_json(json!({ "subject": "Science", "gradeLevel": "5" }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["details"]["field"], "title");
}

#[actix_web::test]
async fn detail_lists_versions_oldest_first() {
    let user = fixtures::teacher(TenantId::random());
    let mut ports = MockPorts::default().signed_in_as(&user);
    let detail = detail_with_versions(user.tenant_id, 3);
    let lesson_id = detail.lesson.id;
    ports
        .lessons_query
        .expect_get_lesson()
        .withf(move |_, id| *id == lesson_id)
        .times(1)
        .returning(move |_, _| Ok(detail.clone()));
    let app = actix_test::init_service(test_app(ports.into_state())).await;
    let cookie = login_cookie(&app).await;

    let body: Value = actix_test::call_and_read_body_json(
        &app,
        actix_test::TestRequest::get()
            .uri(&format!("/api/v1/lessons/{lesson_id}"))
            .cookie(cookie)
            .to_request(),
    )
    .await;
    let numbers: Vec<u64> = body["versions"]
        .as_array()
        .expect("versions")
        .iter()
        .filter_map(|version| version["versionNo"].as_u64())
        .collect();
    assert_eq!(numbers, vec![1, 2, 3]);
}

#[actix_web::test]
async fn malformed_lesson_ids_are_rejected() {
    let user = fixtures::teacher(TenantId::random());
    let app = actix_test::init_service(test_app(MockPorts::default().signed_in_as(&user).into_state())).await;
    let cookie = login_cookie(&app).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/lessons/not-a-uuid")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["details"]["code"], "invalid_uuid");
}

#[actix_web::test]
async fn new_versions_forward_the_status_override() {
    let user = fixtures::teacher(TenantId::random());
    let mut ports = MockPorts::default().signed_in_as(&user);
    let lesson_id = LessonId::random();
    let version = fixtures::version(lesson_id, 2, Utc::now());
    ports
        .lessons
        .expect_create_version()
        .withf(|_, _, request| request.status == Some(LessonStatus::Published))
        .times(1)
        .returning(move |_, _, _| Ok(version.clone()));
    let app = actix_test::init_service(test_app(ports.into_state())).await;
    let cookie = login_cookie(&app).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri(&format!("/api/v1/lessons/{lesson_id}/versions"))
            .cookie(cookie)
            .set_json(json!({ "status": "published", "objective": "Revised" }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["versionNo"], 2);
}

#[actix_web::test]
async fn restore_reports_the_moved_pointer() {
    let user = fixtures::teacher(TenantId::random());
    let mut ports = MockPorts::default().signed_in_as(&user);
    let lesson_id = LessonId::random();
    let version_id = VersionId::random();
    ports
        .lessons
        .expect_restore_version()
        .withf(|_, _, version_no| *version_no == 1)
        .times(1)
        .returning(move |_, _, _| {
            Ok(RestoredVersion {
                lesson_id,
                current_version_id: version_id,
                restored_version: 1,
            })
        });
    let app = actix_test::init_service(test_app(ports.into_state())).await;
    let cookie = login_cookie(&app).await;

    let body: Value = actix_test::call_and_read_body_json(
        &app,
        actix_test::TestRequest::post()
            .uri(&format!("/api/v1/lessons/{lesson_id}/restore/1"))
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(
        body,
        json!({
            "lessonId": lesson_id.to_string(),
            "currentVersionId": version_id.to_string(),
            "restoredVersion": 1
        })
    );
}

#[actix_web::test]
async fn differentiate_parses_the_audience() {
    let user = fixtures::teacher(TenantId::random());
    let mut ports = MockPorts::default().signed_in_as(&user);
    let lesson_id = LessonId::random();
    let version = fixtures::version(lesson_id, 4, Utc::now());
    ports
        .lessons
        .expect_differentiate()
        .withf(|_, _, request| {
            request.audience == Audience::Gifted && request.notes.as_deref() == Some("extension")
        })
        .times(1)
        .returning(move |_, _, _| Ok(version.clone()));
    let app = actix_test::init_service(test_app(ports.into_state())).await;
    let cookie = login_cookie(&app).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri(&format!("/api/v1/lessons/{lesson_id}/differentiate"))
            .cookie(cookie)
            .set_json(json!({ "audience": "gifted", "notes": "extension" }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
}

#[actix_web::test]
async fn differentiate_rejects_unknown_audiences() {
    let user = fixtures::teacher(TenantId::random());
    let app = actix_test::init_service(test_app(MockPorts::default().signed_in_as(&user).into_state())).await;
    let cookie = login_cookie(&app).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri(&format!("/api/v1/lessons/{}/differentiate", LessonId::random()))
            .cookie(cookie)
            .set_json(json!({ "audience": "ADVANCED" }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["message"], "audience must be one of ELL, IEP, GIFTED");
}

#[actix_web::test]
async fn pdf_exports_are_served_as_attachments() {
    let user = fixtures::teacher(TenantId::random());
    let mut ports = MockPorts::default().signed_in_as(&user);
    ports
        .exports
        .expect_export_lesson()
        .withf(|_, _, format| *format == ExportFormat::Pdf)
        .times(1)
        .returning(|_, _, _| {
            Ok(ExportArtifact::File {
                content_type: "application/pdf",
                filename: "water-cycle.pdf".to_owned(),
                bytes: b"%PDF-1.4".to_vec(),
            })
        });
    let app = actix_test::init_service(test_app(ports.into_state())).await;
    let cookie = login_cookie(&app).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri(&format!("/api/v1/lessons/{}/export?format=PDF", LessonId::random()))
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers().get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()),
        Some("application/pdf")
    );
    assert_eq!(
        res.headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok()),
        Some("attachment; filename=\"water-cycle.pdf\"")
    );
    let body = actix_test::read_body(res).await;
    assert!(body.starts_with(b"%PDF"));
}

#[actix_web::test]
async fn gdoc_exports_are_returned_as_json() {
    let user = fixtures::teacher(TenantId::random());
    let mut ports = MockPorts::default().signed_in_as(&user);
    ports
        .exports
        .expect_export_lesson()
        .returning(|_, _, _| Ok(ExportArtifact::Json(json!({ "title": "Water Cycle" }))));
    let app = actix_test::init_service(test_app(ports.into_state())).await;
    let cookie = login_cookie(&app).await;

    let body: Value = actix_test::call_and_read_body_json(
        &app,
        actix_test::TestRequest::get()
            .uri(&format!("/api/v1/lessons/{}/export?format=gdoc", LessonId::random()))
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(body["title"], "Water Cycle");
}

#[rstest]
#[case::unknown("?format=odt")]
#[case::missing("")]
#[actix_web::test]
async fn unsupported_export_formats_are_rejected(#[case] query: &str) {
    let user = fixtures::teacher(TenantId::random());
    let app = actix_test::init_service(test_app(MockPorts::default().signed_in_as(&user).into_state())).await;
    let cookie = login_cookie(&app).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri(&format!("/api/v1/lessons/{}/export{query}", LessonId::random()))
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["message"], "Unsupported export format");
}
