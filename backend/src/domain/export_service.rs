//! Lesson export orchestration.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::port_error_mapping::{map_event_error, map_lesson_error, map_standards_error};
use crate::domain::ports::{
    DocumentRenderer, EventRepository, ExportCommand, LessonRepository, StandardsRepository,
};
use crate::domain::{
    DOCX_CONTENT_TYPE, Error, ExportArtifact, ExportDocument, ExportFormat, LessonId, NewEvent,
    PDF_CONTENT_TYPE, User, actions, filename_base,
};

/// File renderers keyed by format.
#[derive(Clone)]
pub struct Renderers {
    pub pdf: Arc<dyn DocumentRenderer>,
    pub docx: Arc<dyn DocumentRenderer>,
}

/// Export service implementing [`ExportCommand`].
#[derive(Clone)]
pub struct ExportService<L, S, E> {
    lessons: Arc<L>,
    standards: Arc<S>,
    events: Arc<E>,
    renderers: Renderers,
    clock: Arc<dyn Clock>,
}

impl<L, S, E> ExportService<L, S, E> {
    pub fn new(
        lessons: Arc<L>,
        standards: Arc<S>,
        events: Arc<E>,
        renderers: Renderers,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            lessons,
            standards,
            events,
            renderers,
            clock,
        }
    }
}

fn render_file(
    renderer: &dyn DocumentRenderer,
    document: &ExportDocument,
    content_type: &'static str,
    extension: &str,
) -> Result<ExportArtifact, Error> {
    let bytes = renderer
        .render(document)
        .map_err(|err| Error::internal(err.to_string()))?;
    Ok(ExportArtifact::File {
        content_type,
        filename: format!("{}.{extension}", filename_base(&document.title)),
        bytes,
    })
}

#[async_trait]
impl<L, S, E> ExportCommand for ExportService<L, S, E>
where
    L: LessonRepository,
    S: StandardsRepository,
    E: EventRepository,
{
    async fn export_lesson(
        &self,
        actor: &User,
        lesson_id: &LessonId,
        format: ExportFormat,
    ) -> Result<ExportArtifact, Error> {
        let detail = self
            .lessons
            .find_lesson(&actor.tenant_id, lesson_id)
            .await
            .map_err(map_lesson_error)?
            .ok_or_else(|| Error::not_found("Lesson not found"))?;
        let version = detail
            .latest_version()
            .ok_or_else(|| Error::invalid_request("Lesson has no versions"))?;
        let codes = self
            .standards
            .codes_for_version(&version.id)
            .await
            .map_err(map_standards_error)?;
        let document = ExportDocument::build(&detail.lesson, version, codes);

        let now = self.clock.utc();
        let artifact = match format {
            ExportFormat::Pdf => render_file(
                self.renderers.pdf.as_ref(),
                &document,
                PDF_CONTENT_TYPE,
                "pdf",
            )?,
            ExportFormat::Docx => render_file(
                self.renderers.docx.as_ref(),
                &document,
                DOCX_CONTENT_TYPE,
                "docx",
            )?,
            ExportFormat::Gdoc => ExportArtifact::Json(document.gdoc_payload(now)),
        };

        let event = NewEvent::new(actor.tenant_id, Some(actor.id), actions::LESSON_EXPORTED, now)
            .with("lesson_id", lesson_id.to_string())
            .with("format", format.as_str());
        self.events.record(&event).await.map_err(map_event_error)?;
        info!(lesson_id = %lesson_id, %format, "lesson exported");
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{
        DocumentRenderError, LessonCommand, MockDocumentRenderer, MockStandardsRepository,
    };
    use crate::domain::{ErrorCode, LessonService, TenantId, VersionDraft, metrics};
    use crate::test_support::clock::MutableClock;
    use crate::test_support::fixtures::{content, header, teacher};
    use crate::test_support::in_memory::InMemoryLessonStore;
    use rstest::rstest;
    use serde_json::json;

    fn renderer(output: &'static [u8]) -> Arc<dyn DocumentRenderer> {
        let mut renderer = MockDocumentRenderer::new();
        renderer
            .expect_render()
            .returning(move |_| Ok(output.to_vec()));
        Arc::new(renderer)
    }

    fn standards_with(codes: &'static [&'static str]) -> Arc<MockStandardsRepository> {
        let mut repo = MockStandardsRepository::new();
        repo.expect_codes_for_version()
            .returning(move |_| Ok(codes.iter().map(|c| (*c).to_owned()).collect()));
        Arc::new(repo)
    }

    struct Setup {
        store: Arc<InMemoryLessonStore>,
        clock: Arc<MutableClock>,
        actor: User,
        lesson_id: LessonId,
    }

    async fn setup() -> Setup {
        let store = Arc::new(InMemoryLessonStore::default());
        let clock = Arc::new(MutableClock::fixed());
        let actor = teacher(TenantId::random());
        let lesson_id = LessonService::new(store.clone(), clock.clone())
            .create_lesson(
                &actor,
                header("Water Cycle Basics", "Science", "5", &[]),
                VersionDraft::from_content(content("Describe the water cycle")),
            )
            .await
            .expect("lesson created")
            .lesson
            .id;
        Setup {
            store,
            clock,
            actor,
            lesson_id,
        }
    }

    fn service(
        setup: &Setup,
        renderers: Renderers,
    ) -> ExportService<InMemoryLessonStore, MockStandardsRepository, InMemoryLessonStore> {
        ExportService::new(
            setup.store.clone(),
            standards_with(&["5-ESS2-1"]),
            setup.store.clone(),
            renderers,
            setup.clock.clone(),
        )
    }

    #[rstest]
    #[case(ExportFormat::Pdf, PDF_CONTENT_TYPE, "water-cycle-basics.pdf", b"%PDF".as_slice())]
    #[case(ExportFormat::Docx, DOCX_CONTENT_TYPE, "water-cycle-basics.docx", b"PK".as_slice())]
    #[tokio::test]
    async fn file_formats_use_their_renderer(
        #[case] format: ExportFormat,
        #[case] expected_type: &str,
        #[case] expected_name: &str,
        #[case] expected_bytes: &[u8],
    ) {
        let setup = setup().await;
        let service = service(
            &setup,
            Renderers {
                pdf: renderer(b"%PDF"),
                docx: renderer(b"PK"),
            },
        );

        let artifact = service
            .export_lesson(&setup.actor, &setup.lesson_id, format)
            .await
            .expect("export succeeds");

        let ExportArtifact::File {
            content_type,
            filename,
            bytes,
        } = artifact
        else {
            panic!("expected a file artifact");
        };
        assert_eq!(content_type, expected_type);
        assert_eq!(filename, expected_name);
        assert_eq!(bytes, expected_bytes);
    }

    #[rstest]
    #[tokio::test]
    async fn gdoc_export_returns_payload_and_counts() {
        let setup = setup().await;
        let service = service(
            &setup,
            Renderers {
                pdf: renderer(b""),
                docx: renderer(b""),
            },
        );

        let artifact = service
            .export_lesson(&setup.actor, &setup.lesson_id, ExportFormat::Gdoc)
            .await
            .expect("export succeeds");

        let ExportArtifact::Json(payload) = artifact else {
            panic!("expected a JSON artifact");
        };
        assert_eq!(payload["status"], json!("ready"));
        assert_eq!(payload["sections"]["standards"], json!(["5-ESS2-1"]));

        let today = setup.clock.utc().date_naive();
        assert_eq!(
            setup
                .store
                .metric_value(setup.actor.tenant_id, today, metrics::EXPORTS),
            1
        );
        let events = setup.store.events();
        let event = events.last().expect("export event");
        assert_eq!(event.metadata.get("format"), Some(&json!("gdoc")));
    }

    #[rstest]
    #[tokio::test]
    async fn render_failures_record_nothing() {
        let setup = setup().await;
        let mut broken = MockDocumentRenderer::new();
        broken
            .expect_render()
            .returning(|_| Err(DocumentRenderError::write("disk full")));
        let service = service(
            &setup,
            Renderers {
                pdf: Arc::new(broken),
                docx: renderer(b""),
            },
        );

        let err = service
            .export_lesson(&setup.actor, &setup.lesson_id, ExportFormat::Pdf)
            .await
            .expect_err("render fails");

        assert_eq!(err.code(), ErrorCode::InternalError);
        let today = setup.clock.utc().date_naive();
        assert_eq!(
            setup
                .store
                .metric_value(setup.actor.tenant_id, today, metrics::EXPORTS),
            0
        );
    }

    #[rstest]
    #[tokio::test]
    async fn foreign_lessons_are_not_found() {
        let setup = setup().await;
        let service = service(
            &setup,
            Renderers {
                pdf: renderer(b""),
                docx: renderer(b""),
            },
        );
        let outsider = teacher(TenantId::random());

        let err = service
            .export_lesson(&outsider, &setup.lesson_id, ExportFormat::Gdoc)
            .await
            .expect_err("not in tenant");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
