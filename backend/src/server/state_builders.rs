//! Builders for HTTP state ports and the repositories behind them.
//!
//! Every domain service is generic over its repositories. The same wiring
//! runs against Diesel adapters when a pool is configured and against the
//! fixture adapters otherwise.

use std::path::Path;
use std::sync::Arc;

use actix_web::web;
use color_eyre::eyre::{Result, WrapErr, eyre};
use mockable::{Clock, DefaultClock};
use tracing::{info, warn};

use lessonplan::domain::ports::{
    ContentGenerator, EventRepository, FixtureEventRepository, FixtureGenerationJobRepository,
    FixtureIdentityProvider, FixtureLessonRepository, FixtureLmsRepository,
    FixtureShareRepository, FixtureStandardsRepository, FixtureUserRepository,
    GenerationJobRepository, GenerationMetrics, IdentityProvider, LessonRepository,
    LmsRepository, ReadinessProbe, ShareRepository, StandardsRepository,
    UnconfiguredContentGenerator, UnconfiguredIdentityProvider, UserRepository,
};
use lessonplan::domain::{
    AccountService, AnalyticsService, ExportService, GenerationService, LessonService,
    LmsService, Renderers, ShareService, StandardsCatalogue, StandardsService,
};
use lessonplan::inbound::http::health::HealthState;
use lessonplan::inbound::http::state::HttpState;
use lessonplan::outbound::documents::{DocxRenderer, PlainPdfRenderer};
use lessonplan::outbound::generation::{OpenAiConfig, OpenAiContentGenerator};
use lessonplan::outbound::persistence::{
    DbPool, DieselEventRepository, DieselGenerationJobRepository, DieselLessonRepository,
    DieselLmsRepository, DieselReadinessProbe, DieselShareRepository, DieselStandardsRepository,
    DieselUserRepository,
};

use super::{ServerConfig, ServiceSettings};

/// One adapter per repository port.
struct Repositories<U, E, L, J, S, Sh, M> {
    users: Arc<U>,
    events: Arc<E>,
    lessons: Arc<L>,
    jobs: Arc<J>,
    standards: Arc<S>,
    shares: Arc<Sh>,
    lms: Arc<M>,
}

type FixtureRepositories = Repositories<
    FixtureUserRepository,
    FixtureEventRepository,
    FixtureLessonRepository,
    FixtureGenerationJobRepository,
    FixtureStandardsRepository,
    FixtureShareRepository,
    FixtureLmsRepository,
>;

type DieselRepositories = Repositories<
    DieselUserRepository,
    DieselEventRepository,
    DieselLessonRepository,
    DieselGenerationJobRepository,
    DieselStandardsRepository,
    DieselShareRepository,
    DieselLmsRepository,
>;

impl FixtureRepositories {
    fn fixtures() -> Self {
        Self {
            users: Arc::new(FixtureUserRepository),
            events: Arc::new(FixtureEventRepository),
            lessons: Arc::new(FixtureLessonRepository),
            jobs: Arc::new(FixtureGenerationJobRepository),
            standards: Arc::new(FixtureStandardsRepository),
            shares: Arc::new(FixtureShareRepository),
            lms: Arc::new(FixtureLmsRepository),
        }
    }
}

impl DieselRepositories {
    fn diesel(pool: &DbPool) -> Self {
        Self {
            users: Arc::new(DieselUserRepository::new(pool.clone())),
            events: Arc::new(DieselEventRepository::new(pool.clone())),
            lessons: Arc::new(DieselLessonRepository::new(pool.clone())),
            jobs: Arc::new(DieselGenerationJobRepository::new(pool.clone())),
            standards: Arc::new(DieselStandardsRepository::new(pool.clone())),
            shares: Arc::new(DieselShareRepository::new(pool.clone())),
            lms: Arc::new(DieselLmsRepository::new(pool.clone())),
        }
    }
}

/// Adapters that are not repositories.
pub(crate) struct Collaborators {
    pub(crate) generator: Arc<dyn ContentGenerator>,
    pub(crate) generation_metrics: Option<Arc<dyn GenerationMetrics>>,
}

fn identity_provider(dev_login: bool) -> Arc<dyn IdentityProvider> {
    if dev_login {
        warn!("development login enabled; email-shaped codes sign in directly");
        Arc::new(FixtureIdentityProvider)
    } else {
        Arc::new(UnconfiguredIdentityProvider)
    }
}

fn state_from_repositories<U, E, L, J, S, Sh, M>(
    repos: Repositories<U, E, L, J, S, Sh, M>,
    settings: &ServiceSettings,
    collaborators: Collaborators,
    clock: Arc<dyn Clock>,
) -> HttpState
where
    U: UserRepository + 'static,
    E: EventRepository + 'static,
    L: LessonRepository + 'static,
    J: GenerationJobRepository + 'static,
    S: StandardsRepository + 'static,
    Sh: ShareRepository + 'static,
    M: LmsRepository + 'static,
{
    let Repositories {
        users,
        events,
        lessons,
        jobs,
        standards,
        shares,
        lms,
    } = repos;

    let accounts = Arc::new(AccountService::new(
        users,
        events.clone(),
        identity_provider(settings.dev_login),
        settings.login_policy.clone(),
        clock.clone(),
    ));
    let lesson_service = Arc::new(LessonService::new(lessons.clone(), clock.clone()));
    let mut generation = GenerationService::new(
        jobs,
        lessons.clone(),
        StandardsService::new(standards.clone()),
        collaborators.generator,
        settings.prompt_template.clone(),
        clock.clone(),
    );
    if let Some(metrics) = collaborators.generation_metrics {
        generation = generation.with_metrics(metrics);
    }
    let exports = Arc::new(ExportService::new(
        lessons.clone(),
        standards,
        events.clone(),
        Renderers {
            pdf: Arc::new(PlainPdfRenderer),
            docx: Arc::new(DocxRenderer),
        },
        clock.clone(),
    ));
    let share_service = Arc::new(ShareService::new(
        lessons.clone(),
        shares,
        settings.frontend_app_url.clone(),
        clock.clone(),
    ));
    let analytics = Arc::new(AnalyticsService::new(events, lessons.clone(), clock.clone()));
    let lms_service = Arc::new(LmsService::new(lessons, lms, clock));

    HttpState {
        login: accounts.clone(),
        users: accounts.clone(),
        user_admin: accounts.clone(),
        profile: accounts,
        lessons: lesson_service.clone(),
        lessons_query: lesson_service,
        generation: Arc::new(generation),
        exports,
        shares: share_service.clone(),
        shares_query: share_service,
        analytics: analytics.clone(),
        metrics_rebuild: analytics,
        lms: lms_service,
    }
}

/// Build the HTTP state, using Diesel repositories when a pool is configured.
pub(crate) fn build_http_state(
    config: &ServerConfig,
    collaborators: Collaborators,
) -> web::Data<HttpState> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let state = match &config.db_pool {
        Some(pool) => state_from_repositories(
            DieselRepositories::diesel(pool),
            &config.services,
            collaborators,
            clock,
        ),
        None => {
            warn!("no database configured; serving fixture data");
            state_from_repositories(
                FixtureRepositories::fixtures(),
                &config.services,
                collaborators,
                clock,
            )
        }
    };
    web::Data::new(state)
}

/// Provider adapter when an API key is configured, otherwise the adapter
/// that always reports "not configured" so generation falls back.
pub(crate) fn build_content_generator(config: Option<OpenAiConfig>) -> Arc<dyn ContentGenerator> {
    let Some(config) = config else {
        info!("no generation provider configured; lessons use fallback content");
        return Arc::new(UnconfiguredContentGenerator);
    };
    match OpenAiContentGenerator::new(config) {
        Ok(generator) => Arc::new(generator),
        Err(error) => {
            warn!(%error, "generation provider unavailable; lessons use fallback content");
            Arc::new(UnconfiguredContentGenerator)
        }
    }
}

/// Health state that also pings the database when one is configured.
pub(crate) fn build_health_state(db_pool: Option<&DbPool>) -> HealthState {
    let health = HealthState::new();
    match db_pool {
        Some(pool) => {
            let probe: Arc<dyn ReadinessProbe> = Arc::new(DieselReadinessProbe::new(pool.clone()));
            health.with_probe(probe)
        }
        None => health,
    }
}

/// Import the JSON standards catalogue at `path` into the database.
///
/// Returns the number of standards written.
pub(crate) async fn import_standards_catalogue(pool: &DbPool, path: &Path) -> Result<usize> {
    let raw = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read standards catalogue {}", path.display()))?;
    let catalogue: StandardsCatalogue = serde_json::from_str(&raw)
        .wrap_err_with(|| format!("parse standards catalogue {}", path.display()))?;
    let service = StandardsService::new(Arc::new(DieselStandardsRepository::new(pool.clone())));
    let written = service
        .import_catalogue(catalogue)
        .await
        .map_err(|err| eyre!("import standards catalogue: {err}"))?;
    info!(path = %path.display(), written, "standards catalogue imported");
    Ok(written)
}
