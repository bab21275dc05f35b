//! Server construction and middleware wiring.

mod config;
#[cfg(feature = "metrics")]
mod metrics;
mod settings;
mod state_builders;

pub use config::{ServerConfig, ServiceSettings};
#[cfg(feature = "metrics")]
pub(crate) use metrics::default_metrics;
pub use settings::AppSettings;
pub(crate) use state_builders::{build_health_state, import_standards_catalogue};

#[cfg(feature = "metrics")]
use metrics::MetricsLayer;
use state_builders::{Collaborators, build_content_generator, build_http_state};

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use lessonplan::Trace;
#[cfg(debug_assertions)]
use lessonplan::doc::ApiDoc;
use lessonplan::inbound::http::analytics::{rebuild, summary};
use lessonplan::inbound::http::auth::{callback, logout, session_status};
use lessonplan::inbound::http::error::{json_config, path_config, query_config};
use lessonplan::inbound::http::generation::generate_lesson;
use lessonplan::inbound::http::health::{HealthState, live, ready, version};
use lessonplan::inbound::http::lessons::{
    create_lesson, create_version, differentiate_lesson, export_lesson, get_lesson, list_lessons,
    restore_version,
};
use lessonplan::inbound::http::lms::{connect_google_classroom, push_google_classroom};
use lessonplan::inbound::http::shares::{create_share, get_share};
use lessonplan::inbound::http::state::HttpState;
use lessonplan::inbound::http::users::{get_me, invite_user, list_users, update_me, update_user};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

const SESSION_TTL_HOURS: i64 = 2;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    key: Key,
    cookie_secure: bool,
    same_site: SameSite,
}

fn session_middleware(
    key: Key,
    cookie_secure: bool,
    same_site: SameSite,
) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(same_site)
        .session_lifecycle(PersistentSession::default().session_ttl(
            actix_web::cookie::time::Duration::hours(SESSION_TTL_HOURS),
        ))
        .build()
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        key,
        cookie_secure,
        same_site,
    } = deps;

    let api = web::scope("/api/v1")
        .wrap(session_middleware(key, cookie_secure, same_site))
        .service(callback)
        .service(session_status)
        .service(logout)
        .service(list_users)
        .service(invite_user)
        .service(update_user)
        .service(get_me)
        .service(update_me)
        .service(list_lessons)
        .service(create_lesson)
        .service(get_lesson)
        .service(create_version)
        .service(restore_version)
        .service(differentiate_lesson)
        .service(export_lesson)
        .service(create_share)
        .service(generate_lesson)
        .service(get_share)
        .service(summary)
        .service(rebuild)
        .service(connect_google_classroom)
        .service(push_google_classroom);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .wrap(Trace)
        .service(api)
        .service(ready)
        .service(live)
        .service(version);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket or starting the server fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    mut config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let collaborators = Collaborators {
        generator: build_content_generator(config.services.generator.take()),
        #[cfg(feature = "metrics")]
        generation_metrics: metrics::generation_metrics(config.prometheus.as_ref()),
        #[cfg(not(feature = "metrics"))]
        generation_metrics: None,
    };
    let http_state = build_http_state(&config, collaborators);
    let ServerConfig {
        key,
        cookie_secure,
        same_site,
        bind_addr,
        #[cfg(feature = "metrics")]
        prometheus,
        ..
    } = config;

    #[cfg(feature = "metrics")]
    let metrics_layer = MetricsLayer::from_option(prometheus);

    let server = HttpServer::new(move || {
        let app = build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            key: key.clone(),
            cookie_secure,
            same_site,
        });

        #[cfg(feature = "metrics")]
        let app = app.wrap(metrics_layer.clone());

        app
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
