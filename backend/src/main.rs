//! Lesson planner entry-point: loads settings, prepares the database, and
//! serves the REST API.

mod server;


use actix_web::web;
use color_eyre::eyre::{Result, WrapErr, eyre};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};
use url::Url;
use zeroize::Zeroizing;

use lessonplan::domain::DEFAULT_PROMPT_TEMPLATE;
use lessonplan::inbound::http::session_config::{BuildMode, session_settings};
use lessonplan::outbound::generation::OpenAiConfig;
use lessonplan::outbound::persistence::{DbPool, PoolConfig, run_migrations_blocking};
use ortho_config::OrthoConfig;

use server::{
    AppSettings, ServerConfig, ServiceSettings, build_health_state, create_server,
    import_standards_catalogue,
};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load().map_err(|err| eyre!("load settings: {err}"))?;
    let session = session_settings(&settings.session_inputs(), BuildMode::from_debug_assertions())
        .wrap_err("session configuration")?;
    let bind_addr = settings.bind_addr()?;

    let db_pool = connect_database(&settings).await?;
    let services = service_settings(&settings)?;

    let mut config = ServerConfig::new(session, bind_addr, services);
    if let Some(pool) = db_pool.clone() {
        config = config.with_db_pool(pool);
    }
    #[cfg(feature = "metrics")]
    let config = config.with_metrics(server::default_metrics());

    let health_state = web::Data::new(build_health_state(db_pool.as_ref()));
    let server = create_server(health_state, config)?;
    info!(%bind_addr, "lesson planner listening");
    server.await?;
    Ok(())
}

/// Run migrations, open the pool, and import the standards catalogue.
async fn connect_database(settings: &AppSettings) -> Result<Option<DbPool>> {
    let Some(database_url) = settings.database_url.clone() else {
        if settings.standards_catalogue_path.is_some() {
            warn!("standards catalogue ignored without a database");
        }
        return Ok(None);
    };
    let applied = run_migrations_blocking(database_url.clone())
        .await
        .wrap_err("run migrations")?;
    info!(applied, "database migrations complete");
    let pool = DbPool::new(PoolConfig::new(database_url))
        .await
        .wrap_err("open database pool")?;
    if let Some(path) = &settings.standards_catalogue_path {
        import_standards_catalogue(&pool, path).await?;
    }
    Ok(Some(pool))
}

fn service_settings(settings: &AppSettings) -> Result<ServiceSettings> {
    let prompt_template = match &settings.generation_prompt_template {
        Some(path) => std::fs::read_to_string(path)
            .wrap_err_with(|| format!("read prompt template {}", path.display()))?,
        None => DEFAULT_PROMPT_TEMPLATE.to_owned(),
    };
    let generator = match settings.openai_api_key() {
        Some(api_key) => Some(OpenAiConfig {
            base_url: Url::parse(settings.openai_base_url())
                .wrap_err("parse generation provider base URL")?,
            api_key: Zeroizing::new(api_key.to_owned()),
            model: settings.openai_model().to_owned(),
            timeout: settings.generation_timeout(),
        }),
        None => None,
    };
    Ok(ServiceSettings {
        login_policy: settings.login_policy(),
        dev_login: settings.dev_login,
        frontend_app_url: settings.frontend_app_url().to_owned(),
        prompt_template,
        generator,
    })
}
