//! Application settings loaded via OrthoConfig.
//!
//! Values layer CLI flags over `LESSONPLAN_*` environment variables over an
//! optional configuration file. The settings are loaded once in `main` and
//! handed to the builders; nothing else reads the environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use lessonplan::domain::LoginPolicy;
use lessonplan::inbound::http::session_config::SessionInputs;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_FRONTEND_APP_URL: &str = "http://localhost:5173";
const DEFAULT_TENANT_NAME: &str = "Default Tenant";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 30;

/// Errors raised while interpreting loaded settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address '{value}': {source}")]
    BindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
}

/// Runtime configuration for the lesson planning server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "LESSONPLAN")]
pub struct AppSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; without it the server runs on fixture ports.
    pub database_url: Option<String>,
    /// Base URL of the web client, used to build share links.
    pub frontend_app_url: Option<String>,
    /// Tenant that first-time users join.
    pub default_tenant_name: Option<String>,
    /// Comma-separated email domains allowed to sign in.
    pub allowed_email_domains: Option<String>,
    /// Accept email-shaped authorization codes instead of a real provider.
    #[ortho_config(default = false)]
    pub dev_login: bool,
    pub openai_api_key: Option<String>,
    pub openai_model: Option<String>,
    pub openai_base_url: Option<String>,
    pub generation_timeout_secs: Option<u64>,
    /// File holding the generation prompt template.
    pub generation_prompt_template: Option<PathBuf>,
    /// JSON standards catalogue imported at startup.
    pub standards_catalogue_path: Option<PathBuf>,
    pub session_key_file: Option<PathBuf>,
    pub session_cookie_secure: Option<String>,
    pub session_same_site: Option<String>,
    pub session_allow_ephemeral: Option<String>,
}

impl AppSettings {
    /// Parse the configured bind address, falling back to `0.0.0.0:8080`.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        value.parse().map_err(|source| SettingsError::BindAddr {
            value: value.to_owned(),
            source,
        })
    }

    pub fn frontend_app_url(&self) -> &str {
        self.frontend_app_url
            .as_deref()
            .unwrap_or(DEFAULT_FRONTEND_APP_URL)
    }

    /// Login rules derived from the tenant and domain settings.
    pub fn login_policy(&self) -> LoginPolicy {
        let allowed_email_domains = self
            .allowed_email_domains
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(|domain| domain.trim().to_ascii_lowercase())
            .filter(|domain| !domain.is_empty())
            .collect();
        LoginPolicy {
            allowed_email_domains,
            default_tenant_name: self
                .default_tenant_name
                .clone()
                .unwrap_or_else(|| DEFAULT_TENANT_NAME.to_owned()),
        }
    }

    /// Provider API key, ignoring blank values.
    pub fn openai_api_key(&self) -> Option<&str> {
        self.openai_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn openai_model(&self) -> &str {
        self.openai_model.as_deref().unwrap_or(DEFAULT_OPENAI_MODEL)
    }

    pub fn openai_base_url(&self) -> &str {
        self.openai_base_url
            .as_deref()
            .unwrap_or(DEFAULT_OPENAI_BASE_URL)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(
            self.generation_timeout_secs
                .unwrap_or(DEFAULT_GENERATION_TIMEOUT_SECS),
        )
    }

    /// Raw session toggles for validation against the build mode.
    pub fn session_inputs(&self) -> SessionInputs {
        SessionInputs {
            key_file: self.session_key_file.clone(),
            cookie_secure: self.session_cookie_secure.clone(),
            same_site: self.session_same_site.clone(),
            allow_ephemeral: self.session_allow_ephemeral.clone(),
        }
    }
}
