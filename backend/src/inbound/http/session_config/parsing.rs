//! Parsing helpers for raw session toggles.

use actix_web::cookie::SameSite;
use tracing::warn;

use super::{BuildMode, SAME_SITE_SETTING, SessionConfigError};

const BOOL_EXPECTED: &str = "1|0|true|false|yes|no|y|n";
const SAME_SITE_EXPECTED: &str = "Strict|Lax|None";

/// A boolean toggle and the value debug builds fall back to.
pub(super) struct BoolSetting {
    name: &'static str,
    default_value: bool,
}

impl BoolSetting {
    pub(super) const fn new(name: &'static str, default_value: bool) -> Self {
        Self {
            name,
            default_value,
        }
    }
}

pub(super) fn parse_bool_setting(
    raw: Option<&str>,
    mode: BuildMode,
    setting: BoolSetting,
) -> Result<bool, SessionConfigError> {
    let BoolSetting {
        name,
        default_value,
    } = setting;
    let Some(value) = raw else {
        return warn_or_fail(mode, default_value, SessionConfigError::Missing { name }, || {
            warn!("{name} not set; defaulting to {default_value}");
        });
    };
    match parse_bool(value) {
        Some(flag) => Ok(flag),
        None => warn_or_fail(
            mode,
            default_value,
            SessionConfigError::Invalid {
                name,
                value: value.to_owned(),
                expected: BOOL_EXPECTED,
            },
            || warn!(value, "invalid {name}; defaulting to {default_value}"),
        ),
    }
}

/// Return `fallback` with a warning in debug builds, `error` in release.
pub(super) fn warn_or_fail<T, F>(
    mode: BuildMode,
    fallback: T,
    error: SessionConfigError,
    warn_fn: F,
) -> Result<T, SessionConfigError>
where
    F: FnOnce(),
{
    if mode.is_debug() {
        warn_fn();
        Ok(fallback)
    } else {
        Err(error)
    }
}

pub(super) fn parse_same_site_value(
    value: &str,
    mode: BuildMode,
    cookie_secure: bool,
    default_same_site: SameSite,
) -> Result<SameSite, SessionConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "lax" => Ok(SameSite::Lax),
        "strict" => Ok(SameSite::Strict),
        "none" => {
            if !cookie_secure {
                warn_or_fail(mode, (), SessionConfigError::InsecureSameSiteNone, || {
                    warn!("SameSite=None without a secure cookie; browsers may reject it");
                })?;
            }
            Ok(SameSite::None)
        }
        _ => warn_or_fail(
            mode,
            default_same_site,
            SessionConfigError::Invalid {
                name: SAME_SITE_SETTING,
                value: value.to_owned(),
                expected: SAME_SITE_EXPECTED,
            },
            || warn!(value, "invalid {SAME_SITE_SETTING}; using default"),
        ),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}
