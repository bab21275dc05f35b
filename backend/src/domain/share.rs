//! Read-only share links.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::ids::{LessonId, ShareId, TenantId, UserId, VersionId};
use super::lesson::LessonVersion;

/// Characters used for share tokens; excludes look-alikes such as `0/O`
/// and `1/l/I`.
pub const TOKEN_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnpqrstuvwxyz23456789";
/// Length of generated share tokens.
pub const TOKEN_LENGTH: usize = 32;
/// Time-to-live applied when the client does not choose one.
pub const DEFAULT_SHARE_TTL_HOURS: u32 = 72;

/// Generate an opaque share token from the thread-local CSPRNG.
pub fn generate_share_token() -> String {
    let mut rng = rand::thread_rng();
    (0..TOKEN_LENGTH)
        .map(|_| {
            let index = rng.gen_range(0..TOKEN_ALPHABET.len());
            char::from(TOKEN_ALPHABET.get(index).copied().unwrap_or(b'A'))
        })
        .collect()
}

/// Expiry for a share created at `now`; `None` never expires.
pub fn share_expiry(now: DateTime<Utc>, ttl_hours: Option<u32>) -> Option<DateTime<Utc>> {
    ttl_hours.map(|hours| now + Duration::hours(i64::from(hours)))
}

/// Public URL for a share token.
pub fn share_url(frontend_url: &str, token: &str) -> String {
    format!("{}/share/{token}", frontend_url.trim_end_matches('/'))
}

/// Stored share record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    pub id: ShareId,
    pub tenant_id: TenantId,
    pub lesson_id: LessonId,
    pub lesson_version_id: VersionId,
    pub token: String,
    pub created_by_user_id: Option<UserId>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Share {
    /// Whether the share has lapsed at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at < now)
    }
}

/// Share awaiting insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShare {
    pub tenant_id: TenantId,
    pub lesson_id: LessonId,
    pub lesson_version_id: VersionId,
    pub token: String,
    pub created_by_user_id: Option<UserId>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Link handed back to the sharer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    pub token: String,
    pub url: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// What an anonymous viewer of a share receives.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedLesson {
    pub lesson_id: LessonId,
    pub lesson_version: LessonVersion,
    pub expires_at: Option<DateTime<Utc>>,
}
