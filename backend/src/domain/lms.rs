//! Learning-management-system connections and assignment pushes.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ids::{LessonId, LmsConnectionId, LmsPushId, TenantId, UserId, VersionId};

/// Provider key for Google Classroom.
pub const GOOGLE_CLASSROOM: &str = "google_classroom";
/// Token lifetime assumed when the client omits `expires_in`.
pub const DEFAULT_TOKEN_TTL_SECONDS: i64 = 3600;
/// Status recorded for a push the provider accepted.
pub const PUSH_STATUS_POSTED: &str = "posted";

/// Stored OAuth tokens for one provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LmsConnection {
    pub id: LmsConnectionId,
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub provider: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub metadata: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl LmsConnection {
    /// Profile captured at connection time.
    pub fn profile(&self) -> Map<String, Value> {
        self.metadata
            .get("profile")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }
}

/// Connection awaiting insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLmsConnection {
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub provider: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub metadata: Map<String, Value>,
}

/// Client request to store a Google Classroom connection.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectRequest {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub profile: Option<Map<String, Value>>,
}

impl ConnectRequest {
    /// Build the record for `user`, stamping the expiry relative to `now`.
    pub fn into_new_connection(
        self,
        tenant_id: TenantId,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> NewLmsConnection {
        let mut metadata = Map::new();
        metadata.insert(
            "profile".to_owned(),
            Value::Object(self.profile.unwrap_or_default()),
        );
        NewLmsConnection {
            tenant_id,
            user_id,
            provider: GOOGLE_CLASSROOM.to_owned(),
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: self
                .expires_in
                .map(|seconds| now + Duration::seconds(seconds)),
            metadata,
        }
    }
}

/// Client request to post a lesson as an assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushRequest {
    pub lesson_id: LessonId,
    pub course_id: String,
    pub topic_id: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Record of one push attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LmsPush {
    pub id: LmsPushId,
    pub tenant_id: TenantId,
    pub connection_id: LmsConnectionId,
    pub lesson_id: LessonId,
    pub lesson_version_id: Option<VersionId>,
    pub course_id: String,
    pub topic_id: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub status: String,
    pub external_assignment_id: Option<String>,
    pub metadata: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

/// Push awaiting insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLmsPush {
    pub tenant_id: TenantId,
    pub connection_id: LmsConnectionId,
    pub lesson_id: LessonId,
    pub lesson_version_id: Option<VersionId>,
    pub course_id: String,
    pub topic_id: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub status: String,
    pub external_assignment_id: Option<String>,
    pub metadata: Map<String, Value>,
}

/// Synthesised assignment id, since no classroom API is called.
pub fn mock_assignment_id() -> String {
    let mut bytes = [0_u8; 4];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("mock-assignment-{}", hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn assignment_id_has_eight_hex_chars() {
        let id = mock_assignment_id();
        let suffix = id.strip_prefix("mock-assignment-").expect("prefix");
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[rstest]
    #[case(Some(3600), Some(3600))]
    #[case(Some(0), Some(0))]
    #[case(None, None)]
    fn expiry_is_relative_to_now(#[case] expires_in: Option<i64>, #[case] expected: Option<i64>) {
        let now = Utc::now();
        let request = ConnectRequest {
            access_token: "token".to_owned(),
            refresh_token: None,
            expires_in,
            profile: None,
        };
        let record = request.into_new_connection(TenantId::random(), UserId::random(), now);
        assert_eq!(record.expires_at, expected.map(|s| now + Duration::seconds(s)));
        assert_eq!(record.provider, GOOGLE_CLASSROOM);
        assert_eq!(record.metadata.get("profile"), Some(&json!({})));
    }
}
