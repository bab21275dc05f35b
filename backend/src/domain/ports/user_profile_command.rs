//! Driving port for self-service profile edits.

use async_trait::async_trait;

use crate::domain::{Error, User};

/// Profile fields a user may change; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub locale: Option<String>,
    pub preferred_subjects: Option<Vec<String>>,
    pub preferred_grade_levels: Option<Vec<String>>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserProfileCommand: Send + Sync {
    /// Apply `update` to the actor's own record.
    async fn update_profile(&self, actor: &User, update: ProfileUpdate) -> Result<User, Error>;
}
