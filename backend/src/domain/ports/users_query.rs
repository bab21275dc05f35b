//! Driving port for user-facing queries.

use async_trait::async_trait;

use crate::domain::{Error, User, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsersQuery: Send + Sync {
    /// Resolve the session user.
    ///
    /// Unknown users are unauthorised and deactivated users are forbidden.
    async fn current_user(&self, user_id: &UserId) -> Result<User, Error>;

    /// Users in the actor's tenant; admin only.
    async fn list_users(&self, actor: &User) -> Result<Vec<User>, Error>;
}
