//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! Provides a thin wrapper around Actix sessions so handlers only deal with
//! domain-friendly operations such as recording a login or reading the
//! signed-in user id.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::{Error, TenantId, User, UserId};

pub(crate) const USER_ID_KEY: &str = "user_id";
pub(crate) const TENANT_ID_KEY: &str = "tenant_id";

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Record a successful login by storing the user and tenant ids.
    pub fn persist_login(&self, user: &User) -> Result<(), Error> {
        self.0.renew();
        self.insert(USER_ID_KEY, &user.id.to_string())?;
        self.insert(TENANT_ID_KEY, &user.tenant_id.to_string())
    }

    fn insert(&self, key: &str, value: &str) -> Result<(), Error> {
        self.0
            .insert(key, value)
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    fn read<T: std::str::FromStr>(&self, key: &str) -> Result<Option<T>, Error> {
        let raw = self
            .0
            .get::<String>(key)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))?;
        Ok(raw.and_then(|value| match value.parse::<T>() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                warn!(key, "invalid identifier in session cookie");
                None
            }
        }))
    }

    /// Fetch the current user id from the session, if present.
    pub fn user_id(&self) -> Result<Option<UserId>, Error> {
        self.read(USER_ID_KEY)
    }

    /// Fetch the tenant recorded at login, if present.
    pub fn tenant_id(&self) -> Result<Option<TenantId>, Error> {
        self.read(TENANT_ID_KEY)
    }

    /// Require an authenticated user id or return `401 Unauthorized`.
    pub fn require_user_id(&self) -> Result<UserId, Error> {
        self.user_id()?
            .ok_or_else(|| Error::unauthorized("Not authenticated"))
    }

    /// Drop every value stored in the session.
    pub fn clear(&self) {
        self.0.purge();
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
