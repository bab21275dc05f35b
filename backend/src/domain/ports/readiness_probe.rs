//! Port for checking that a backing dependency can serve traffic.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Failures reported by a readiness check.
    pub enum ReadinessError {
        /// The dependency did not answer.
        Unavailable { message: String } => "dependency unavailable: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    /// Return `Ok` when the dependency answers.
    async fn check(&self) -> Result<(), ReadinessError>;
}
