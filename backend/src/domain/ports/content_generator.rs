//! Port abstraction for language-model lesson content generation.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by content generator adapters.
    pub enum ContentGeneratorError {
        /// No provider credentials are configured.
        NotConfigured => "content generator is not configured",
        /// The provider could not be reached.
        Transport { message: String } => "content generator transport failed: {message}",
        /// The provider did not answer in time.
        Timeout { message: String } => "content generator timed out: {message}",
        /// The provider throttled the request.
        RateLimited { message: String } => "content generator rate limited: {message}",
        /// The provider rejected the request.
        InvalidRequest { message: String } => "content generator rejected request: {message}",
        /// The provider answered with an unreadable payload.
        Decode { message: String } => "content generator response invalid: {message}",
    }
}

/// Raw text produced by a provider together with the model that wrote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorReply {
    pub model: String,
    pub text: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Complete `prompt`, expecting a JSON object describing a lesson.
    async fn generate(&self, prompt: &str) -> Result<GeneratorReply, ContentGeneratorError>;
}

/// Generator used when no API key is configured; every call falls back.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredContentGenerator;

#[async_trait]
impl ContentGenerator for UnconfiguredContentGenerator {
    async fn generate(&self, _prompt: &str) -> Result<GeneratorReply, ContentGeneratorError> {
        Err(ContentGeneratorError::not_configured())
    }
}
