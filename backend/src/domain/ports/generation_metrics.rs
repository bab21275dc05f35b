//! Port for counting where generated lesson content came from.
//!
//! Lets operators see how often the provider is bypassed in favour of the
//! template fallback without coupling the orchestrator to a metrics backend.

use std::fmt;

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors exposed when recording generation metrics.
    pub enum GenerationMetricsError {
        /// Metric exporter rejected the write.
        Export { message: String } => "generation metrics exporter failed: {message}",
    }
}

/// Origin of the content in a generated lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentSource {
    /// The configured provider produced usable output.
    Provider,
    /// The template lesson was used instead.
    Fallback,
}

impl ContentSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Provider => "provider",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for ContentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationMetrics: Send + Sync {
    /// Count one generated lesson by content source.
    async fn record_content(&self, source: ContentSource) -> Result<(), GenerationMetricsError>;
}

/// Discards every write; used when metrics are disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpGenerationMetrics;

#[async_trait]
impl GenerationMetrics for NoOpGenerationMetrics {
    async fn record_content(&self, _source: ContentSource) -> Result<(), GenerationMetricsError> {
        Ok(())
    }
}
