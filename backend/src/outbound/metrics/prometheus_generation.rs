//! Prometheus adapter for generation content-source counts.
//!
//! Registered against the same registry as the HTTP middleware so the
//! counter appears on `/metrics`.

use async_trait::async_trait;
use prometheus::{IntCounterVec, Opts, Registry};

use crate::domain::ports::{ContentSource, GenerationMetrics, GenerationMetricsError};

/// Prometheus-backed generation metrics recorder.
///
/// - **Name**: `lessonplan_generated_lessons_total`
/// - **Type**: Counter
/// - **Labels**: `source` (`provider` or `fallback`)
pub struct PrometheusGenerationMetrics {
    lessons_total: IntCounterVec,
}

impl PrometheusGenerationMetrics {
    /// Create and register the counter with `registry`.
    ///
    /// # Errors
    ///
    /// Returns an error if a metric with the same name is already registered.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let lessons_total = IntCounterVec::new(
            Opts::new(
                "lessonplan_generated_lessons_total",
                "Generated lessons by content source",
            ),
            &["source"],
        )?;
        registry.register(Box::new(lessons_total.clone()))?;
        Ok(Self { lessons_total })
    }
}

#[async_trait]
impl GenerationMetrics for PrometheusGenerationMetrics {
    async fn record_content(&self, source: ContentSource) -> Result<(), GenerationMetricsError> {
        self.lessons_total
            .with_label_values(&[source.as_str()])
            .inc();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_registration_is_rejected() {
        let registry = Registry::new();
        PrometheusGenerationMetrics::new(&registry).expect("first registration");
        assert!(PrometheusGenerationMetrics::new(&registry).is_err());
    }

    #[tokio::test]
    async fn counts_each_source_separately() {
        let registry = Registry::new();
        let metrics =
            PrometheusGenerationMetrics::new(&registry).expect("metric registration should succeed");

        metrics
            .record_content(ContentSource::Fallback)
            .await
            .expect("recording should succeed");
        metrics
            .record_content(ContentSource::Fallback)
            .await
            .expect("recording should succeed");
        metrics
            .record_content(ContentSource::Provider)
            .await
            .expect("recording should succeed");

        let counter = |label: &str| metrics.lessons_total.with_label_values(&[label]).get();
        assert_eq!(counter("fallback"), 2);
        assert_eq!(counter("provider"), 1);
        assert!(
            registry
                .gather()
                .iter()
                .any(|f| f.name() == "lessonplan_generated_lessons_total")
        );
    }
}
