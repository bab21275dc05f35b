//! Prometheus middleware wiring for the `metrics` feature.
//!
//! The HTTP middleware owns the registry; the generation counter registers
//! against it so both appear on `/metrics`.

use std::sync::Arc;

use actix_service::{
    Service, ServiceExt as _, Transform,
    boxed::{self, BoxService},
};
use actix_web::body::{BoxBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::middleware::Compat;
use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use lessonplan::domain::ports::GenerationMetrics;
use lessonplan::outbound::metrics::PrometheusGenerationMetrics;

const METRICS_NAMESPACE: &str = "lessonplan";
const METRICS_ENDPOINT: &str = "/metrics";

/// Run `make` and keep the middleware only when it builds.
pub(crate) fn initialize_metrics<F, E>(make: F) -> Option<PrometheusMetrics>
where
    F: FnOnce() -> Result<PrometheusMetrics, E>,
    E: std::fmt::Display,
{
    match make() {
        Ok(metrics) => Some(metrics),
        Err(error) => {
            warn!(%error, "prometheus metrics disabled");
            None
        }
    }
}

/// Build the default middleware exposing `/metrics`.
pub(crate) fn default_metrics() -> Option<PrometheusMetrics> {
    initialize_metrics(|| {
        PrometheusMetricsBuilder::new(METRICS_NAMESPACE)
            .endpoint(METRICS_ENDPOINT)
            .build()
    })
}

/// Register the generation counter with the middleware's registry.
pub(crate) fn generation_metrics(
    prometheus: Option<&PrometheusMetrics>,
) -> Option<Arc<dyn GenerationMetrics>> {
    let prometheus = prometheus?;
    match PrometheusGenerationMetrics::new(&prometheus.registry) {
        Ok(metrics) => Some(Arc::new(metrics)),
        Err(error) => {
            warn!(%error, "generation metrics registration failed");
            None
        }
    }
}

/// Middleware that applies Prometheus instrumentation when configured and
/// passes requests straight through otherwise.
#[derive(Clone)]
pub(crate) enum MetricsLayer {
    Enabled(Arc<PrometheusMetrics>),
    Disabled,
}

impl MetricsLayer {
    #[must_use]
    pub(crate) fn from_option(metrics: Option<PrometheusMetrics>) -> Self {
        metrics.map_or(Self::Disabled, |metrics| Self::Enabled(Arc::new(metrics)))
    }
}

impl<S, B> Transform<S, ServiceRequest> for MetricsLayer
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = BoxService<ServiceRequest, ServiceResponse<BoxBody>, actix_web::Error>;
    type Future = LocalBoxFuture<'static, Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        match self {
            Self::Enabled(metrics) => {
                let pending = Compat::new((**metrics).clone()).new_transform(service);
                Box::pin(async move { Ok(boxed::service(pending.await?)) })
            }
            Self::Disabled => {
                let passthrough = service.map(ServiceResponse::map_into_boxed_body);
                Box::pin(async move { Ok(boxed::service(passthrough)) })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_builds_disable_metrics() {
        assert!(initialize_metrics(|| -> Result<PrometheusMetrics, &str> { Err("boom") }).is_none());
    }

    #[test]
    fn generation_counter_shares_the_middleware_registry() {
        let prometheus = PrometheusMetricsBuilder::new("test")
            .endpoint("/metrics")
            .build()
            .expect("metrics should build for tests");
        assert!(generation_metrics(Some(&prometheus)).is_some());
        assert!(generation_metrics(None).is_none());
    }
}
