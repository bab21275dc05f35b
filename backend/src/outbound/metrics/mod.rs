//! Outbound adapters for metrics exporting.
//!
//! Prometheus-backed implementations of domain metrics ports, compiled only
//! with the `metrics` feature.

mod prometheus_generation;

pub use prometheus_generation::PrometheusGenerationMetrics;
