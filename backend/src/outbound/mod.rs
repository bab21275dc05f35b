//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **generation**: HTTP client for the language-model provider
//! - **documents**: PDF and DOCX renderers for lesson exports
//! - **metrics**: Prometheus-backed metrics exporters (feature-gated)
//!
//! Adapters translate between domain types and infrastructure
//! representations. They contain no business logic.

pub mod documents;
pub mod generation;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod persistence;
