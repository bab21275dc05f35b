//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! This module provides concrete implementations of domain repository ports
//! backed by PostgreSQL via the Diesel ORM with async support through
//! `diesel-async` and `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: Repository implementations only translate between
//!   Diesel models and domain types. Tenant scoping is applied in every
//!   query; business rules stay in the domain services.
//! - **Internal models**: Diesel row structs (`models.rs`) and schema
//!   definitions (`schema.rs`) are internal implementation details, never
//!   exposed to the domain layer.
//! - **Transactional audit**: Mutations write their audit event and bump the
//!   daily metric in the same transaction.
//! - **Strongly typed errors**: All database errors are mapped to domain
//!   persistence error types.
//!
//! # Example
//!
//! ```ignore
//! use lessonplan::outbound::persistence::{DbPool, DieselLessonRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/lessonplan")).await?;
//! let lessons = DieselLessonRepository::new(pool);
//! ```

mod diesel_basic_error_mapping;
mod diesel_event_repository;
mod diesel_generation_job_repository;
mod diesel_helpers;
mod diesel_lesson_repository;
mod diesel_lms_repository;
mod diesel_readiness_probe;
mod diesel_share_repository;
mod diesel_standards_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_event_repository::DieselEventRepository;
pub use diesel_generation_job_repository::DieselGenerationJobRepository;
pub use diesel_lesson_repository::DieselLessonRepository;
pub use diesel_lms_repository::DieselLmsRepository;
pub use diesel_readiness_probe::DieselReadinessProbe;
pub use diesel_share_repository::DieselShareRepository;
pub use diesel_standards_repository::DieselStandardsRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_migrations, run_migrations_blocking};
pub use pool::{DbPool, PoolConfig, PoolError};
