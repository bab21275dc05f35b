//! Port abstraction for the standards catalogue and version alignment.

use async_trait::async_trait;

use crate::domain::{NewStandard, Standard, StandardId, StandardsFramework, VersionId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by standards repository adapters.
    pub enum StandardsRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "standards repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "standards repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StandardsRepository: Send + Sync {
    /// Standards for `subject` (case-insensitive) whose grade band equals
    /// `grade_level` or is unset, ordered by code.
    async fn candidates(
        &self,
        subject: &str,
        grade_level: &str,
    ) -> Result<Vec<Standard>, StandardsRepositoryError>;

    /// Exact code matches.
    async fn find_by_codes(
        &self,
        codes: &[String],
    ) -> Result<Vec<Standard>, StandardsRepositoryError>;

    /// Codes of the standards linked to a version, ascending.
    async fn codes_for_version(
        &self,
        version_id: &VersionId,
    ) -> Result<Vec<String>, StandardsRepositoryError>;

    /// Link standards to a version; existing links are left alone.
    async fn attach(
        &self,
        version_id: &VersionId,
        standard_ids: &[StandardId],
    ) -> Result<(), StandardsRepositoryError>;

    /// Fetch a framework by code, creating it when absent.
    async fn ensure_framework(
        &self,
        code: &str,
        name: &str,
        jurisdiction: Option<String>,
    ) -> Result<StandardsFramework, StandardsRepositoryError>;

    /// Insert a standard or refresh the one with the same code.
    async fn upsert_standard(
        &self,
        standard: &NewStandard,
    ) -> Result<Standard, StandardsRepositoryError>;
}

/// Empty catalogue used when no database is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureStandardsRepository;

#[async_trait]
impl StandardsRepository for FixtureStandardsRepository {
    async fn candidates(
        &self,
        _subject: &str,
        _grade_level: &str,
    ) -> Result<Vec<Standard>, StandardsRepositoryError> {
        Ok(Vec::new())
    }

    async fn find_by_codes(
        &self,
        _codes: &[String],
    ) -> Result<Vec<Standard>, StandardsRepositoryError> {
        Ok(Vec::new())
    }

    async fn codes_for_version(
        &self,
        _version_id: &VersionId,
    ) -> Result<Vec<String>, StandardsRepositoryError> {
        Ok(Vec::new())
    }

    async fn attach(
        &self,
        _version_id: &VersionId,
        _standard_ids: &[StandardId],
    ) -> Result<(), StandardsRepositoryError> {
        Ok(())
    }

    async fn ensure_framework(
        &self,
        _code: &str,
        _name: &str,
        _jurisdiction: Option<String>,
    ) -> Result<StandardsFramework, StandardsRepositoryError> {
        Err(StandardsRepositoryError::connection("database not configured"))
    }

    async fn upsert_standard(
        &self,
        _standard: &NewStandard,
    ) -> Result<Standard, StandardsRepositoryError> {
        Err(StandardsRepositoryError::connection("database not configured"))
    }
}
