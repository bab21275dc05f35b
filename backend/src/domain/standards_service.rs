//! Standards suggestion and catalogue seeding.

use std::sync::Arc;

use tracing::info;

use crate::domain::port_error_mapping::map_standards_error;
use crate::domain::ports::StandardsRepository;
use crate::domain::{
    DEFAULT_SUGGESTION_LIMIT, Error, GenerationInput, Standard, StandardsCatalogue,
    rank_standards,
};

/// Standards lookups shared by generation and catalogue seeding.
#[derive(Clone)]
pub struct StandardsService<S> {
    repo: Arc<S>,
}

impl<S> StandardsService<S> {
    pub fn new(repo: Arc<S>) -> Self {
        Self { repo }
    }
}

impl<S> StandardsService<S>
where
    S: StandardsRepository,
{
    /// Rank the subject/grade candidates against `keywords`.
    pub async fn suggest(
        &self,
        subject: &str,
        grade_level: &str,
        keywords: &[String],
        limit: usize,
    ) -> Result<Vec<Standard>, Error> {
        let candidates = self
            .repo
            .candidates(subject, grade_level)
            .await
            .map_err(map_standards_error)?;
        Ok(rank_standards(candidates, keywords, limit))
    }

    /// Standards for a generated lesson: explicit codes when they match
    /// anything, keyword suggestions otherwise.
    pub async fn resolve_for(&self, input: &GenerationInput) -> Result<Vec<Standard>, Error> {
        if let Some(codes) = input.explicit_codes() {
            let explicit = self
                .repo
                .find_by_codes(codes)
                .await
                .map_err(map_standards_error)?;
            if !explicit.is_empty() {
                return Ok(explicit);
            }
        }
        self.suggest(
            &input.subject,
            &input.grade_level,
            &input.suggestion_keywords(),
            DEFAULT_SUGGESTION_LIMIT,
        )
        .await
    }

    /// Upsert every framework and standard in `catalogue`. Returns the
    /// number of standards written.
    pub async fn import_catalogue(&self, catalogue: StandardsCatalogue) -> Result<usize, Error> {
        let mut written = 0;
        for framework in catalogue.frameworks {
            let stored = self
                .repo
                .ensure_framework(&framework.code, &framework.name, framework.jurisdiction)
                .await
                .map_err(map_standards_error)?;
            for standard in framework.standards {
                self.repo
                    .upsert_standard(&standard.into_new_standard(stored.id))
                    .await
                    .map_err(map_standards_error)?;
                written += 1;
            }
            info!(framework = %stored.code, "standards framework imported");
        }
        Ok(written)
    }
}
