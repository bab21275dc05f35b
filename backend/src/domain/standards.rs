//! Standards catalogue entries and keyword ranking.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ids::{FrameworkId, StandardId};

/// Suggestions returned when the caller does not ask for a specific count.
pub const DEFAULT_SUGGESTION_LIMIT: usize = 5;

const KEYWORD_MATCH_SCORE: u32 = 2;
const TAG_MATCH_SCORE: u32 = 1;

/// A published standards framework (e.g. NGSS).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardsFramework {
    pub id: FrameworkId,
    pub code: String,
    pub name: String,
    pub jurisdiction: Option<String>,
}

/// Catalogue entry that lesson versions may be aligned to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standard {
    pub id: StandardId,
    pub framework_id: FrameworkId,
    pub code: String,
    pub grade_band: Option<String>,
    pub subject: String,
    pub description: String,
    pub tags: Vec<String>,
    pub metadata: Map<String, Value>,
}

/// Catalogue entry awaiting upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStandard {
    pub framework_id: FrameworkId,
    pub code: String,
    pub grade_band: Option<String>,
    pub subject: String,
    pub description: String,
    pub tags: Vec<String>,
    pub metadata: Map<String, Value>,
}

/// Lowercase, trim, drop blanks, and deduplicate keywords preserving order.
pub fn normalise_keywords<S: AsRef<str>>(keywords: &[S]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(keywords.len());
    for keyword in keywords {
        let normalised = keyword.as_ref().trim().to_lowercase();
        if !normalised.is_empty() && !seen.contains(&normalised) {
            seen.push(normalised);
        }
    }
    seen
}

/// Relevance of `standard` for already-normalised keywords.
///
/// Each keyword found in the code, description, or tags scores 2; a keyword
/// also found in a tag scores 1 more.
pub fn score_standard(standard: &Standard, keywords: &[String]) -> u32 {
    let tags: Vec<String> = standard.tags.iter().map(|tag| tag.to_lowercase()).collect();
    let haystack = format!(
        "{} {} {}",
        standard.code,
        standard.description,
        standard.tags.join(" ")
    )
    .to_lowercase();

    keywords.iter().fold(0, |score, keyword| {
        let mut gained = 0;
        if haystack.contains(keyword.as_str()) {
            gained += KEYWORD_MATCH_SCORE;
        }
        if tags.iter().any(|tag| tag.contains(keyword.as_str())) {
            gained += TAG_MATCH_SCORE;
        }
        score + gained
    })
}

/// Rank `candidates` by keyword relevance and keep the first `limit`.
///
/// The sort is stable so equal scores keep catalogue order. Without keywords
/// the first `limit` candidates are returned unchanged.
pub fn rank_standards<S: AsRef<str>>(
    candidates: Vec<Standard>,
    keywords: &[S],
    limit: usize,
) -> Vec<Standard> {
    let keywords = normalise_keywords(keywords);
    if keywords.is_empty() {
        return candidates.into_iter().take(limit).collect();
    }
    let mut scored: Vec<(u32, Standard)> = candidates
        .into_iter()
        .map(|standard| (score_standard(&standard, &keywords), standard))
        .collect();
    scored.sort_by(|(left, _), (right, _)| right.cmp(left));
    scored
        .into_iter()
        .take(limit)
        .map(|(_, standard)| standard)
        .collect()
}

/// Seed file describing frameworks and their standards.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StandardsCatalogue {
    #[serde(default)]
    pub frameworks: Vec<CatalogueFramework>,
}

/// One framework entry in a [`StandardsCatalogue`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogueFramework {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub jurisdiction: Option<String>,
    #[serde(default)]
    pub standards: Vec<CatalogueStandard>,
}

/// One standard entry in a [`CatalogueFramework`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogueStandard {
    pub code: String,
    #[serde(default)]
    pub grade_band: Option<String>,
    pub subject: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CatalogueStandard {
    pub fn into_new_standard(self, framework_id: FrameworkId) -> NewStandard {
        NewStandard {
            framework_id,
            code: self.code,
            grade_band: self.grade_band,
            subject: self.subject,
            description: self.description,
            tags: self.tags,
            metadata: Map::new(),
        }
    }
}
