//! Audience-specific differentiation of lesson content.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::lesson::{DifferentiationEntry, TypedNote, VersionContent};

/// Strategy label used for free-form teacher notes.
const NOTES_STRATEGY: &str = "Notes";

/// Learner group a differentiated version targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Audience {
    Ell,
    Iep,
    Gifted,
}

/// Error returned for an audience outside `ELL`, `IEP`, `GIFTED`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported audience: {0}")]
pub struct UnknownAudienceError(pub String);

impl Audience {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ell => "ELL",
            Self::Iep => "IEP",
            Self::Gifted => "GIFTED",
        }
    }

    /// The differentiation strategy appended for this audience.
    pub fn strategy(self) -> DifferentiationEntry {
        let (strategy, description) = match self {
            Self::Ell => (
                "ELL",
                "Provide visuals, vocabulary scaffolds, and sentence frames.",
            ),
            Self::Iep => (
                "IEP",
                "Chunk tasks, provide guided notes, and allow extra processing time.",
            ),
            Self::Gifted => (
                "Gifted",
                "Offer extension projects and inquiry-based challenges.",
            ),
        };
        DifferentiationEntry {
            strategy: strategy.to_owned(),
            description: description.to_owned(),
        }
    }

    /// The accommodation appended for this audience.
    pub fn accommodation(self) -> TypedNote {
        let (kind, description) = match self {
            Self::Ell => ("Supports", "Glossary with visuals and translated summaries."),
            Self::Iep => (
                "Supports",
                "Flexible grouping and assistive technology options.",
            ),
            Self::Gifted => ("Extension", "Opportunities for independent research."),
        };
        TypedNote {
            kind: kind.to_owned(),
            description: description.to_owned(),
        }
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Audience {
    type Err = UnknownAudienceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ELL" => Ok(Self::Ell),
            "IEP" => Ok(Self::Iep),
            "GIFTED" => Ok(Self::Gifted),
            _ => Err(UnknownAudienceError(s.to_owned())),
        }
    }
}

/// Clone `base` and append the audience's strategy, accommodation, and
/// optional notes. The base content is left untouched.
pub fn differentiate_content(
    base: &VersionContent,
    audience: Audience,
    notes: Option<&str>,
) -> VersionContent {
    let mut content = base.clone();
    content.differentiation.push(audience.strategy());
    content.accommodations.push(audience.accommodation());
    if let Some(notes) = notes.map(str::trim).filter(|notes| !notes.is_empty()) {
        content.differentiation.push(DifferentiationEntry {
            strategy: NOTES_STRATEGY.to_owned(),
            description: notes.to_owned(),
        });
    }
    content
}
