//! Strongly typed entity identifiers.
//!
//! Every aggregate is keyed by a UUID; wrapping each in its own newtype keeps
//! a lesson id from being passed where a tenant id is expected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a new random identifier.
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Access the underlying UUID.
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }
    };
}

define_id!(
    /// Tenant (organisation) identifier.
    TenantId
);
define_id!(
    /// District identifier.
    DistrictId
);
define_id!(
    /// School identifier.
    SchoolId
);
define_id!(
    /// User identifier.
    UserId
);
define_id!(
    /// Lesson identifier.
    LessonId
);
define_id!(
    /// Lesson version identifier.
    VersionId
);
define_id!(
    /// Lesson block identifier.
    BlockId
);
define_id!(
    /// Standards framework identifier.
    FrameworkId
);
define_id!(
    /// Standard identifier.
    StandardId
);
define_id!(
    /// Audit event identifier.
    EventId
);
define_id!(
    /// Generation job identifier.
    GenerationJobId
);
define_id!(
    /// Share identifier.
    ShareId
);
define_id!(
    /// LMS connection identifier.
    LmsConnectionId
);
define_id!(
    /// LMS push identifier.
    LmsPushId
);

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn parses_and_displays_round_trip() {
        let raw = "3fa85f64-5717-4562-b3fc-2c963f66afa6";
        let id: LessonId = raw.parse().expect("valid uuid");
        assert_eq!(id.to_string(), raw);
    }

    #[rstest]
    #[case("")]
    #[case("not-a-uuid")]
    fn rejects_invalid_input(#[case] raw: &str) {
        assert!(raw.parse::<UserId>().is_err());
    }

    #[rstest]
    fn serialises_transparently() {
        let id = TenantId::from_uuid(Uuid::nil());
        let value = serde_json::to_value(id).expect("serialise id");
        assert_eq!(value, serde_json::json!("00000000-0000-0000-0000-000000000000"));
    }
}
