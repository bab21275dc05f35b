//! OpenAPI stand-ins for the domain error types.
//!
//! `domain::Error` and `domain::ErrorCode` stay free of `utoipa`; these
//! shadow types describe their wire shape and register under the domain
//! paths with `#[schema(as = ...)]`.

use utoipa::ToSchema;

/// Wire form of [`crate::domain::ErrorCode`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// Validation failed or the body could not be parsed.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// No session, or the identity provider rejected the code.
    #[schema(rename = "unauthorized")]
    Unauthorized,
    /// Signed in without the admin role, or the user is inactive.
    #[schema(rename = "forbidden")]
    Forbidden,
    /// Unknown id, or an id owned by another tenant.
    #[schema(rename = "not_found")]
    NotFound,
    /// A concurrent version append or duplicate email.
    #[schema(rename = "conflict")]
    Conflict,
    /// A share link past its expiry.
    #[schema(rename = "gone")]
    Gone,
    /// Database or identity provider unreachable.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    #[schema(rename = "internal_error")]
    InternalError,
}

/// Wire form of [`crate::domain::Error`], the body of every non-2xx reply.
#[derive(ToSchema)]
#[schema(as = crate::domain::Error, rename_all = "camelCase")]
#[expect(dead_code, reason = "schema-only type; never constructed")]
pub struct ErrorSchema {
    #[schema(example = "not_found")]
    code: ErrorCodeSchema,
    #[schema(example = "lesson not found")]
    message: String,
    /// Echo of the `trace-id` response header.
    #[schema(example = "6f1c2a9e-0d1b-4c55-9e63-3f5e8d1a2b40")]
    trace_id: Option<String>,
    /// Field-level validation failures, when there are any.
    details: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use utoipa::PartialSchema;

    use crate::domain::{Error, ErrorCode};

    fn rendered<T: PartialSchema>() -> String {
        serde_json::to_string(&T::schema()).expect("schema serialises")
    }

    #[test]
    fn shadows_register_under_domain_paths() {
        assert_eq!(ErrorCodeSchema::name(), "crate.domain.ErrorCode");
        assert_eq!(ErrorSchema::name(), "crate.domain.Error");
    }

    #[rstest]
    #[case(ErrorCode::InvalidRequest)]
    #[case(ErrorCode::Unauthorized)]
    #[case(ErrorCode::Forbidden)]
    #[case(ErrorCode::NotFound)]
    #[case(ErrorCode::Conflict)]
    #[case(ErrorCode::Gone)]
    #[case(ErrorCode::ServiceUnavailable)]
    #[case(ErrorCode::InternalError)]
    fn every_domain_code_is_documented(#[case] code: ErrorCode) {
        let wire = serde_json::to_value(code).expect("code serialises");
        let wire = wire.as_str().expect("codes serialise as strings");
        assert!(rendered::<ErrorCodeSchema>().contains(&format!("\"{wire}\"")));
    }

    #[test]
    fn documented_fields_match_the_serialised_error() {
        let error = Error::invalid_request("title is required")
            .with_trace_id("6f1c2a9e-0d1b-4c55-9e63-3f5e8d1a2b40")
            .with_details(serde_json::json!({ "field": "title" }));
        let body = serde_json::to_value(error).expect("error serialises");
        let schema = rendered::<ErrorSchema>();
        for field in body.as_object().expect("error is an object").keys() {
            assert!(schema.contains(&format!("\"{field}\"")), "missing {field}");
        }
    }
}
