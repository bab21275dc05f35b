//! `define_port_error!`: error enums for driven ports.
//!
//! Each `Variant { field: Type } => "message"` line expands to a
//! `thiserror` variant and a snake_case constructor, so adapters write
//! `LessonRepositoryError::query(err.to_string())` or
//! `LessonRepositoryError::version_conflict(lesson_id, 3)`.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            #[must_use]
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),+ }) => {
        ::paste::paste! {
            #[must_use]
            pub fn [<$variant:snake>]($($field: impl Into<$ty>),+) -> Self {
                Self::$variant { $($field: $field.into()),+ }
            }
        }
    };

    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),+ $(,)? } )? => $message:literal
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),+ } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),+ } )?);
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    use rstest::rstest;

    define_port_error! {
        /// Shaped like the lesson repository errors.
        pub enum SampleError {
            Query { message: String } => "query failed: {message}",
            VersionConflict { lesson: String, version_no: i32 } =>
                "lesson {lesson} already has version {version_no}",
            NotConfigured => "not configured",
        }
    }

    #[rstest]
    #[case(SampleError::query("deadlock"), "query failed: deadlock")]
    #[case(SampleError::query(String::from("timeout")), "query failed: timeout")]
    #[case(
        SampleError::version_conflict("algebra-1", 3),
        "lesson algebra-1 already has version 3"
    )]
    #[case(SampleError::not_configured(), "not configured")]
    fn constructors_render_their_message(#[case] error: SampleError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[test]
    fn constructors_build_the_named_variant() {
        assert_eq!(
            SampleError::version_conflict("x", 2),
            SampleError::VersionConflict {
                lesson: "x".to_owned(),
                version_no: 2,
            }
        );
    }
}
