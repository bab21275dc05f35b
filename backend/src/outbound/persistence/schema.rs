//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. They are used
//! by Diesel for compile-time query validation and type-safe SQL generation.
//!
//! # Maintenance
//!
//! When migrations change the schema, this file should be regenerated or
//! manually updated to reflect those changes. The `diesel print-schema`
//! command can generate these definitions from a live database.

diesel::table! {
    /// Organisational root; every other record is scoped by a tenant.
    tenants (id) {
        id -> Uuid,
        /// Unique display name, used to find the default tenant.
        name -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    districts (id) {
        id -> Uuid,
        tenant_id -> Uuid,
        name -> Text,
    }
}

diesel::table! {
    schools (id) {
        id -> Uuid,
        district_id -> Uuid,
        name -> Text,
    }
}

diesel::table! {
    /// User accounts. `email` is unique and stored lowercased.
    users (id) {
        id -> Uuid,
        tenant_id -> Uuid,
        email -> Text,
        full_name -> Nullable<Text>,
        avatar_url -> Nullable<Text>,
        locale -> Text,
        preferred_subjects -> Array<Text>,
        preferred_grade_levels -> Array<Text>,
        is_active -> Bool,
        is_superuser -> Bool,
        district_id -> Nullable<Uuid>,
        school_id -> Nullable<Uuid>,
        created_at -> Timestamptz,
        /// Last modification timestamp, maintained by the repository.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Role grants; the composite key keeps each grant unique.
    user_roles (user_id, role) {
        user_id -> Uuid,
        role -> Text,
    }
}

diesel::table! {
    /// Mutable lesson headers pointing at their current version.
    lessons (id) {
        id -> Uuid,
        tenant_id -> Uuid,
        owner_user_id -> Uuid,
        title -> Text,
        subject -> Text,
        grade_level -> Text,
        language -> Text,
        status -> Text,
        visibility -> Text,
        tags -> Array<Text>,
        current_version_id -> Nullable<Uuid>,
        metadata -> Jsonb,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Immutable content snapshots, numbered `1..=N` per lesson.
    lesson_versions (id) {
        id -> Uuid,
        lesson_id -> Uuid,
        version_no -> Int4,
        objective -> Nullable<Text>,
        duration_minutes -> Nullable<Int4>,
        teacher_script_md -> Nullable<Text>,
        materials -> Jsonb,
        flow -> Jsonb,
        differentiation -> Jsonb,
        assessments -> Jsonb,
        accommodations -> Jsonb,
        source -> Jsonb,
        created_by_user_id -> Nullable<Uuid>,
        created_at -> Timestamptz,
        published_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    lesson_blocks (id) {
        id -> Uuid,
        lesson_version_id -> Uuid,
        block_type -> Text,
        sequence -> Int4,
        content_md -> Text,
        est_minutes -> Nullable<Int4>,
        metadata -> Jsonb,
    }
}

diesel::table! {
    standards_frameworks (id) {
        id -> Uuid,
        code -> Text,
        name -> Text,
        jurisdiction -> Nullable<Text>,
    }
}

diesel::table! {
    standards (id) {
        id -> Uuid,
        framework_id -> Uuid,
        code -> Text,
        grade_band -> Nullable<Text>,
        subject -> Text,
        description -> Text,
        tags -> Array<Text>,
        metadata -> Jsonb,
    }
}

diesel::table! {
    /// Version-to-standard links; each pair appears at most once.
    lesson_standards (lesson_version_id, standard_id) {
        lesson_version_id -> Uuid,
        standard_id -> Uuid,
    }
}

diesel::table! {
    /// Audit rows for generation attempts.
    generation_jobs (id) {
        id -> Uuid,
        tenant_id -> Uuid,
        user_id -> Uuid,
        status -> Text,
        prompt_payload -> Jsonb,
        result_payload -> Nullable<Jsonb>,
        error_message -> Nullable<Text>,
        lesson_id -> Nullable<Uuid>,
        lesson_version_id -> Nullable<Uuid>,
        created_at -> Timestamptz,
        completed_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Append-only audit log.
    events (id) {
        id -> Uuid,
        tenant_id -> Uuid,
        user_id -> Nullable<Uuid>,
        action -> Text,
        metadata -> Jsonb,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Per-tenant daily counters derived from `events`.
    metrics_daily (tenant_id, metric_date, metric_name) {
        tenant_id -> Uuid,
        metric_date -> Date,
        metric_name -> Text,
        value -> Int8,
    }
}

diesel::table! {
    shares (id) {
        id -> Uuid,
        tenant_id -> Uuid,
        lesson_id -> Uuid,
        lesson_version_id -> Uuid,
        token -> Text,
        created_by_user_id -> Nullable<Uuid>,
        expires_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    lms_connections (id) {
        id -> Uuid,
        tenant_id -> Uuid,
        user_id -> Uuid,
        provider -> Text,
        access_token -> Text,
        refresh_token -> Nullable<Text>,
        expires_at -> Nullable<Timestamptz>,
        metadata -> Jsonb,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    lms_pushes (id) {
        id -> Uuid,
        tenant_id -> Uuid,
        connection_id -> Uuid,
        lesson_id -> Uuid,
        lesson_version_id -> Nullable<Uuid>,
        course_id -> Text,
        topic_id -> Nullable<Text>,
        due_date -> Nullable<Timestamptz>,
        status -> Text,
        external_assignment_id -> Nullable<Text>,
        metadata -> Jsonb,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(districts -> tenants (tenant_id));
diesel::joinable!(schools -> districts (district_id));
diesel::joinable!(user_roles -> users (user_id));
diesel::joinable!(lesson_blocks -> lesson_versions (lesson_version_id));
diesel::joinable!(standards -> standards_frameworks (framework_id));
diesel::joinable!(lesson_standards -> lesson_versions (lesson_version_id));
diesel::joinable!(lesson_standards -> standards (standard_id));
diesel::joinable!(lms_pushes -> lms_connections (connection_id));

diesel::allow_tables_to_appear_in_same_query!(
    tenants,
    districts,
    schools,
    users,
    user_roles,
    lessons,
    lesson_versions,
    lesson_blocks,
    standards_frameworks,
    standards,
    lesson_standards,
    generation_jobs,
    events,
    metrics_daily,
    shares,
    lms_connections,
    lms_pushes,
);
