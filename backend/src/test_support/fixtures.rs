//! Sample domain values used across unit tests.

use chrono::{DateTime, Utc};
use serde_json::Map;

use crate::domain::{
    EmailAddress, FlowStep, GenerationInput, Lesson, LessonHeader, LessonId, LessonStatus,
    LessonVersion, MaterialItem, Role, TenantId, User, UserId, VersionContent, VersionId,
    Visibility,
};

/// Active teacher in `tenant_id`.
pub fn teacher(tenant_id: TenantId) -> User {
    user_with_roles(tenant_id, "teacher@example.edu", vec![Role::teacher()])
}

/// Active tenant administrator in `tenant_id`.
pub fn admin(tenant_id: TenantId) -> User {
    let role = Role::new(Role::ADMIN).unwrap_or_else(|_| Role::teacher());
    user_with_roles(tenant_id, "admin@example.edu", vec![role])
}

pub fn user_with_roles(tenant_id: TenantId, email: &str, roles: Vec<Role>) -> User {
    let now = Utc::now();
    User {
        id: UserId::random(),
        tenant_id,
        email: EmailAddress::new(email).expect("fixture email"),
        full_name: Some("Ada Lovelace".to_owned()),
        avatar_url: None,
        locale: "en".to_owned(),
        preferred_subjects: Vec::new(),
        preferred_grade_levels: Vec::new(),
        is_active: true,
        is_superuser: false,
        district_id: None,
        school_id: None,
        roles,
        created_at: now,
        updated_at: now,
    }
}

pub fn header(title: &str, subject: &str, grade_level: &str, tags: &[&str]) -> LessonHeader {
    LessonHeader {
        title: title.to_owned(),
        subject: subject.to_owned(),
        grade_level: grade_level.to_owned(),
        language: "en".to_owned(),
        status: LessonStatus::Draft,
        visibility: Visibility::Private,
        tags: tags.iter().map(|tag| (*tag).to_owned()).collect(),
        metadata: Map::new(),
    }
}

pub fn content(objective: &str) -> VersionContent {
    VersionContent {
        objective: Some(objective.to_owned()),
        duration_minutes: Some(45),
        materials: vec![MaterialItem {
            kind: Some("text".to_owned()),
            label: Some("Handout".to_owned()),
            value: "Water cycle diagram".to_owned(),
        }],
        flow: vec![FlowStep {
            phase: Some("Engage".to_owned()),
            minutes: Some(10),
            content_md: "Warm-up".to_owned(),
        }],
        ..VersionContent::default()
    }
}

pub fn lesson(tenant_id: TenantId, title: &str) -> Lesson {
    let now = Utc::now();
    Lesson {
        id: LessonId::random(),
        tenant_id,
        owner_user_id: UserId::random(),
        title: title.to_owned(),
        subject: "Science".to_owned(),
        grade_level: "5".to_owned(),
        language: "en".to_owned(),
        status: LessonStatus::Draft,
        visibility: Visibility::Private,
        tags: Vec::new(),
        current_version_id: None,
        metadata: Map::new(),
        created_at: now,
        updated_at: now,
    }
}

pub fn version(lesson_id: LessonId, version_no: u32, created_at: DateTime<Utc>) -> LessonVersion {
    LessonVersion {
        id: VersionId::random(),
        lesson_id,
        version_no,
        content: content("Describe the water cycle"),
        blocks: Vec::new(),
        created_by_user_id: None,
        created_at,
        published_at: None,
    }
}

pub fn water_cycle_input() -> GenerationInput {
    GenerationInput {
        subject: "Science".to_owned(),
        grade_level: "5".to_owned(),
        topic: "Water Cycle".to_owned(),
        duration_minutes: 45,
        teaching_style: "Inquiry".to_owned(),
        focus_keywords: vec!["evaporation".to_owned(), "condensation".to_owned()],
        standard_codes: None,
    }
}
