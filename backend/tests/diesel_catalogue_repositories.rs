//! Integration tests for the standards catalogue and generation job audit
//! adapters against embedded PostgreSQL.

mod support;

use lessonplan::domain::ports::{
    GenerationJobRepository, GenerationJobRepositoryError, StandardsRepository,
};
use lessonplan::domain::{JobOutcome, JobStatus, NewStandard, StandardsFramework};
use lessonplan::outbound::persistence::{DieselGenerationJobRepository, DieselStandardsRepository};
use rstest::rstest;
use serde_json::{Map, json};

use support::{now, test_database};

fn standard(framework: &StandardsFramework, code: &str, grade_band: Option<&str>) -> NewStandard {
    NewStandard {
        framework_id: framework.id,
        code: code.to_owned(),
        grade_band: grade_band.map(str::to_owned),
        subject: "Math".to_owned(),
        description: format!("Standard {code}"),
        tags: vec!["fractions".to_owned()],
        metadata: Map::new(),
    }
}

#[rstest]
fn candidates_match_grade_or_any_and_sort_by_code() {
    let Some(database) = test_database(2) else {
        return;
    };
    let repository = DieselStandardsRepository::new(database.pool.clone());

    let codes = database.runtime.block_on(async {
        let framework = repository
            .ensure_framework("CCSS", "Common Core", Some("US".to_owned()))
            .await
            .expect("framework");
        for (code, band) in [
            ("MATH.3.NF.3", Some("3")),
            ("MATH.3.NF.1", Some("3")),
            ("MATH.K.CC.1", None),
            ("MATH.4.NF.1", Some("4")),
        ] {
            repository
                .upsert_standard(&standard(&framework, code, band))
                .await
                .expect("standard stored");
        }
        repository
            .candidates("math", "3")
            .await
            .expect("candidates load")
    });

    let codes: Vec<&str> = codes.iter().map(|standard| standard.code.as_str()).collect();
    assert_eq!(codes, ["MATH.3.NF.1", "MATH.3.NF.3", "MATH.K.CC.1"]);
}

#[rstest]
fn upsert_refreshes_an_existing_code() {
    let Some(database) = test_database(2) else {
        return;
    };
    let repository = DieselStandardsRepository::new(database.pool.clone());

    let (first, second, all) = database.runtime.block_on(async {
        let framework = repository
            .ensure_framework("CCSS", "Common Core", None)
            .await
            .expect("framework");
        let again = repository
            .ensure_framework("CCSS", "Renamed", None)
            .await
            .expect("framework");
        assert_eq!(again.id, framework.id);

        let first = repository
            .upsert_standard(&standard(&framework, "MATH.3.NF.1", Some("3")))
            .await
            .expect("inserted");
        let mut revised = standard(&framework, "MATH.3.NF.1", Some("3"));
        revised.description = "Understand a fraction 1/b".to_owned();
        let second = repository
            .upsert_standard(&revised)
            .await
            .expect("updated");
        let all = repository
            .find_by_codes(&["MATH.3.NF.1".to_owned()])
            .await
            .expect("lookup");
        (first, second, all)
    });

    assert_eq!(first.id, second.id);
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].description, "Understand a fraction 1/b");
}

#[rstest]
fn jobs_finish_exactly_once() {
    let Some(database) = test_database(2) else {
        return;
    };
    let teacher = database.seed_teacher("Lincoln Unified", "teacher@lincoln.example");
    let repository = DieselGenerationJobRepository::new(database.pool.clone());
    let failed = JobOutcome::Failed {
        error_message: "provider timed out".to_owned(),
    };

    let (started, finished, repeated) = database.runtime.block_on(async {
        let started = repository
            .start_job(
                &teacher.tenant_id,
                &teacher.id,
                &json!({ "subject": "Math", "gradeLevel": "3" }),
                now(),
            )
            .await
            .expect("job started");
        let finished = repository
            .finish_job(&started.id, &failed, now())
            .await
            .expect("job finished");
        let repeated = repository.finish_job(&started.id, &failed, now()).await;
        (started, finished, repeated)
    });

    assert_eq!(started.status, JobStatus::Processing);
    assert_eq!(finished.status, JobStatus::Failed);
    assert_eq!(finished.error_message.as_deref(), Some("provider timed out"));
    assert!(finished.completed_at.is_some());
    assert_eq!(
        repeated,
        Err(GenerationJobRepositoryError::already_finished(
            started.id.to_string()
        ))
    );
}
