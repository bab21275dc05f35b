//! Unit tests for session configuration validation.

use super::*;
use rstest::{fixture, rstest};
use tempfile::NamedTempFile;

fn key_file(len: usize) -> NamedTempFile {
    let file = NamedTempFile::new().expect("temp key file");
    std::fs::write(file.path(), vec![b'k'; len]).expect("write key");
    file
}

#[fixture]
fn release_key() -> NamedTempFile {
    key_file(SESSION_KEY_MIN_LEN)
}

fn release_inputs(key: &NamedTempFile) -> SessionInputs {
    SessionInputs {
        key_file: Some(key.path().to_path_buf()),
        cookie_secure: Some("1".into()),
        same_site: Some("Strict".into()),
        allow_ephemeral: Some("0".into()),
    }
}

fn expect_error(result: Result<SessionSettings, SessionConfigError>) -> SessionConfigError {
    match result {
        Ok(_) => panic!("expected session configuration to be rejected"),
        Err(error) => error,
    }
}

#[rstest]
fn release_accepts_complete_configuration(release_key: NamedTempFile) {
    let settings = session_settings(&release_inputs(&release_key), BuildMode::Release)
        .expect("valid release configuration");
    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Strict);
}

#[rstest]
fn key_is_derived_from_file_contents(release_key: NamedTempFile) {
    let first = session_settings(&release_inputs(&release_key), BuildMode::Release)
        .expect("first load");
    let second = session_settings(&release_inputs(&release_key), BuildMode::Release)
        .expect("second load");
    assert_eq!(
        key_fingerprint(&first.key),
        key_fingerprint(&second.key)
    );
}

#[rstest]
#[case::cookie_secure(|i: &mut SessionInputs| i.cookie_secure = None, COOKIE_SECURE_SETTING)]
#[case::same_site(|i: &mut SessionInputs| i.same_site = None, SAME_SITE_SETTING)]
#[case::ephemeral(|i: &mut SessionInputs| i.allow_ephemeral = None, ALLOW_EPHEMERAL_SETTING)]
fn release_requires_every_toggle(
    release_key: NamedTempFile,
    #[case] strip: fn(&mut SessionInputs),
    #[case] expected: &str,
) {
    let mut inputs = release_inputs(&release_key);
    strip(&mut inputs);
    match expect_error(session_settings(&inputs, BuildMode::Release)) {
        SessionConfigError::Missing { name } => assert_eq!(name, expected),
        other => panic!("unexpected error: {other}"),
    }
}

#[rstest]
fn release_rejects_short_keys() {
    let short = key_file(SESSION_KEY_MIN_LEN - 1);
    let error = expect_error(session_settings(&release_inputs(&short), BuildMode::Release));
    assert!(matches!(
        error,
        SessionConfigError::KeyTooShort { length, .. } if length == SESSION_KEY_MIN_LEN - 1
    ));
}

#[rstest]
fn debug_accepts_keys_between_the_derive_and_release_minimums() {
    let short = key_file(SESSION_KEY_DERIVE_MIN_LEN);
    session_settings(&release_inputs(&short), BuildMode::Debug)
        .expect("debug tolerates keys shorter than the release minimum");
}

#[rstest]
#[case(BuildMode::Debug, 8, SESSION_KEY_DERIVE_MIN_LEN)]
#[case(BuildMode::Debug, SESSION_KEY_DERIVE_MIN_LEN - 1, SESSION_KEY_DERIVE_MIN_LEN)]
#[case(BuildMode::Release, 8, SESSION_KEY_MIN_LEN)]
fn keys_too_short_to_derive_are_rejected_in_every_mode(
    #[case] mode: BuildMode,
    #[case] length: usize,
    #[case] expected_min: usize,
) {
    let short = key_file(length);
    let error = expect_error(session_settings(&release_inputs(&short), mode));
    assert!(matches!(
        error,
        SessionConfigError::KeyTooShort { length: got, min_len, .. }
            if got == length && min_len == expected_min
    ));
}

#[rstest]
fn release_rejects_missing_key_file(release_key: NamedTempFile) {
    let mut inputs = release_inputs(&release_key);
    inputs.key_file = Some(release_key.path().with_extension("absent"));
    let error = expect_error(session_settings(&inputs, BuildMode::Release));
    assert!(matches!(error, SessionConfigError::KeyRead { .. }));
}

#[rstest]
fn release_refuses_ephemeral_keys(release_key: NamedTempFile) {
    let mut inputs = release_inputs(&release_key);
    inputs.allow_ephemeral = Some("true".into());
    let error = expect_error(session_settings(&inputs, BuildMode::Release));
    assert!(matches!(error, SessionConfigError::EphemeralNotAllowed));
}

#[rstest]
fn debug_generates_a_key_when_the_file_is_missing() {
    let inputs = SessionInputs {
        key_file: Some(std::env::temp_dir().join("lessonplan-no-such-session-key")),
        ..SessionInputs::default()
    };
    let settings = session_settings(&inputs, BuildMode::Debug).expect("ephemeral key");
    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Lax);
}

#[rstest]
#[case("lax", SameSite::Lax)]
#[case(" STRICT ", SameSite::Strict)]
#[case("None", SameSite::None)]
fn same_site_values_are_case_insensitive(
    release_key: NamedTempFile,
    #[case] raw: &str,
    #[case] expected: SameSite,
) {
    let mut inputs = release_inputs(&release_key);
    inputs.same_site = Some(raw.into());
    let settings = session_settings(&inputs, BuildMode::Release).expect("valid same-site");
    assert_eq!(settings.same_site, expected);
}

#[rstest]
fn same_site_none_requires_secure_cookie_in_release(release_key: NamedTempFile) {
    let mut inputs = release_inputs(&release_key);
    inputs.cookie_secure = Some("false".into());
    inputs.same_site = Some("None".into());
    let error = expect_error(session_settings(&inputs, BuildMode::Release));
    assert!(matches!(error, SessionConfigError::InsecureSameSiteNone));
}

#[rstest]
#[case(BuildMode::Release, true)]
#[case(BuildMode::Debug, false)]
fn malformed_booleans_fail_only_in_release(
    release_key: NamedTempFile,
    #[case] mode: BuildMode,
    #[case] should_fail: bool,
) {
    let mut inputs = release_inputs(&release_key);
    inputs.cookie_secure = Some("maybe".into());
    let result = session_settings(&inputs, mode);
    assert_eq!(result.is_err(), should_fail);
    if let Err(error) = result {
        assert!(matches!(error, SessionConfigError::Invalid { name, .. } if name == COOKIE_SECURE_SETTING));
    }
}
