//! Integration tests driving the job from a configuration file

use std::io::Write;
use std::sync::Arc;

use tempfile::NamedTempFile;
use time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::integration::{APPLICATION_PATH, MockServices, fixtures};
use cert_renewal_trigger::{
    ConfigLoader, HttpRegistrationClient, HttpVaultClient, JobOutcome, RenewalJob, TimerTrigger,
};

#[tokio::test]
async fn test_job_from_config_file() {
    let mock = MockServices::start().await;
    mock.mock_certificate_versions(
        Duration::days(20),
        &fixtures::old_certificate(),
        &fixtures::new_certificate(),
    )
    .await;
    mock.mock_create_completed().await;
    Mock::given(method("PATCH"))
        .and(path(APPLICATION_PATH))
        .and(header("Authorization", "Bearer token-from-file"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(mock.inner())
        .await;

    let mut token_file = NamedTempFile::new().unwrap();
    writeln!(token_file, "token-from-file").unwrap();

    let mut config_file = NamedTempFile::new().unwrap();
    write!(
        config_file,
        r#"
[vault]
url = "{url}"
certificate_name = "app-signing"
allow_http = true

[registration]
url = "{url}"
application_id = "{app_id}"
allow_http = true

[authentication]
token_source = "file:{token}"

[renewal]
threshold_days = 30
"#,
        url = mock.inner().uri(),
        app_id = crate::integration::APP_ID,
        token = token_file.path().display(),
    )
    .unwrap();

    let config = ConfigLoader::new()
        .with_path(config_file.path())
        .load()
        .expect("config should load");
    let token = config.resolve_token().unwrap();
    assert_eq!(token.as_deref(), Some("token-from-file"));

    let job = RenewalJob::new(
        Arc::new(HttpVaultClient::new(&config.vault, token.clone()).unwrap()),
        Arc::new(HttpRegistrationClient::new(&config.registration, token).unwrap()),
        config.job_settings(),
    );

    let outcome = job.run(TimerTrigger::on_time()).await.unwrap();
    assert!(matches!(outcome, JobOutcome::Renewed { .. }));
}
