//! Integration tests for the expiry check and the no-action path

use std::sync::{Arc, Mutex};

use time::{Duration, OffsetDateTime};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::integration::{APP_ID, CERT_NAME, CERT_PATH, MockServices, TOKEN, bundle, fixtures};
use cert_renewal_trigger::job::{JobEvent, JobEventHandler};
use cert_renewal_trigger::{JobOutcome, JobSettings, TimerTrigger};

#[tokio::test]
async fn test_not_due_takes_no_action() {
    let mock = MockServices::start().await;
    mock.mock_certificate(Duration::days(90), &fixtures::old_certificate())
        .await;

    let outcome = mock
        .job()
        .run(TimerTrigger::on_time())
        .await
        .expect("run should succeed");

    assert!(outcome.to_string().contains("No action taken"));
    match outcome {
        JobOutcome::NotDue { status } => {
            assert!(!status.renewal_due);
            assert!((89..=90).contains(&status.days_remaining()));
        }
        other => panic!("Expected NotDue, got {:?}", other),
    }

    mock.assert_no_request("POST").await;
    mock.assert_no_request("PATCH").await;
}

#[tokio::test]
async fn test_exactly_threshold_is_not_due() {
    let mock = MockServices::start().await;

    // Whole seconds so the remaining time is exactly 30 days
    let now = OffsetDateTime::from_unix_timestamp(OffsetDateTime::now_utc().unix_timestamp())
        .unwrap();
    let mut body = bundle(Duration::days(30), &fixtures::old_certificate());
    body["attributes"]["exp"] = (now + Duration::days(30)).unix_timestamp().into();

    Mock::given(method("GET"))
        .and(path(CERT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(mock.inner())
        .await;

    let outcome = mock
        .job()
        .run_at(TimerTrigger::on_time(), now)
        .await
        .unwrap();

    assert!(matches!(outcome, JobOutcome::NotDue { .. }));
    mock.assert_no_request("POST").await;
}

#[tokio::test]
async fn test_check_sends_bearer_token() {
    let mock = MockServices::start().await;
    Mock::given(method("GET"))
        .and(path(CERT_PATH))
        .and(header("Authorization", format!("Bearer {}", TOKEN).as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(bundle(Duration::days(45), &fixtures::old_certificate())),
        )
        .expect(1)
        .mount(mock.inner())
        .await;

    let status = mock
        .job()
        .check(OffsetDateTime::now_utc())
        .await
        .expect("check should succeed");

    assert!(!status.renewal_due);
    assert!((44..=45).contains(&status.days_remaining()));
}

#[tokio::test]
async fn test_dry_run_does_not_renew() {
    let mock = MockServices::start().await;
    mock.mock_certificate(Duration::days(5), &fixtures::old_certificate())
        .await;

    let job = mock.job_with(JobSettings::new(CERT_NAME, APP_ID).with_dry_run(true));
    let outcome = job.run(TimerTrigger::on_time()).await.unwrap();
    assert!(matches!(outcome, JobOutcome::WouldRenew { .. }));

    mock.assert_no_request("POST").await;
    mock.assert_no_request("PATCH").await;
}

#[derive(Default)]
struct RecordingHandler {
    events: Mutex<Vec<String>>,
}

impl JobEventHandler for RecordingHandler {
    fn handle_event(&self, event: JobEvent) {
        let label = match event {
            JobEvent::RunningLate => "late".to_string(),
            JobEvent::Transition { to, .. } => format!("{:?}", to),
        };
        self.events.lock().unwrap().push(label);
    }
}

#[tokio::test]
async fn test_past_due_trigger_reports_running_late_first() {
    let mock = MockServices::start().await;
    mock.mock_certificate(Duration::days(120), &fixtures::old_certificate())
        .await;

    let handler = Arc::new(RecordingHandler::default());
    let job = mock.job().with_event_handler(handler.clone());

    let outcome = job.run(TimerTrigger::past_due()).await.unwrap();
    assert!(matches!(outcome, JobOutcome::NotDue { .. }));

    let events = handler.events.lock().unwrap();
    assert_eq!(events.first().map(String::as_str), Some("late"));
    assert_eq!(events.last().map(String::as_str), Some("NotDue"));
}
