//! Integration tests for registration failures after a successful renewal

use std::error::Error;

use time::Duration;

use crate::integration::{APP_ID, MockServices, fixtures};
use cert_renewal_trigger::{CertificateBytes, RenewalError, TimerTrigger};

#[tokio::test]
async fn test_registration_rejection_reports_out_of_sync() {
    let mock = MockServices::start().await;
    let new = fixtures::new_certificate();
    mock.mock_certificate_versions(Duration::days(12), &fixtures::old_certificate(), &new)
        .await;
    mock.mock_create_completed().await;
    mock.mock_patch(403).await;

    let err = mock.job().run(TimerTrigger::on_time()).await.unwrap_err();
    assert!(err.is_partial_renewal());

    match err {
        RenewalError::RegistrationOutOfSync {
            ref cert_id,
            ref app_id,
            ref thumbprint,
            ref source,
        } => {
            assert_eq!(cert_id, "app-signing");
            assert_eq!(app_id, APP_ID);
            assert_eq!(thumbprint, &CertificateBytes::new(new.clone()).thumbprint());
            assert!(matches!(
                **source,
                RenewalError::RegistrationUpdateFailed { status: 403, .. }
            ));
        }
        ref other => panic!("Expected RegistrationOutOfSync, got {:?}", other),
    }

    let source = err.source().expect("out-of-sync error has a source");
    assert!(source.to_string().contains("403"));
}

#[tokio::test]
async fn test_registration_not_found() {
    let mock = MockServices::start().await;
    mock.mock_certificate_versions(
        Duration::days(1),
        &fixtures::old_certificate(),
        &fixtures::new_certificate(),
    )
    .await;
    mock.mock_create_completed().await;
    mock.mock_patch(404).await;

    let err = mock.job().run(TimerTrigger::on_time()).await.unwrap_err();

    match err {
        RenewalError::RegistrationOutOfSync { source, .. } => {
            assert!(matches!(
                *source,
                RenewalError::RegistrationUpdateFailed { status: 404, .. }
            ));
        }
        other => panic!("Expected RegistrationOutOfSync, got {:?}", other),
    }
}
