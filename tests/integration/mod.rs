//! Integration test utilities and helpers
//!
//! A single wiremock server plays both the certificate vault and the
//! identity provider; their paths do not overlap.

use std::sync::Arc;

use base64::prelude::*;
use serde_json::json;
use time::{Duration, OffsetDateTime};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cert_renewal_trigger::config::{RegistrationConfig, VaultConfig};
use cert_renewal_trigger::{HttpRegistrationClient, HttpVaultClient, JobSettings, RenewalJob};

pub const CERT_NAME: &str = "app-signing";
pub const APP_ID: &str = "0f3c2a7e-5b1d-4c9e-8a21-7d6e4f0b9c13";
pub const TOKEN: &str = "test-access-token";
pub const API_VERSION: &str = "7.4";

pub const CERT_PATH: &str = "/certificates/app-signing";
pub const CREATE_PATH: &str = "/certificates/app-signing/create";
pub const APPLICATION_PATH: &str = "/applications/0f3c2a7e-5b1d-4c9e-8a21-7d6e4f0b9c13";

/// Mock vault and identity provider for integration tests
pub struct MockServices {
    server: MockServer,
}

impl MockServices {
    /// Start a new mock server
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Get a reference to the inner MockServer for custom mocking
    pub fn inner(&self) -> &MockServer {
        &self.server
    }

    pub fn vault_config(&self) -> VaultConfig {
        VaultConfig {
            url: self.server.uri(),
            certificate_name: CERT_NAME.to_string(),
            api_version: API_VERSION.to_string(),
            timeout_seconds: 5,
            allow_http: true,
        }
    }

    pub fn registration_config(&self) -> RegistrationConfig {
        RegistrationConfig {
            url: self.server.uri(),
            application_id: APP_ID.to_string(),
            display_name: Some("app-signing (auto-renewed)".to_string()),
            timeout_seconds: 5,
            allow_http: true,
        }
    }

    /// Build a job wired to this server
    pub fn job(&self) -> RenewalJob {
        self.job_with(JobSettings::new(CERT_NAME, APP_ID))
    }

    /// Build a job wired to this server with custom settings
    pub fn job_with(&self, settings: JobSettings) -> RenewalJob {
        let token = Some(TOKEN.to_string());
        let vault = HttpVaultClient::new(&self.vault_config(), token.clone()).expect("vault client");
        let registration =
            HttpRegistrationClient::new(&self.registration_config(), token).expect("registration client");

        RenewalJob::new(
            Arc::new(vault),
            Arc::new(registration),
            settings,
        )
    }

    /// Mock the certificate bundle for every GET
    pub async fn mock_certificate(&self, expires_in: Duration, der: &[u8]) {
        Mock::given(method("GET"))
            .and(path(CERT_PATH))
            .and(query_param("api-version", API_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(bundle(expires_in, der)))
            .mount(&self.server)
            .await;
    }

    /// Mock the first GET with the old bundle and later GETs with the renewed one
    pub async fn mock_certificate_versions(&self, old_expires_in: Duration, old: &[u8], new: &[u8]) {
        Mock::given(method("GET"))
            .and(path(CERT_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(bundle(old_expires_in, old)))
            .up_to_n_times(1)
            .mount(&self.server)
            .await;

        Mock::given(method("GET"))
            .and(path(CERT_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(bundle(Duration::days(365), new)),
            )
            .mount(&self.server)
            .await;
    }

    /// Mock a GET that fails with the given status
    pub async fn mock_certificate_error(&self, status: u16, message: &str) {
        Mock::given(method("GET"))
            .and(path(CERT_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "error": { "code": "Error", "message": message }
            })))
            .mount(&self.server)
            .await;
    }

    /// Mock the create operation
    pub async fn mock_create(&self, status: u16, body: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path(CREATE_PATH))
            .and(query_param("api-version", API_VERSION))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Mock a create operation that completed synchronously
    pub async fn mock_create_completed(&self) {
        self.mock_create(
            202,
            json!({
                "id": format!("{}/pending", CERT_PATH),
                "status": "completed",
                "status_details": "",
            }),
        )
        .await;
    }

    /// Mock the registration PATCH
    pub async fn mock_patch(&self, status: u16) {
        Mock::given(method("PATCH"))
            .and(path(APPLICATION_PATH))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Assert that no request with the given method reached the server
    pub async fn assert_no_request(&self, http_method: &str) {
        let requests = self.server.received_requests().await.unwrap_or_default();
        assert!(
            requests.iter().all(|r| r.method.as_str() != http_method),
            "unexpected {} request",
            http_method
        );
    }

    /// Bodies of all PATCH requests received, parsed as JSON
    pub async fn patch_bodies(&self) -> Vec<serde_json::Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.method.as_str() == "PATCH")
            .map(|r| serde_json::from_slice(&r.body).expect("PATCH body is JSON"))
            .collect()
    }
}

/// Certificate bundle JSON as the vault returns it
pub fn bundle(expires_in: Duration, der: &[u8]) -> serde_json::Value {
    let exp = (OffsetDateTime::now_utc() + expires_in).unix_timestamp();
    json!({
        "id": format!("https://vault.test{}/0123456789abcdef", CERT_PATH),
        "cer": BASE64_STANDARD.encode(der),
        "attributes": {
            "enabled": true,
            "exp": exp,
            "nbf": exp - 365 * 24 * 60 * 60,
        },
    })
}

pub mod fixtures {
    /// Stand-in DER bytes for the certificate currently in the vault
    pub fn old_certificate() -> Vec<u8> {
        vec![0x30, 0x82, 0x01, 0x0a, 0x02, 0x01, 0x01]
    }

    /// Stand-in DER bytes for the renewed certificate
    pub fn new_certificate() -> Vec<u8> {
        vec![0x30, 0x82, 0x01, 0x0a, 0x02, 0x01, 0x02, 0xff]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundle_shape() {
        let value = bundle(Duration::days(10), &[1, 2, 3]);
        assert_eq!(value["cer"], "AQID");
        assert!(value["attributes"]["exp"].as_i64().is_some());
    }
}
