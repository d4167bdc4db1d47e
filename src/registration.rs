// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)

//! Application registration collaborator.
//!
//! [`HttpRegistrationClient`] replaces the key credentials of an application
//! object with the renewed certificate:
//!
//! ```text
//! PATCH {url}/applications/{app_id}
//! {"keyCredentials": [{"type": "AsymmetricX509Cert", "usage": "Verify",
//!                      "key": "<base64>", "displayName": "<name>"}]}
//! ```

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::Serialize;
use url::Url;

use crate::config::RegistrationConfig;
use crate::credential::EncodedCredential;
use crate::error::{RenewalError, Result};

/// Operations the job needs from the application registration store.
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// Replace the registration's certificate credential.
    async fn update_credential(&self, app_id: &str, credential: &EncodedCredential) -> Result<()>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApplicationPatch<'a> {
    key_credentials: Vec<KeyCredential<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct KeyCredential<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    usage: &'static str,
    key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<&'a str>,
}

/// HTTP client for the identity provider's application registrations.
#[derive(Debug, Clone)]
pub struct HttpRegistrationClient {
    base_url: Url,
    display_name: Option<String>,
    token: Option<String>,
    http: reqwest::Client,
}

impl HttpRegistrationClient {
    /// Create a registration client from its configuration section.
    pub fn new(config: &RegistrationConfig, token: Option<String>) -> Result<Self> {
        let base_url = Url::parse(&config.url)
            .map_err(|e| RenewalError::config(format!("Invalid registration URL: {e}")))?;

        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .user_agent(crate::USER_AGENT)
            .use_rustls_tls()
            .build()?;

        Ok(Self {
            base_url,
            display_name: config.display_name.clone(),
            token,
            http,
        })
    }

    fn application_url(&self, app_id: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RenewalError::config("Registration URL cannot be a base"))?
            .pop_if_empty()
            .push("applications")
            .push(app_id);
        Ok(url)
    }
}

#[async_trait]
impl RegistrationStore for HttpRegistrationClient {
    async fn update_credential(&self, app_id: &str, credential: &EncodedCredential) -> Result<()> {
        let url = self.application_url(app_id)?;
        tracing::debug!("PATCH {}", url);

        let body = ApplicationPatch {
            key_credentials: vec![KeyCredential {
                kind: "AsymmetricX509Cert",
                usage: "Verify",
                key: credential.as_str(),
                display_name: self.display_name.as_deref(),
            }],
        };

        let mut request = self.http.patch(url).json(&body);
        if let Some(ref token) = self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = request.send().await.map_err(|e| {
            RenewalError::registration_update_failed(app_id, 0, format!("request failed: {e}"))
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = response.text().await.unwrap_or_default();
        Err(RenewalError::registration_update_failed(
            app_id,
            status.as_u16(),
            message,
        ))
    }
}
