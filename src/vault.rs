// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)

//! Certificate vault collaborator.
//!
//! The job talks to the vault through the [`CertificateVault`] trait.
//! [`HttpVaultClient`] implements it over the vault's REST API:
//!
//! - `GET  {url}/certificates/{name}?api-version={v}` returns the current
//!   certificate bundle (`cer` holds the Base64 DER, `attributes.exp` the
//!   expiry as Unix seconds).
//! - `POST {url}/certificates/{name}/create?api-version={v}` re-issues the
//!   certificate with its existing policy and returns the operation status.

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use time::OffsetDateTime;
use url::Url;

use crate::config::VaultConfig;
use crate::credential::{self, CertificateBytes, EncodedCredential};
use crate::error::{RenewalError, Result};

/// Operations the job needs from the certificate vault.
#[async_trait]
pub trait CertificateVault: Send + Sync {
    /// Fetch the expiration instant of the current certificate version.
    async fn get_expiry(&self, cert_id: &str) -> Result<OffsetDateTime>;

    /// Issue a new version of the certificate and return its raw bytes.
    async fn renew(&self, cert_id: &str) -> Result<CertificateBytes>;
}

/// Certificate bundle as returned by `GET /certificates/{name}`.
#[derive(Debug, Deserialize)]
struct CertificateBundle {
    #[serde(default)]
    cer: Option<String>,
    #[serde(default)]
    attributes: Option<CertificateAttributes>,
}

#[derive(Debug, Deserialize)]
struct CertificateAttributes {
    #[serde(default)]
    exp: Option<i64>,
}

/// Certificate operation as returned by `POST /certificates/{name}/create`.
#[derive(Debug, Deserialize)]
struct CertificateOperation {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    status_details: Option<String>,
    #[serde(default)]
    error: Option<OperationError>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// HTTP client for the certificate vault.
#[derive(Debug, Clone)]
pub struct HttpVaultClient {
    base_url: Url,
    api_version: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl HttpVaultClient {
    /// Create a vault client from its configuration section.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client cannot be
    /// built.
    pub fn new(config: &VaultConfig, token: Option<String>) -> Result<Self> {
        let base_url = Url::parse(&config.url)
            .map_err(|e| RenewalError::config(format!("Invalid vault URL: {e}")))?;

        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .user_agent(crate::USER_AGENT)
            .use_rustls_tls()
            .build()?;

        Ok(Self {
            base_url,
            api_version: config.api_version.clone(),
            token,
            http,
        })
    }

    fn certificate_url(&self, cert_id: &str, suffix: Option<&str>) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| RenewalError::config("Vault URL cannot be a base"))?;
            segments.pop_if_empty().push("certificates").push(cert_id);
            if let Some(suffix) = suffix {
                segments.push(suffix);
            }
        }
        url.query_pairs_mut()
            .append_pair("api-version", &self.api_version);
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.token {
            Some(ref token) => request.header(AUTHORIZATION, format!("Bearer {token}")),
            None => request,
        }
    }

    async fn fetch_bundle(&self, cert_id: &str) -> Result<CertificateBundle> {
        let url = self.certificate_url(cert_id, None)?;
        tracing::debug!("GET {}", url);

        let response = self
            .authorize(self.http.get(url))
            .send()
            .await
            .map_err(|e| RenewalError::vault_unavailable(format!("request failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RenewalError::certificate_not_found(cert_id));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RenewalError::vault_unavailable(format!(
                "GET certificate returned {status}: {body}"
            )));
        }

        response
            .json::<CertificateBundle>()
            .await
            .map_err(|e| RenewalError::vault_unavailable(format!("malformed certificate bundle: {e}")))
    }
}

#[async_trait]
impl CertificateVault for HttpVaultClient {
    async fn get_expiry(&self, cert_id: &str) -> Result<OffsetDateTime> {
        let bundle = self.fetch_bundle(cert_id).await?;

        let exp = bundle
            .attributes
            .and_then(|a| a.exp)
            .ok_or_else(|| RenewalError::vault_unavailable("certificate bundle has no expiry"))?;

        OffsetDateTime::from_unix_timestamp(exp)
            .map_err(|e| RenewalError::vault_unavailable(format!("invalid expiry {exp}: {e}")))
    }

    async fn renew(&self, cert_id: &str) -> Result<CertificateBytes> {
        let url = self.certificate_url(cert_id, Some("create"))?;
        tracing::debug!("POST {}", url);

        let response = self
            .authorize(self.http.post(url))
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| RenewalError::vault_unavailable(format!("request failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RenewalError::certificate_not_found(cert_id));
        }
        if status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(RenewalError::vault_unavailable(format!(
                "create certificate returned {status}: {body}"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RenewalError::renewal_rejected(
                cert_id,
                format!("vault returned {status}: {body}"),
            ));
        }

        let operation: CertificateOperation = response.json().await.map_err(|e| {
            RenewalError::vault_unavailable(format!("malformed certificate operation: {e}"))
        })?;

        if let Some(error) = operation.error {
            return Err(RenewalError::renewal_rejected(
                cert_id,
                format!(
                    "{}: {}",
                    error.code.as_deref().unwrap_or("error"),
                    error.message.as_deref().unwrap_or("no message")
                ),
            ));
        }

        match operation.status.as_deref() {
            Some("completed") => {}
            Some("inProgress") => {
                return Err(RenewalError::renewal_rejected(
                    cert_id,
                    "issuance pending; the vault did not complete the request synchronously",
                ));
            }
            other => {
                return Err(RenewalError::renewal_rejected(
                    cert_id,
                    format!(
                        "operation status {}: {}",
                        other.unwrap_or("missing"),
                        operation.status_details.as_deref().unwrap_or("")
                    ),
                ));
            }
        }

        let bundle = self.fetch_bundle(cert_id).await?;
        let cer = bundle
            .cer
            .ok_or_else(|| RenewalError::vault_unavailable("renewed bundle has no certificate"))?;

        credential::decode(&EncodedCredential::from_base64(cer))
    }
}
