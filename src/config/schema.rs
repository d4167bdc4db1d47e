// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)

//! Job configuration structures.
//!
//! This module defines the TOML configuration schema for the renewal
//! trigger: where the vault and the application registration live, how to
//! authenticate to them, and when to renew.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::RenewalError;
use crate::job::JobSettings;

use super::expand::expand_variables;

/// Complete renewal trigger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobConfig {
    /// Certificate vault configuration.
    pub vault: VaultConfig,

    /// Application registration configuration.
    pub registration: RegistrationConfig,

    /// Access token configuration shared by both services.
    #[serde(default)]
    pub authentication: AuthenticationConfig,

    /// Renewal timing configuration.
    #[serde(default)]
    pub renewal: RenewalConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl JobConfig {
    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or missing required fields.
    pub fn from_toml(toml_str: &str) -> Result<Self, RenewalError> {
        toml::from_str(toml_str).map_err(|e| RenewalError::config(format!("Invalid TOML: {e}")))
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, RenewalError> {
        toml::to_string_pretty(self)
            .map_err(|e| RenewalError::config(format!("TOML serialize: {e}")))
    }

    /// Expand all `${VAR}` references in string values.
    pub fn expand_variables(&mut self) -> Result<(), RenewalError> {
        self.vault.url = expand_variables(&self.vault.url)?;
        self.vault.certificate_name = expand_variables(&self.vault.certificate_name)?;

        self.registration.url = expand_variables(&self.registration.url)?;
        self.registration.application_id = expand_variables(&self.registration.application_id)?;
        if let Some(ref mut name) = self.registration.display_name {
            *name = expand_variables(name)?;
        }

        if let Some(ref mut source) = self.authentication.token_source {
            *source = expand_variables(source)?;
        }

        Ok(())
    }

    /// Validate the configuration for completeness and consistency.
    ///
    /// All problems are collected and reported together.
    pub fn validate(&self) -> Result<(), RenewalError> {
        let mut errors = Vec::new();

        check_url(&mut errors, "vault.url", &self.vault.url, self.vault.allow_http);
        if self.vault.certificate_name.trim().is_empty() {
            errors.push("vault.certificate_name is required".to_string());
        }
        if self.vault.api_version.trim().is_empty() {
            errors.push("vault.api_version must not be empty".to_string());
        }

        check_url(
            &mut errors,
            "registration.url",
            &self.registration.url,
            self.registration.allow_http,
        );
        if self.registration.application_id.trim().is_empty() {
            errors.push("registration.application_id is required".to_string());
        }

        if let Some(ref source) = self.authentication.token_source
            && !(source.starts_with("env:") || source.starts_with("file:"))
        {
            errors.push(format!(
                "authentication.token_source must be 'env:VAR' or 'file:/path', got '{source}'"
            ));
        }

        if self.renewal.threshold_days == 0 {
            errors.push("renewal.threshold_days must be > 0".to_string());
        }
        if self.renewal.check_interval_hours == 0 {
            errors.push("renewal.check_interval_hours must be > 0".to_string());
        }

        if crate::logging::LogLevel::parse(&self.logging.level).is_none() {
            errors.push(format!("logging.level '{}' is not recognised", self.logging.level));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(RenewalError::config(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }

    /// Resolve the bearer token from the configured source.
    ///
    /// Returns `Ok(None)` when no token source is configured.
    pub fn resolve_token(&self) -> Result<Option<String>, RenewalError> {
        let Some(ref source) = self.authentication.token_source else {
            return Ok(None);
        };

        if let Some(var_name) = source.strip_prefix("env:") {
            std::env::var(var_name).map(Some).map_err(|_| {
                RenewalError::config(format!("Environment variable {var_name} not set"))
            })
        } else if let Some(path) = source.strip_prefix("file:") {
            std::fs::read_to_string(path)
                .map(|s| Some(s.trim().to_string()))
                .map_err(|e| RenewalError::config(format!("Failed to read token file: {e}")))
        } else {
            Err(RenewalError::config(format!("Unknown token_source: {source}")))
        }
    }

    /// Build the settings the job runs with.
    pub fn job_settings(&self) -> JobSettings {
        JobSettings::new(
            self.vault.certificate_name.clone(),
            self.registration.application_id.clone(),
        )
        .with_threshold(self.renewal.threshold())
    }
}

fn check_url(errors: &mut Vec<String>, field: &str, value: &str, allow_http: bool) {
    if value.is_empty() {
        errors.push(format!("{field} is required"));
        return;
    }
    match url::Url::parse(value) {
        Ok(url) if url.scheme() == "https" => {}
        Ok(url) if url.scheme() == "http" && allow_http => {}
        Ok(_) => errors.push(format!("{field} must use HTTPS")),
        Err(e) => errors.push(format!("{field} is not a valid URL: {e}")),
    }
}

/// Certificate vault configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// Vault base URL.
    pub url: String,

    /// Name of the certificate to watch and renew.
    pub certificate_name: String,

    /// API version sent as the `api-version` query parameter.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Permit a plain `http://` URL (local testing only).
    #[serde(default)]
    pub allow_http: bool,
}

fn default_api_version() -> String {
    "7.4".to_string()
}

fn default_timeout() -> u64 {
    60
}

/// Application registration configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistrationConfig {
    /// Identity provider API base URL.
    pub url: String,

    /// Object identifier of the application registration.
    pub application_id: String,

    /// Display name attached to the published key credential.
    #[serde(default)]
    pub display_name: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Permit a plain `http://` URL (local testing only).
    #[serde(default)]
    pub allow_http: bool,
}

/// Access token configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct AuthenticationConfig {
    /// Where to read the bearer token from.
    /// Values: "env:VAR_NAME", "file:/path/to/file"
    #[serde(default)]
    pub token_source: Option<String>,
}

/// Renewal timing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenewalConfig {
    /// Renew when fewer than this many days of validity remain.
    #[serde(default = "default_threshold_days")]
    pub threshold_days: u32,

    /// Hours between scheduled runs.
    #[serde(default = "default_check_interval")]
    pub check_interval_hours: u32,

    /// How late a tick may fire before it is reported as running late.
    #[serde(default = "default_late_tolerance")]
    pub late_tolerance_seconds: u64,
}

impl RenewalConfig {
    /// Renewal threshold as a duration.
    pub fn threshold(&self) -> time::Duration {
        time::Duration::days(i64::from(self.threshold_days))
    }

    /// Interval between scheduled runs.
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.check_interval_hours) * 60 * 60)
    }

    /// Late-tick tolerance.
    pub fn late_tolerance(&self) -> Duration {
        Duration::from_secs(self.late_tolerance_seconds)
    }
}

impl Default for RenewalConfig {
    fn default() -> Self {
        Self {
            threshold_days: default_threshold_days(),
            check_interval_hours: default_check_interval(),
            late_tolerance_seconds: default_late_tolerance(),
        }
    }
}

fn default_threshold_days() -> u32 {
    30
}

fn default_check_interval() -> u32 {
    24
}

fn default_late_tolerance() -> u64 {
    60
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Enable structured JSON logging.
    #[serde(default)]
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
