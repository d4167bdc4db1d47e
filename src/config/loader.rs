// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)

//! Configuration file discovery and loading.

use std::path::{Path, PathBuf};

use crate::error::RenewalError;

use super::schema::JobConfig;

/// Configuration file loader with discovery and precedence rules.
///
/// # Search Order
///
/// Configuration files are searched in the following order (first found wins):
///
/// 1. Explicit path (if set via `with_path()`)
/// 2. Environment variable `RENEWAL_CONFIG_PATH`
/// 3. Unix: `/etc/cert-renewal/config.toml`
/// 4. User config dir: `<config_dir>/cert-renewal/config.toml`
/// 5. Home directory: `~/.cert-renewal/config.toml`
/// 6. Current directory: `./cert-renewal.toml`
///
/// # Example
///
/// ```no_run
/// use cert_renewal_trigger::config::ConfigLoader;
///
/// let config = ConfigLoader::new()
///     .with_path("/etc/cert-renewal/config.toml")
///     .load()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    explicit_path: Option<PathBuf>,
    expand_variables: bool,
    validate: bool,
    env_var_name: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader with default settings.
    pub fn new() -> Self {
        Self {
            explicit_path: None,
            expand_variables: true,
            validate: true,
            env_var_name: "RENEWAL_CONFIG_PATH".to_string(),
        }
    }

    /// Set an explicit configuration file path.
    ///
    /// When set, only this path will be checked (no discovery).
    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        self.explicit_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enable or disable variable expansion.
    ///
    /// Default: `true`
    pub fn with_expand_variables(mut self, expand: bool) -> Self {
        self.expand_variables = expand;
        self
    }

    /// Enable or disable validation after loading.
    ///
    /// Default: `true`
    pub fn with_validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Set the environment variable name for path override.
    ///
    /// Default: `RENEWAL_CONFIG_PATH`
    pub fn with_env_var(mut self, name: impl Into<String>) -> Self {
        self.env_var_name = name.into();
        self
    }

    /// Load the configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No configuration file is found
    /// - The file cannot be read
    /// - The TOML is invalid
    /// - Validation fails (if enabled)
    pub fn load(&self) -> Result<JobConfig, RenewalError> {
        let config_path = self.find_config_file()?;
        tracing::debug!("Loading configuration from {}", config_path.display());

        let toml_content = std::fs::read_to_string(&config_path).map_err(|e| {
            RenewalError::config(format!("Failed to read {}: {e}", config_path.display()))
        })?;

        self.load_from_str(&toml_content)
    }

    /// Load configuration from a TOML string.
    pub fn load_from_str(&self, toml_content: &str) -> Result<JobConfig, RenewalError> {
        let mut config = JobConfig::from_toml(toml_content)?;

        if self.expand_variables {
            config.expand_variables()?;
        }

        if self.validate {
            config.validate()?;
        }

        Ok(config)
    }

    /// Find the configuration file path.
    pub fn find_config_file(&self) -> Result<PathBuf, RenewalError> {
        if let Some(ref path) = self.explicit_path {
            if path.exists() {
                return Ok(path.clone());
            }
            return Err(RenewalError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        if let Ok(env_path) = std::env::var(&self.env_var_name) {
            let path = PathBuf::from(&env_path);
            if path.exists() {
                return Ok(path);
            }
            // Explicitly set but missing is an error, not a fallthrough
            return Err(RenewalError::config(format!(
                "Configuration file from {} not found: {}",
                self.env_var_name, env_path
            )));
        }

        for path in self.get_search_paths() {
            if path.exists() {
                return Ok(path);
            }
        }

        Err(RenewalError::config(format!(
            "No configuration file found. Searched:\n  - {}",
            self.get_search_paths()
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join("\n  - ")
        )))
    }

    /// Get the list of paths to search for configuration files.
    pub fn get_search_paths(&self) -> Vec<PathBuf> {
        let mut paths = Vec::new();

        #[cfg(unix)]
        paths.push(PathBuf::from("/etc/cert-renewal/config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("cert-renewal").join("config.toml"));
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".cert-renewal").join("config.toml"));
        }

        paths.push(PathBuf::from("cert-renewal.toml"));

        paths
    }
}

const DEFAULT_CONFIG: &str = r#"# Certificate Renewal Trigger Configuration
#
# The job checks the expiry of one vault certificate and, when fewer than
# renewal.threshold_days remain, renews it and publishes the new certificate
# to an application registration.

[vault]
# Vault base URL (required, must be HTTPS)
url = "https://myvault.vault.example.net"

# Name of the certificate to watch (required)
certificate_name = "app-signing"

# Vault REST API version (default: 7.4)
api_version = "7.4"

# Request timeout in seconds (default: 60)
timeout_seconds = 60

[registration]
# Identity provider API base URL (required, must be HTTPS)
url = "https://graph.example.com/v1.0"

# Object ID of the application registration (required)
application_id = "00000000-0000-0000-0000-000000000000"

# Display name for the published key credential
# display_name = "CN=app-signing"

timeout_seconds = 60

[authentication]
# Bearer token source: "env:VAR_NAME" or "file:/path"
token_source = "env:RENEWAL_ACCESS_TOKEN"

[renewal]
# Renew when fewer than this many days of validity remain
threshold_days = 30

# Hours between scheduled runs
check_interval_hours = 24

# Seconds a tick may fire late before "Running late" is logged
late_tolerance_seconds = 60

[logging]
# Log level: "trace", "debug", "info", "warn", "error"
level = "info"

# Enable JSON formatted logging
json_format = false
"#;

/// Write a default configuration file to a path.
///
/// Parent directories are created as needed.
///
/// # Errors
///
/// Returns [`RenewalError::Io`] if a directory or the file cannot be written.
pub fn write_default_config(path: impl AsRef<Path>) -> Result<(), RenewalError> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, DEFAULT_CONFIG)?;

    tracing::debug!("Wrote default configuration to {}", path.display());
    Ok(())
}
