// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Logging setup for the renewal trigger.
//!
//! Library code logs through `tracing`; the binary installs a
//! `tracing-subscriber` formatter once at start-up from the `[logging]`
//! configuration section:
//!
//! ```toml
//! [logging]
//! level = "info"
//! json_format = false
//! ```

use crate::config::LoggingConfig;
use crate::error::{RenewalError, Result};

/// Log level for filtering messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    /// Most verbose - all messages.
    Trace = 0,
    /// Debug information.
    Debug = 1,
    /// Informational messages.
    #[default]
    Info = 2,
    /// Warnings.
    Warn = 3,
    /// Errors only.
    Error = 4,
}

impl LogLevel {
    /// Parse from string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Get the level name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }

    /// The matching `tracing` level.
    pub fn as_tracing_level(&self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolved logging settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LogSettings {
    /// Minimum level to emit.
    pub level: LogLevel,
    /// Emit one JSON object per line.
    pub json_format: bool,
}

impl LogSettings {
    /// Resolve settings from the configuration section.
    ///
    /// # Errors
    ///
    /// Returns an error if the level name is not recognised.
    pub fn from_config(config: &LoggingConfig) -> Result<Self> {
        let level = LogLevel::parse(&config.level).ok_or_else(|| {
            RenewalError::config(format!("Unknown log level: {}", config.level))
        })?;
        Ok(Self {
            level,
            json_format: config.json_format,
        })
    }

    /// Apply command line overrides. `quiet` wins over `verbose`.
    pub fn with_overrides(mut self, verbose: bool, quiet: bool) -> Self {
        if quiet {
            self.level = LogLevel::Error;
        } else if verbose {
            self.level = LogLevel::Debug;
        }
        self
    }
}

/// Install the global `tracing` subscriber.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init(settings: LogSettings) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_max_level(settings.level.as_tracing_level())
        .with_target(false)
        .with_writer(std::io::stderr);

    let installed = if settings.json_format {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| RenewalError::config(format!("Failed to initialise logging: {e}")))
}
