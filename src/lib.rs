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

//! # cert-renewal-trigger
//!
//! A scheduled job that keeps an application registration's certificate
//! credential ahead of expiry.
//!
//! Each run:
//!
//! 1. Reads the certificate's expiry from the vault
//! 2. Does nothing if 30 days or more remain
//! 3. Otherwise asks the vault to re-issue the certificate
//! 4. Base64-encodes the new certificate
//! 5. Publishes it as the application registration's key credential
//!
//! Every step is awaited in order and the first failure ends the run. There
//! are no retries; the next scheduled run is the retry.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use cert_renewal_trigger::{
//!     ConfigLoader, HttpRegistrationClient, HttpVaultClient, RenewalJob, TimerTrigger,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::new().load()?;
//!     let token = config.resolve_token()?;
//!
//!     let job = RenewalJob::new(
//!         Arc::new(HttpVaultClient::new(&config.vault, token.clone())?),
//!         Arc::new(HttpRegistrationClient::new(&config.registration, token)?),
//!         config.job_settings(),
//!     );
//!
//!     let outcome = job.run(TimerTrigger::on_time()).await?;
//!     println!("{}", outcome);
//!     Ok(())
//! }
//! ```
//!
//! ## Partial failure
//!
//! If the registration update fails after the vault has already issued the
//! new certificate, the run returns
//! [`RenewalError::RegistrationOutOfSync`] carrying the new certificate's
//! thumbprint instead of the bare registration error.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod credential;
pub mod error;
pub mod job;
pub mod logging;
pub mod registration;
pub mod scheduler;
pub mod vault;

pub use config::{ConfigLoader, JobConfig};
pub use credential::{CertificateBytes, EncodedCredential};
pub use error::{RenewalError, Result};
pub use job::{JobOutcome, JobSettings, JobState, RenewalJob, TimerTrigger};
pub use registration::{HttpRegistrationClient, RegistrationStore};
pub use scheduler::{JobScheduler, ScheduleConfig};
pub use vault::{CertificateVault, HttpVaultClient};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent string for HTTP requests.
pub const USER_AGENT: &str = concat!("cert-renewal-trigger/", env!("CARGO_PKG_VERSION"));
