// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)

//! Configuration for the renewal trigger.
//!
//! # Example Configuration
//!
//! ```toml
//! [vault]
//! url = "https://myvault.vault.example.net"
//! certificate_name = "app-signing"
//!
//! [registration]
//! url = "https://graph.example.com/v1.0"
//! application_id = "00000000-0000-0000-0000-000000000000"
//!
//! [authentication]
//! token_source = "env:RENEWAL_ACCESS_TOKEN"
//!
//! [renewal]
//! threshold_days = 30
//! check_interval_hours = 24
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use cert_renewal_trigger::config::ConfigLoader;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::new().load()?;
//! let settings = config.job_settings();
//! # Ok(())
//! # }
//! ```

mod expand;
mod loader;
mod schema;

pub use expand::expand_variables;
pub use loader::{ConfigLoader, write_default_config};
pub use schema::*;
