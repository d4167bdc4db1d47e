// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)

//! The renewal trigger job.
//!
//! One run checks the certificate's expiry in the vault and, when fewer than
//! `threshold` of validity remain, renews it, encodes the new certificate and
//! publishes it to the application registration. The steps run strictly in
//! order and the first failure aborts the run.
//!
//! ```text
//! Idle -> CheckingExpiry -> NotDue
//!                        -> Renewing -> Encoding -> Updating -> Done
//! (any step)             -> Failed
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use cert_renewal_trigger::config::ConfigLoader;
//! use cert_renewal_trigger::job::{RenewalJob, TimerTrigger};
//! use cert_renewal_trigger::registration::HttpRegistrationClient;
//! use cert_renewal_trigger::vault::HttpVaultClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::new().load()?;
//! let token = config.resolve_token()?;
//!
//! let job = RenewalJob::new(
//!     Arc::new(HttpVaultClient::new(&config.vault, token.clone())?),
//!     Arc::new(HttpRegistrationClient::new(&config.registration, token)?),
//!     config.job_settings(),
//! );
//!
//! let outcome = job.run(TimerTrigger::on_time()).await?;
//! println!("{}", outcome);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};
use tracing::{debug, error, info, warn};

use crate::credential;
use crate::error::{RenewalError, Result};
use crate::registration::RegistrationStore;
use crate::vault::CertificateVault;

/// Default renewal threshold: 30 days before expiry.
pub const DEFAULT_THRESHOLD: Duration = Duration::days(30);

/// Returns true if a certificate with `remaining` validity must be renewed.
///
/// Renewal happens only when remaining validity is strictly below the
/// threshold. Negative `remaining` (already expired) always renews.
pub fn needs_renewal(remaining: Duration, threshold: Duration) -> bool {
    remaining < threshold
}

/// Timer event delivered by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerTrigger {
    /// When the tick was due.
    pub scheduled_at: Option<OffsetDateTime>,
    /// When the tick actually fired.
    pub fired_at: Option<OffsetDateTime>,
    /// The tick fired later than scheduled.
    pub is_past_due: bool,
}

impl TimerTrigger {
    /// A trigger that fired on schedule.
    pub fn on_time() -> Self {
        Self {
            scheduled_at: None,
            fired_at: None,
            is_past_due: false,
        }
    }

    /// A trigger flagged as overdue.
    pub fn past_due() -> Self {
        Self {
            is_past_due: true,
            ..Self::on_time()
        }
    }
}

impl Default for TimerTrigger {
    fn default() -> Self {
        Self::on_time()
    }
}

/// Identity and policy for a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSettings {
    /// Vault certificate identifier.
    pub cert_id: String,
    /// Application registration identifier.
    pub app_id: String,
    /// Renew when remaining validity is below this.
    pub threshold: Duration,
    /// Decide but never renew or update.
    pub dry_run: bool,
}

impl JobSettings {
    /// Create settings with the default 30 day threshold.
    pub fn new(cert_id: impl Into<String>, app_id: impl Into<String>) -> Self {
        Self {
            cert_id: cert_id.into(),
            app_id: app_id.into(),
            threshold: DEFAULT_THRESHOLD,
            dry_run: false,
        }
    }

    /// Set the renewal threshold.
    pub fn with_threshold(mut self, threshold: Duration) -> Self {
        self.threshold = threshold;
        self
    }

    /// Enable or disable dry-run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// States a run moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Not started.
    Idle,
    /// Querying the vault for the expiry.
    CheckingExpiry,
    /// Terminal: renewal not needed.
    NotDue,
    /// Requesting a new certificate.
    Renewing,
    /// Converting the certificate to Base64.
    Encoding,
    /// Publishing to the registration.
    Updating,
    /// Terminal: renewed and published.
    Done,
    /// Terminal: a step failed.
    Failed,
}

impl JobState {
    /// Returns true for `NotDue`, `Done` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::NotDue | Self::Done | Self::Failed)
    }
}

/// Events emitted during a run.
#[derive(Debug, Clone)]
pub enum JobEvent {
    /// The trigger fired late.
    RunningLate,
    /// The run moved from one state to another.
    Transition {
        /// Previous state.
        from: JobState,
        /// New state.
        to: JobState,
    },
}

/// Handler for job events.
///
/// Implement this trait to observe runs, e.g. for alerting or tests.
pub trait JobEventHandler: Send + Sync {
    /// Handle a job event.
    fn handle_event(&self, event: JobEvent);
}

/// Expiry check result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryStatus {
    /// Expiration instant reported by the vault.
    pub expires_at: OffsetDateTime,
    /// `expires_at - now`; negative once expired.
    pub remaining: Duration,
    /// Whether the threshold has been crossed.
    pub renewal_due: bool,
}

impl ExpiryStatus {
    /// Whole days of validity left, rounded toward zero.
    pub fn days_remaining(&self) -> i64 {
        self.remaining.whole_days()
    }
}

/// Terminal result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The certificate does not need renewal yet.
    NotDue {
        /// Expiry status at check time.
        status: ExpiryStatus,
    },
    /// Renewal is due but the run was a dry run.
    WouldRenew {
        /// Expiry status at check time.
        status: ExpiryStatus,
    },
    /// The certificate was renewed and published.
    Renewed {
        /// Expiry status of the replaced certificate.
        previous: ExpiryStatus,
        /// SHA-256 thumbprint of the new certificate.
        thumbprint: String,
    },
}

impl std::fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotDue { status } => write!(
                f,
                "Certificate is not close to expiry ({} days remaining). No action taken.",
                status.days_remaining()
            ),
            Self::WouldRenew { status } => write!(
                f,
                "Certificate expires in {} days. Dry run: renewal skipped.",
                status.days_remaining()
            ),
            Self::Renewed { thumbprint, .. } => write!(
                f,
                "Certificate renewal and update complete (thumbprint {thumbprint})."
            ),
        }
    }
}

/// Scheduled certificate renewal job.
pub struct RenewalJob {
    vault: Arc<dyn CertificateVault>,
    registration: Arc<dyn RegistrationStore>,
    settings: JobSettings,
    event_handler: Option<Arc<dyn JobEventHandler>>,
}

impl RenewalJob {
    /// Create a job over the given collaborators.
    pub fn new(
        vault: Arc<dyn CertificateVault>,
        registration: Arc<dyn RegistrationStore>,
        settings: JobSettings,
    ) -> Self {
        Self {
            vault,
            registration,
            settings,
            event_handler: None,
        }
    }

    /// Attach an event handler.
    pub fn with_event_handler(mut self, handler: Arc<dyn JobEventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// The settings this job runs with.
    pub fn settings(&self) -> &JobSettings {
        &self.settings
    }

    /// Run once against the wall clock.
    pub async fn run(&self, trigger: TimerTrigger) -> Result<JobOutcome> {
        self.run_at(trigger, OffsetDateTime::now_utc()).await
    }

    /// Run once with an explicit notion of "now".
    pub async fn run_at(&self, trigger: TimerTrigger, now: OffsetDateTime) -> Result<JobOutcome> {
        let mut state = JobState::Idle;

        if trigger.is_past_due {
            warn!("Running late");
            self.emit(JobEvent::RunningLate);
        }

        let result = self.execute(&mut state, now).await;

        match result {
            Ok(outcome) => {
                info!("{}", outcome);
                Ok(outcome)
            }
            Err(e) => {
                self.transition(&mut state, JobState::Failed);
                error!("Certificate renewal run failed: {}", e);
                Err(e)
            }
        }
    }

    /// Check expiry without renewing.
    pub async fn check(&self, now: OffsetDateTime) -> Result<ExpiryStatus> {
        info!("Checking certificate expiration date...");
        let expires_at = self.vault.get_expiry(&self.settings.cert_id).await?;
        let remaining = expires_at - now;

        let status = ExpiryStatus {
            expires_at,
            remaining,
            renewal_due: needs_renewal(remaining, self.settings.threshold),
        };

        debug!(
            cert_id = %self.settings.cert_id,
            expires_at = %expires_at.format(&Rfc3339).unwrap_or_else(|_| expires_at.to_string()),
            days_remaining = status.days_remaining(),
            "Certificate expiry checked"
        );

        Ok(status)
    }

    async fn execute(&self, state: &mut JobState, now: OffsetDateTime) -> Result<JobOutcome> {
        self.transition(state, JobState::CheckingExpiry);
        let status = self.check(now).await?;

        if !status.renewal_due {
            self.transition(state, JobState::NotDue);
            return Ok(JobOutcome::NotDue { status });
        }

        if self.settings.dry_run {
            info!(
                "Dry run: certificate is due for renewal ({} days remaining), stopping before renewal",
                status.days_remaining()
            );
            return Ok(JobOutcome::WouldRenew { status });
        }

        info!(
            "Certificate is close to expiry ({} days remaining). Renewing now...",
            status.days_remaining()
        );

        self.transition(state, JobState::Renewing);
        let certificate = self.vault.renew(&self.settings.cert_id).await?;
        let thumbprint = certificate.thumbprint();
        info!("Certificate renewed in vault (thumbprint {})", thumbprint);

        self.transition(state, JobState::Encoding);
        let encoded = credential::encode(&certificate)?;

        self.transition(state, JobState::Updating);
        self.registration
            .update_credential(&self.settings.app_id, &encoded)
            .await
            .map_err(|e| RenewalError::RegistrationOutOfSync {
                cert_id: self.settings.cert_id.clone(),
                app_id: self.settings.app_id.clone(),
                thumbprint: thumbprint.clone(),
                source: Box::new(e),
            })?;

        self.transition(state, JobState::Done);
        Ok(JobOutcome::Renewed {
            previous: status,
            thumbprint,
        })
    }

    fn transition(&self, state: &mut JobState, to: JobState) {
        let from = *state;
        *state = to;
        debug!(?from, ?to, "Job state transition");
        self.emit(JobEvent::Transition { from, to });
    }

    fn emit(&self, event: JobEvent) {
        if let Some(ref handler) = self.event_handler {
            handler.handle_event(event);
        }
    }
}
