// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)

//! Fixed-interval scheduler for the renewal job.
//!
//! The scheduler fires the job once at start-up and then every
//! `check_interval`. Runs never overlap: the next tick is not awaited until
//! the current run has finished, and ticks missed while a run was in
//! progress are skipped rather than replayed. A tick that fires more than
//! `late_tolerance` after it was due is delivered as a past-due trigger.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use cert_renewal_trigger::job::RenewalJob;
//! use cert_renewal_trigger::scheduler::{JobScheduler, ScheduleConfig};
//!
//! # async fn example(job: RenewalJob) -> Result<(), Box<dyn std::error::Error>> {
//! let scheduler = JobScheduler::new(
//!     Arc::new(job),
//!     ScheduleConfig::new(Duration::from_secs(24 * 60 * 60)),
//! );
//! let handle = scheduler.start().await?;
//!
//! tokio::signal::ctrl_c().await?;
//! scheduler.stop().await;
//! handle.await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tokio::sync::{Mutex, RwLock, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval};
use tracing::{debug, info};

use crate::error::{RenewalError, Result};
use crate::job::{RenewalJob, TimerTrigger};

/// Scheduler timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
    /// Time between runs.
    pub check_interval: Duration,
    /// How late a tick may fire before it is reported as past due.
    pub late_tolerance: Duration,
}

impl ScheduleConfig {
    /// Create a schedule with a 60 second late tolerance.
    pub fn new(check_interval: Duration) -> Self {
        Self {
            check_interval,
            late_tolerance: Duration::from_secs(60),
        }
    }

    /// Set the late tolerance.
    pub fn with_late_tolerance(mut self, tolerance: Duration) -> Self {
        self.late_tolerance = tolerance;
        self
    }
}

impl From<&crate::config::RenewalConfig> for ScheduleConfig {
    fn from(config: &crate::config::RenewalConfig) -> Self {
        Self::new(config.check_interval()).with_late_tolerance(config.late_tolerance())
    }
}

/// Build the trigger for a tick that was due at `scheduled` and fired at
/// `fired`.
pub fn trigger_for_tick(scheduled: Instant, fired: Instant, tolerance: Duration) -> TimerTrigger {
    let lateness = fired.saturating_duration_since(scheduled);
    let fired_at = OffsetDateTime::now_utc();
    TimerTrigger {
        scheduled_at: Some(fired_at - lateness),
        fired_at: Some(fired_at),
        is_past_due: lateness > tolerance,
    }
}

/// Runs a [`RenewalJob`] on a fixed interval.
pub struct JobScheduler {
    job: Arc<RenewalJob>,
    config: ScheduleConfig,
    running: Arc<RwLock<bool>>,
    shutdown: Mutex<Option<watch::Sender<bool>>>,
}

impl JobScheduler {
    /// Create a new scheduler.
    pub fn new(job: Arc<RenewalJob>, config: ScheduleConfig) -> Self {
        Self {
            job,
            config,
            running: Arc::new(RwLock::new(false)),
            shutdown: Mutex::new(None),
        }
    }

    /// Check if the scheduler is currently running.
    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Start the scheduler in a background task.
    ///
    /// # Errors
    ///
    /// Returns an error if the scheduler is already running.
    pub async fn start(&self) -> Result<JoinHandle<()>> {
        let mut running = self.running.write().await;
        if *running {
            return Err(RenewalError::operational("Renewal scheduler already running"));
        }
        *running = true;

        // Fresh channel per start: a stop signal sent to an earlier loop
        // never reaches this one
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        *self.shutdown.lock().await = Some(shutdown_tx);
        drop(running);

        info!(
            "Starting certificate renewal scheduler (interval {}s)",
            self.config.check_interval.as_secs()
        );

        let job = Arc::clone(&self.job);
        let config = self.config;

        Ok(tokio::spawn(async move {
            let mut ticker = interval(config.check_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                let scheduled = tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => break,
                    scheduled = ticker.tick() => scheduled,
                };

                let trigger = trigger_for_tick(scheduled, Instant::now(), config.late_tolerance);
                debug!(past_due = trigger.is_past_due, "Renewal tick");

                // The job logs its own failure; the schedule keeps going
                if job.run(trigger).await.is_err() {
                    debug!("Waiting for next tick after failed run");
                }
            }

            info!("Renewal scheduler stopped");
        }))
    }

    /// Stop the scheduler.
    ///
    /// A run in progress is allowed to finish.
    pub async fn stop(&self) {
        let mut running = self.running.write().await;
        *running = false;
        if let Some(shutdown) = self.shutdown.lock().await.take() {
            // The loop may already have exited
            let _ = shutdown.send(true);
        }
        info!("Stopping certificate renewal scheduler");
    }
}
