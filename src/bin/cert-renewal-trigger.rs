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

//! Certificate Renewal Trigger
//!
//! # Usage
//!
//! ```text
//! cert-renewal-trigger [OPTIONS] <COMMAND>
//!
//! Commands:
//!   run       Run the renewal job once (entry point for external schedulers)
//!   schedule  Run the job on a fixed interval until interrupted
//!   status    Show certificate expiry without renewing
//!   config    Configuration management
//!
//! Options:
//!   -c, --config <PATH>   Path to configuration file
//!   -v, --verbose         Enable verbose output
//!   -q, --quiet           Suppress non-error output
//!   --dry-run             Decide whether to renew but change nothing
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use cert_renewal_trigger::config::{ConfigLoader, JobConfig, write_default_config};
use cert_renewal_trigger::logging::{self, LogSettings};
use cert_renewal_trigger::{
    HttpRegistrationClient, HttpVaultClient, JobScheduler, RenewalJob, ScheduleConfig,
    TimerTrigger,
};

/// Certificate Renewal Trigger
#[derive(Parser)]
#[command(name = "cert-renewal-trigger")]
#[command(author = "U.S. Federal Government")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Renew a vault certificate before expiry and publish it to an application registration", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Decide whether to renew but change nothing
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the renewal job once
    Run {
        /// Mark this invocation as fired later than scheduled
        #[arg(long)]
        late: bool,
    },

    /// Run the job on a fixed interval until interrupted
    Schedule,

    /// Show certificate expiry without renewing
    Status {
        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate configuration file
    Validate,

    /// Display effective configuration
    Show,

    /// Generate default configuration file
    Init {
        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run_command(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_command(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Commands::Config { action } = &cli.command {
        init_logging(&cli, None)?;
        return cmd_config(&cli, action);
    }

    let config = load_config(&cli)?;
    init_logging(&cli, Some(&config))?;

    match &cli.command {
        Commands::Run { late } => cmd_run(&cli, &config, *late).await,
        Commands::Schedule => cmd_schedule(&cli, &config).await,
        Commands::Status { format } => cmd_status(&cli, &config, *format).await,
        Commands::Config { .. } => Ok(()),
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn cmd_run(cli: &Cli, config: &JobConfig, late: bool) -> Result<(), Box<dyn std::error::Error>> {
    let job = build_job(cli, config)?;
    let trigger = if late {
        TimerTrigger::past_due()
    } else {
        TimerTrigger::on_time()
    };

    let outcome = job.run(trigger).await?;
    if !cli.quiet {
        println!("{}", outcome);
    }
    Ok(())
}

async fn cmd_schedule(cli: &Cli, config: &JobConfig) -> Result<(), Box<dyn std::error::Error>> {
    let job = build_job(cli, config)?;
    let scheduler = JobScheduler::new(Arc::new(job), ScheduleConfig::from(&config.renewal));

    let handle = scheduler.start().await?;
    tokio::signal::ctrl_c().await?;
    tracing::info!("Interrupt received");

    scheduler.stop().await;
    handle.await?;
    Ok(())
}

async fn cmd_status(
    cli: &Cli,
    config: &JobConfig,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let job = build_job(cli, config)?;
    let status = job.check(time::OffsetDateTime::now_utc()).await?;
    let expires_at = status
        .expires_at
        .format(&time::format_description::well_known::Rfc3339)?;

    match format {
        OutputFormat::Text => {
            println!("Certificate:    {}", config.vault.certificate_name);
            println!("Expires:        {}", expires_at);
            println!("Days remaining: {}", status.days_remaining());
            println!(
                "Renewal due:    {}",
                if status.renewal_due { "yes" } else { "no" }
            );
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "certificate": config.vault.certificate_name,
                "expires_at": expires_at,
                "days_remaining": status.days_remaining(),
                "renewal_due": status.renewal_due,
                "threshold_days": config.renewal.threshold_days,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }
    Ok(())
}

fn cmd_config(cli: &Cli, action: &ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Validate => {
            let config = load_config(cli)?;
            if !cli.quiet {
                println!(
                    "Configuration is valid ({} -> {})",
                    config.vault.certificate_name, config.registration.application_id
                );
            }
            Ok(())
        }
        ConfigAction::Show => {
            let config = load_config(cli)?;
            print!("{}", config.to_toml()?);
            Ok(())
        }
        ConfigAction::Init { output, force } => {
            let path = output
                .clone()
                .or_else(|| cli.config.clone())
                .unwrap_or_else(|| PathBuf::from("cert-renewal.toml"));

            if path.exists() && !force {
                return Err(format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                )
                .into());
            }
            if cli.dry_run {
                println!("DRY RUN: Would write default configuration to {}", path.display());
                return Ok(());
            }

            write_default_config(&path)?;
            if !cli.quiet {
                println!("Wrote default configuration to {}", path.display());
            }
            Ok(())
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn load_config(cli: &Cli) -> Result<JobConfig, Box<dyn std::error::Error>> {
    let mut loader = ConfigLoader::new();
    if let Some(ref path) = cli.config {
        loader = loader.with_path(path);
    }
    Ok(loader.load()?)
}

fn init_logging(cli: &Cli, config: Option<&JobConfig>) -> Result<(), Box<dyn std::error::Error>> {
    let settings = match config {
        Some(config) => LogSettings::from_config(&config.logging)?,
        None => LogSettings::default(),
    };
    logging::init(settings.with_overrides(cli.verbose, cli.quiet))?;
    Ok(())
}

fn build_job(cli: &Cli, config: &JobConfig) -> Result<RenewalJob, Box<dyn std::error::Error>> {
    let token = config.resolve_token()?;
    let vault = HttpVaultClient::new(&config.vault, token.clone())?;
    let registration = HttpRegistrationClient::new(&config.registration, token)?;

    Ok(RenewalJob::new(
        Arc::new(vault),
        Arc::new(registration),
        config.job_settings().with_dry_run(cli.dry_run),
    ))
}
