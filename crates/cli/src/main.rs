//! `logibooks-jobs` -- run register jobs from the terminal.
//!
//! Starts a validation or FEACN lookup job for one register, logs progress
//! until the job ends, and cancels it on Ctrl-C. Also decodes packed parcel
//! check statuses.
//!
//! # Environment variables
//!
//! | Variable                         | Required | Default                     |
//! |----------------------------------|----------|-----------------------------|
//! | `LOGIBOOKS_API_URL`              | no       | `http://localhost:8080/api` |
//! | `LOGIBOOKS_TOKEN`                | no       | --                          |
//! | `LOGIBOOKS_REQUEST_TIMEOUT_SECS` | no       | `30`                        |
//! | `LOGIBOOKS_POLL_INTERVAL_MS`     | no       | `1000`                      |
//! | `LOGIBOOKS_LOCALE`               | no       | `ru`                        |

mod refresh;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use logibooks_client::{ApiClient, ClientConfig, RegistersApi, SessionStore};
use logibooks_core::types::DbId;
use logibooks_core::{CheckStatusCode, JobOperation, PollingJob};
use logibooks_jobs::{AlertBus, JobPoller};
use tokio::sync::Notify;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use refresh::RegisterRefresher;

/// How long to wait for the post-job register reload before exiting.
const REFRESH_GRACE: Duration = Duration::from_secs(5);

/// How long to let the background cancel request go out before exiting.
const CANCEL_GRACE: Duration = Duration::from_millis(500);

#[derive(Parser, Debug)]
#[command(author, version, about = "Run Logibooks register jobs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check every parcel of a register against stop words and FEACN rules
    Validate { register_id: DbId },
    /// Look up FEACN codes for every parcel of a register
    LookupFeacn {
        register_id: DbId,
        /// Use the extended lookup
        #[arg(long)]
        extended: bool,
    },
    /// Decode a packed parcel check status (decimal or 0x-prefixed hex)
    Status {
        code: String,
        /// Mark outcomes inherited from related parcels
        #[arg(long)]
        show_inherited: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "logibooks_cli=info,logibooks_jobs=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::from_env().context("Invalid client configuration")?;

    match cli.command {
        Command::Validate { register_id } => {
            run_job(&config, register_id, JobOperation::Validation).await
        }
        Command::LookupFeacn {
            register_id,
            extended,
        } => run_job(&config, register_id, JobOperation::FeacnLookup { extended }).await,
        Command::Status {
            code,
            show_inherited,
        } => describe_status(&config, &code, show_inherited),
    }
}

async fn run_job(config: &ClientConfig, register_id: DbId, operation: JobOperation) -> Result<()> {
    let session = Arc::new(SessionStore::new());
    match &config.token {
        Some(token) => session.open(token.clone()).await,
        None => tracing::warn!("LOGIBOOKS_TOKEN is not set, requests are anonymous"),
    }

    let client = Arc::new(ApiClient::new(config, session).context("Failed to build HTTP client")?);
    let registers = RegistersApi::new(client);

    let refreshed = Arc::new(Notify::new());
    let refresher = Arc::new(RegisterRefresher::new(registers.clone(), Arc::clone(&refreshed)));
    let alerts = Arc::new(AlertBus::default());
    let mut alert_rx = alerts.subscribe();

    let poller = JobPoller::new(Arc::new(registers), refresher, alerts, config.poll_interval);
    let mut progress = poller.subscribe();

    tracing::info!(
        register_id,
        %operation,
        api_url = %config.api_url,
        "Starting job",
    );

    if poller.start(register_id, operation).await.is_none() {
        let reason = alert_rx
            .try_recv()
            .map(|alert| alert.message)
            .unwrap_or_else(|_| "unknown error".into());
        bail!("Could not start {operation} for register {register_id}: {reason}");
    }

    let mut cancelled = false;
    loop {
        let job = progress.borrow_and_update().clone();
        if !job.is_active() {
            break;
        }
        log_progress(&job);

        tokio::select! {
            changed = progress.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::warn!(register_id, %operation, "Interrupted, cancelling job");
                poller.cancel().await;
                cancelled = true;
                break;
            }
        }
    }

    if cancelled {
        tokio::time::sleep(CANCEL_GRACE).await;
        bail!("{operation} for register {register_id} was cancelled");
    }

    if let Ok(alert) = alert_rx.try_recv() {
        let _ = tokio::time::timeout(REFRESH_GRACE, refreshed.notified()).await;
        bail!("{operation} for register {register_id} failed: {}", alert.message);
    }

    let job = poller.snapshot();
    tracing::info!(
        register_id,
        %operation,
        total = job.total,
        processed = job.processed,
        "Job finished",
    );

    if tokio::time::timeout(REFRESH_GRACE, refreshed.notified())
        .await
        .is_err()
    {
        tracing::warn!(register_id, "Register reload did not finish in time");
    }

    Ok(())
}

fn log_progress(job: &PollingJob) {
    match job.percent() {
        Some(percent) => tracing::info!(
            processed = job.processed,
            total = job.total,
            percent,
            "Progress",
        ),
        None => tracing::info!(processed = job.processed, "Progress (total unknown)"),
    }
}

fn describe_status(config: &ClientConfig, raw: &str, show_inherited: bool) -> Result<()> {
    let code = parse_status(raw)?;
    let (fc, sw) = code.decompose();

    println!("value:      {:#010x} ({})", code.value(), code.value());
    println!("fc:         {:#06x}", fc.code());
    println!("sw:         {:#06x}", sw.code());
    println!("issues:     {}", code.has_issues());
    println!("inherited:  {}", code.is_inherited_sw());
    println!("severity:   {:?}", code.severity());
    println!("label:      {}", code.label(config.locale, show_inherited));

    Ok(())
}

fn parse_status(raw: &str) -> Result<CheckStatusCode> {
    let raw = raw.trim();
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        let value = u32::from_str_radix(hex, 16)
            .with_context(|| format!("{raw:?} is not a 32-bit hex value"))?;
        return Ok(CheckStatusCode::from_int(value));
    }
    let value: u32 = raw
        .parse()
        .with_context(|| format!("{raw:?} is not a 32-bit status value"))?;
    Ok(CheckStatusCode::from_int(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use logibooks_core::{FcStatus, SwStatus};

    #[test]
    fn parses_decimal_and_hex() {
        assert_eq!(parse_status("1048592").unwrap(), CheckStatusCode::NO_ISSUES);
        assert_eq!(parse_status("0x01000020").unwrap().fc(), FcStatus::ISSUE_FEACN_CODE);
        assert_eq!(parse_status(" 0X00000100 ").unwrap().sw(), SwStatus::ISSUE_STOP_WORD);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_status("approved").is_err());
        assert!(parse_status("0x1FFFFFFFF").is_err());
    }

    #[test]
    fn cli_parses_lookup_flags() {
        let cli = Cli::try_parse_from(["logibooks-jobs", "lookup-feacn", "12", "--extended"]).unwrap();
        match cli.command {
            Command::LookupFeacn {
                register_id,
                extended,
            } => {
                assert_eq!(register_id, 12);
                assert!(extended);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
