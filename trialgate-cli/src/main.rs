//! trialgate startup license check
//!
//! Runs the licensing decision once and reports it:
//! 1. Licensed copies continue silently
//! 2. Trial copies are told how many days are left
//! 3. Expired trials and licensing errors exit non-zero
//!
//! Usage:
//!   trialgate --config license.json
//!   trialgate --endpoint https://license.example.com/status --app hello --public-key <base64 PEM>

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use trialgate_license::{LicenseConfig, LicenseDecision, LicenseOrchestrator};

#[derive(Parser, Debug)]
#[command(name = "trialgate")]
#[command(about = "Checks the license or trial state of this installation")]
struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Licensing service URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Application id sent to the licensing service
    #[arg(long)]
    app: Option<String>,

    /// Base64-encoded PEM public key for license tokens
    #[arg(long)]
    public_key: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> Result<LicenseConfig> {
        let mut config = match &self.config {
            Some(path) => LicenseConfig::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => LicenseConfig::default(),
        };
        if let Some(endpoint) = self.endpoint {
            config.endpoint = endpoint;
        }
        if let Some(app) = self.app {
            config.app_id = app;
        }
        if let Some(public_key) = self.public_key {
            config.public_key = public_key;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(decision) if decision.is_usable() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<LicenseDecision> {
    let args = Args::parse();
    let log_level = if args.verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };
    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let config = args.into_config()?;
    debug!(endpoint = %config.endpoint, app = %config.app_id, "Loaded license configuration");

    let gate = LicenseOrchestrator::from_config(&config).context("Failed to set up licensing")?;
    let decision = gate.evaluate().await.context("Failed to verify license")?;

    match decision {
        LicenseDecision::Licensed => println!("Info: Licensed copy of application"),
        LicenseDecision::TrialActive {
            days_left,
            order_pending: true,
        } => println!(
            "License ordered, waiting for payment. You have {days_left} days left in your trial period."
        ),
        LicenseDecision::TrialActive { days_left, .. } => println!(
            "Warning: Unlicensed copy of application. You have {days_left} days left in your trial period."
        ),
        LicenseDecision::Expired => eprintln!("Error: your trial period has ended"),
    }
    Ok(decision)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_without_config_file() {
        let args = Args::try_parse_from([
            "trialgate",
            "--endpoint",
            "https://license.example.com/status",
            "--app",
            "hello",
            "--public-key",
            "abc",
        ])
        .unwrap();
        let config = args.into_config().unwrap();
        assert_eq!(config.endpoint, "https://license.example.com/status");
        assert_eq!(config.app_id, "hello");
        assert_eq!(config.public_key, "abc");
        assert_eq!(config.trial_days, 3);
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("license.json");
        std::fs::write(
            &path,
            r#"{"endpoint":"https://old.example.com","app_id":"hello","public_key":"abc","timeout_secs":5}"#,
        )
        .unwrap();

        let args = Args::try_parse_from([
            "trialgate",
            "--config",
            path.to_str().unwrap(),
            "--endpoint",
            "https://new.example.com",
        ])
        .unwrap();
        let config = args.into_config().unwrap();
        assert_eq!(config.endpoint, "https://new.example.com");
        assert_eq!(config.app_id, "hello");
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn missing_config_file() {
        let args = Args::try_parse_from(["trialgate", "--config", "/nonexistent/license.json"]).unwrap();
        let err = args.into_config().unwrap_err();
        assert!(format!("{err:#}").contains("Failed to load config"));
    }
}
