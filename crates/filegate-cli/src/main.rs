//! Filegate CLI: screen local files and manage access links.
//!
//! Configuration comes from the environment (or `.env`), see `GateConfig`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use filegate_cli::{drain_audit, load_upload, print_json};
use filegate_core::GateConfig;
use filegate_infra::{init_telemetry, shutdown_telemetry, LogFormat};
use filegate_services::{create_scanner, AuditLogger, SecurityService};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "filegate", about = "Upload security gate")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and scan a local file as if it were uploaded
    Check {
        /// Path to the file
        path: PathBuf,
        /// Declared MIME type (guessed from the name when omitted)
        #[arg(long)]
        mime: Option<String>,
        /// Original filename (defaults to the file's name)
        #[arg(long)]
        name: Option<String>,
        /// User recorded in the audit log
        #[arg(long, default_value = "cli")]
        user: String,
    },
    /// Report virus scanner status
    Health,
    /// Issue a time-limited URL for a storage path
    Sign {
        /// Storage path, e.g. files/2024/01/01/<id>-report.pdf
        path: String,
        /// Lifetime in seconds (defaults to SIGNED_URL_TTL_SECS)
        #[arg(long)]
        ttl: Option<u64>,
    },
    /// Check a signed URL's expiry and signature
    Verify {
        /// URL previously issued by `sign`
        url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = GateConfig::from_env().context("Invalid configuration")?;
    init_telemetry("filegate", &config.environment, LogFormat::from_env())
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    let scanner = create_scanner(&config).await;
    let (audit, audit_writer) = AuditLogger::spawn_with_handle(config.audit_queue_size);
    let service = SecurityService::from_config(&config, scanner, audit);

    let result = run(cli.command, &service).await;

    drain_audit(service, audit_writer).await;
    shutdown_telemetry().await;

    result
}

async fn run(command: Commands, service: &SecurityService) -> anyhow::Result<ExitCode> {
    let exit = match command {
        Commands::Check {
            path,
            mime,
            name,
            user,
        } => {
            let upload = load_upload(&path, name, mime).await?;
            let screening = service.screen_upload(&upload, &user).await;
            print_json(&screening)?;
            if screening.passed() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Commands::Health => {
            print_json(&service.scanner_health().await)?;
            ExitCode::SUCCESS
        }
        Commands::Sign { path, ttl } => {
            let url = service.generate_signed_url(&path, ttl.map(Duration::from_secs))?;
            print_json(&json!({ "url": url }))?;
            ExitCode::SUCCESS
        }
        Commands::Verify { url } => {
            let valid = service.verify_signed_url(&url);
            print_json(&json!({ "valid": valid }))?;
            if valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
    };

    Ok(exit)
}
