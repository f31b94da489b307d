//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `crawlerbox` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;
use std::process;
use tokio_util::sync::CancellationToken;

use crawlerbox::initialization::{init_client, init_logger_with, init_mailbox};
use crawlerbox::{
    Config, HttpMailbox, Ingestor, InvestigateClient, MailParser, Opt, QueryKind, ReportSelector,
    RunMode,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Tokens and URLs may live in a .env file next to the working directory or the executable
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let opt = Opt::parse();
    let mode = opt.run_mode().unwrap_or_else(|e| e.exit());
    let config = opt.to_config();

    init_logger_with(config.log_level.clone().into(), config.log_format.clone())
        .context("Failed to initialize logger")?;

    let result = match mode {
        RunMode::Query { kind, target } => run_query(&config, kind, &target).await,
        RunMode::Once(selector) => run_once(&config, selector).await,
        RunMode::Background => run_background(&config).await,
    };

    if let Err(e) = result {
        eprintln!("crawlerbox error: {:#}", e);
        process::exit(1);
    }
    Ok(())
}

fn build_ingestor(config: &Config) -> Result<Ingestor<HttpMailbox, MailParser>> {
    let client = init_client(config).context("Failed to initialize HTTP client")?;
    let mailbox =
        init_mailbox(config, client.clone()).context("Failed to initialize mailbox client")?;
    Ok(Ingestor::new(mailbox, MailParser::new(), client))
}

async fn run_query(config: &Config, kind: QueryKind, target: &str) -> Result<()> {
    let client =
        InvestigateClient::from_config(config).context("Failed to initialize investigate client")?;

    match client
        .invoke(kind, target)
        .await
        .with_context(|| format!("{kind} query for '{target}' failed"))?
    {
        Some(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        None => bail!("{kind} query for '{target}' returned no result"),
    }
}

async fn run_once(config: &Config, selector: ReportSelector) -> Result<()> {
    let ingestor = build_ingestor(config)?;
    let report = ingestor
        .run_cycle(selector)
        .await
        .context("Ingestion cycle failed")?;

    println!(
        "Parsed {} of {} reported email{} for {} in {:.1}s",
        report.parsed,
        report.total,
        if report.total == 1 { "" } else { "s" },
        report.selector,
        report.elapsed.as_secs_f64()
    );
    Ok(())
}

async fn run_background(config: &Config) -> Result<()> {
    let ingestor = build_ingestor(config)?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, stopping after the current cycle");
                cancel.cancel();
            }
        }
    });

    info!(
        "Polling for reported emails every {}s",
        config.poll_interval.as_secs()
    );
    ingestor.run_background(config.poll_interval, cancel).await;
    Ok(())
}
