//! shora CLI: terminal chat with Shora, open incidents, pending reminders. Config from env (.env) and CLI flags.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use shora_chat::{ChatConfig, ChatSession, Conversation, FileTipLedger};
use shora_cli::{run_chat, Cli, Commands};
use shora_gateway::{BackendGateway, HttpGateway};
use tracing::info;

const DEFAULT_LOG_FILE: &str = "logs/shora.log";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_file = std::env::var("SHORA_LOG_FILE").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());
    shora_core::init_tracing(&log_file)?;

    let gateway_config = cli.gateway_config()?;
    info!(
        api_url = %gateway_config.api_url,
        bot_api_url = %gateway_config.bot_api_url,
        has_token = gateway_config.api_token.is_some(),
        "step: config loaded"
    );
    let gateway = HttpGateway::new(gateway_config).context("Build HTTP client")?;

    match cli.command {
        Commands::Chat => handle_chat(gateway).await,
        Commands::Incidents { limit } => handle_incidents(&gateway, limit).await,
        Commands::Reminders { name } => handle_reminders(&gateway, &name).await,
    }
}

async fn handle_chat(gateway: HttpGateway) -> Result<()> {
    let config = ChatConfig::from_env()?;
    let ledger = FileTipLedger::new(config.tip_ledger_path.clone());
    let conversation = Conversation::new(config.timings);
    let handle = ChatSession::spawn(conversation, Arc::new(gateway), Arc::new(ledger), config);
    run_chat(handle).await
}

async fn handle_incidents(gateway: &HttpGateway, limit: usize) -> Result<()> {
    let incidents = gateway
        .open_incidents(limit)
        .await
        .context("Fetch open incidents")?;

    if incidents.is_empty() {
        println!("No open incidents.");
        return Ok(());
    }

    println!("{} open incident(s):\n", incidents.len());
    println!("{:<26} {:<18} {:<10} {:<12} {}", "id", "reported_at", "severity", "status", "title");
    println!("{}", "-".repeat(100));
    for incident in &incidents {
        let reported_at = incident
            .reported_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<26} {:<18} {:<10} {:<12} {}",
            incident.id,
            reported_at,
            incident.severity.as_deref().unwrap_or("-"),
            incident.status.as_deref().unwrap_or("-"),
            incident.title()
        );
        if let Some(description) = &incident.description {
            println!("    {}", description.replace('\n', " "));
        }
    }
    Ok(())
}

async fn handle_reminders(gateway: &HttpGateway, name: &str) -> Result<()> {
    let reminders = gateway
        .pending_reminders(name)
        .await
        .with_context(|| format!("Fetch pending reminders for {}", name))?;

    if reminders.is_empty() {
        println!("No pending reminders for {}.", name);
        return Ok(());
    }

    println!("{} pending reminder(s) for {}:\n", reminders.len(), name);
    for reminder in &reminders {
        let created_at = reminder
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("[{}] {} {}", reminder.id, created_at, reminder.message);
        if let Some(url) = &reminder.image_url {
            println!("    image: {}", url);
        }
    }
    Ok(())
}
