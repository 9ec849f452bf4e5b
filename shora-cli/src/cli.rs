//! CLI parser and config loading.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shora_gateway::GatewayConfig;

#[derive(Parser, Debug)]
#[command(name = "shora")]
#[command(about = "SHORA site-safety companion: terminal chat and backend helpers", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Main API base URL (overrides SHORA_API_URL).
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Bot API base URL (overrides SHORA_BOT_API_URL).
    #[arg(long, global = true)]
    pub bot_api_url: Option<String>,

    /// Bearer token for the main API (overrides SHORA_API_TOKEN).
    #[arg(short, long, global = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Talk to Shora in the terminal (/tap <n>, /reset, /mic, /quit).
    Chat,
    /// List open and in-progress incidents.
    Incidents {
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// List pending reminders for a user without acknowledging them.
    Reminders { name: String },
}

impl Cli {
    /// Gateway config from env, with command-line values taking precedence.
    pub fn gateway_config(&self) -> Result<GatewayConfig> {
        let mut config = GatewayConfig::from_env().context("Load gateway config from env")?;
        if let Some(url) = &self.api_url {
            config.api_url = url.clone();
        }
        if let Some(url) = &self.bot_api_url {
            config.bot_api_url = url.clone();
        }
        if let Some(token) = &self.token {
            config.api_token = Some(token.clone());
        }
        config.validate()?;
        Ok(config)
    }
}

/// One line typed in the chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Text(String),
    /// 1-based button number.
    Tap(usize),
    Reset,
    Microphone,
    Quit,
    Empty,
    Unknown(String),
}

pub fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return Input::Text(line.to_string());
    };
    let mut parts = command.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("tap"), Some(n)) => match n.parse::<usize>() {
            Ok(n) if n > 0 => Input::Tap(n),
            _ => Input::Unknown(line.to_string()),
        },
        (Some("reset"), None) => Input::Reset,
        (Some("mic"), None) => Input::Microphone,
        (Some("quit"), None) | (Some("exit"), None) => Input::Quit,
        _ => Input::Unknown(line.to_string()),
    }
}
