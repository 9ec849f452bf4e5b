//! Chat runtime config: conversation delays, reminder poll interval, daily-tip ledger path.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_REMINDER_POLL_SECS: u64 = 30;
pub const DEFAULT_TIP_LEDGER: &str = ".shora/last_tip_date";

/// Every delay of the scripted conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub welcome: Duration,
    /// Between the mode confirmation and the profession question.
    pub profession_question: Duration,
    pub quiz_after_profile: Duration,
    pub quiz_after_reply: Duration,
    pub ending_reminder: Duration,
    pub daily_tip: Duration,
    /// How long the ending reminder stays up before a reset clears the conversation.
    pub reset_replay: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            welcome: Duration::from_millis(500),
            profession_question: Duration::from_secs(1),
            quiz_after_profile: Duration::from_secs(2),
            quiz_after_reply: Duration::from_secs(1),
            ending_reminder: Duration::from_secs(2),
            daily_tip: Duration::from_secs(2),
            reset_replay: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub timings: Timings,
    /// SHORA_REMINDER_POLL_SECS
    pub reminder_poll_interval: Duration,
    /// SHORA_TIP_LEDGER
    pub tip_ledger_path: PathBuf,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            timings: Timings::default(),
            reminder_poll_interval: Duration::from_secs(DEFAULT_REMINDER_POLL_SECS),
            tip_ledger_path: PathBuf::from(DEFAULT_TIP_LEDGER),
        }
    }
}

impl ChatConfig {
    /// Load from environment variables. A poll interval that is not a positive integer is an error.
    pub fn from_env() -> Result<Self> {
        let reminder_poll_secs = match env::var("SHORA_REMINDER_POLL_SECS") {
            Ok(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("SHORA_REMINDER_POLL_SECS is not a number: {}", raw))?;
                if secs == 0 {
                    anyhow::bail!("SHORA_REMINDER_POLL_SECS must be greater than zero");
                }
                secs
            }
            Err(_) => DEFAULT_REMINDER_POLL_SECS,
        };
        let tip_ledger_path = env::var("SHORA_TIP_LEDGER")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_TIP_LEDGER));

        Ok(Self {
            timings: Timings::default(),
            reminder_poll_interval: Duration::from_secs(reminder_poll_secs),
            tip_ledger_path,
        })
    }
}
