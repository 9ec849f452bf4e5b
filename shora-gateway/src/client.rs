//! Backend abstraction used by the conversation. [`HttpGateway`](crate::HttpGateway) is the production
//! implementation; tests substitute an in-memory one.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{BotReplyRequest, IncidentReport, IncidentSummary, ProfileUpsert, Registration, Reminder};

/// One method per backend endpoint the chat consumes.
#[async_trait]
pub trait BackendGateway: Send + Sync {
    /// Creates or updates the chat profile; returns the remote id and whether the user is new.
    async fn register_profile(&self, profile: &ProfileUpsert) -> Result<Registration>;
    /// Asks the bot backend for a reply. `Ok(None)` when the backend returned no text.
    async fn bot_reply(&self, request: &BotReplyRequest) -> Result<Option<String>>;
    /// Files an incident report.
    async fn report_incident(&self, report: &IncidentReport) -> Result<()>;
    /// Reminders waiting for the named user.
    async fn pending_reminders(&self, user_name: &str) -> Result<Vec<Reminder>>;
    /// Acknowledges delivery of a reminder.
    async fn mark_reminder_sent(&self, reminder_id: &str) -> Result<()>;
    /// Open and in-progress incidents, newest first, at most `limit`.
    async fn open_incidents(&self, limit: usize) -> Result<Vec<IncidentSummary>>;
}
