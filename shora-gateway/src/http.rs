//! reqwest implementation of [`BackendGateway`].

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde_json::Value;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::client::BackendGateway;
use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};
use crate::models::{
    check_success, extract_list, BotReplyRequest, BotReplyResponse, IncidentReport,
    IncidentSummary, ProfileUpsert, Registration, RegistrationEnvelope, Reminder,
};

/// Which of the two backends a request goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backend {
    /// Incidents and admin routes; receives the bearer token.
    Main,
    /// Chatbot users, bot replies, reminders.
    Bot,
}

/// HTTP gateway over reqwest. Cheap to clone; the inner client pools connections.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    config: GatewayConfig,
}

impl HttpGateway {
    /// Builds the client with the configured timeout.
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayError::Request(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn base(&self, backend: Backend) -> &str {
        match backend {
            Backend::Main => &self.config.api_url,
            Backend::Bot => &self.config.bot_api_url,
        }
    }

    /// Appends path segments to the base URL; segments are percent-encoded.
    fn endpoint(&self, backend: Backend, segments: &[&str]) -> Result<Url> {
        let base = self.base(backend);
        let mut url = Url::parse(base)
            .map_err(|e| GatewayError::Request(format!("invalid base URL {}: {}", base, e)))?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| GatewayError::Request(format!("base URL cannot have a path: {}", base)))?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    fn request(&self, method: Method, backend: Backend, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match (&self.config.api_token, backend) {
            (Some(token), Backend::Main) => builder.bearer_auth(token),
            _ => builder,
        }
    }

    /// Sends the request and decodes the JSON body; an empty body decodes to `Value::Null`.
    async fn execute(&self, builder: RequestBuilder, backend: Backend) -> Result<Value> {
        let base = self.base(backend);
        let response = builder
            .send()
            .await
            .map_err(|e| GatewayError::from_reqwest(e, base))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| {
                    if text.trim().is_empty() {
                        status.canonical_reason().unwrap_or("error").to_string()
                    } else {
                        text
                    }
                });
            warn!(status = status.as_u16(), error = %message, "backend returned an error status");
            return Err(GatewayError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::from_reqwest(e, base))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| GatewayError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl BackendGateway for HttpGateway {
    #[instrument(skip(self, profile), fields(name = %profile.name))]
    async fn register_profile(&self, profile: &ProfileUpsert) -> Result<Registration> {
        info!("step: gateway register_profile");
        let url = self.endpoint(Backend::Bot, &["chatbot-users", "create-or-update"])?;
        let body = self
            .execute(self.request(Method::POST, Backend::Bot, url).json(profile), Backend::Bot)
            .await?;
        let envelope: RegistrationEnvelope =
            serde_json::from_value(body).map_err(|e| GatewayError::Malformed(e.to_string()))?;
        let registration = envelope.into_registration()?;
        info!(
            user_id = ?registration.user_id,
            newly_created = registration.newly_created,
            "step: gateway register_profile done"
        );
        Ok(registration)
    }

    #[instrument(skip(self, request), fields(state = %request.state, text_len = request.text.len()))]
    async fn bot_reply(&self, request: &BotReplyRequest) -> Result<Option<String>> {
        info!("step: gateway bot_reply");
        let url = self.endpoint(Backend::Bot, &["bot", "voice-bot"])?;
        let body = self
            .execute(self.request(Method::POST, Backend::Bot, url).json(request), Backend::Bot)
            .await?;
        if body.is_null() {
            return Ok(None);
        }
        let reply: BotReplyResponse =
            serde_json::from_value(body).map_err(|e| GatewayError::Malformed(e.to_string()))?;
        let text = reply.into_text();
        info!(has_reply = text.is_some(), "step: gateway bot_reply done");
        Ok(text)
    }

    #[instrument(skip(self, report), fields(reporter = ?report.chatbot_user_name))]
    async fn report_incident(&self, report: &IncidentReport) -> Result<()> {
        info!("step: gateway report_incident");
        let url = self.endpoint(Backend::Main, &["api", "incidents"])?;
        let body = self
            .execute(self.request(Method::POST, Backend::Main, url).json(report), Backend::Main)
            .await?;
        check_success(&body)?;
        info!("step: gateway report_incident done");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn pending_reminders(&self, user_name: &str) -> Result<Vec<Reminder>> {
        let url = self.endpoint(Backend::Bot, &["reminders", "user", user_name])?;
        let body = self
            .execute(self.request(Method::GET, Backend::Bot, url), Backend::Bot)
            .await?;
        let reminders: Vec<Reminder> = extract_list(body)?;
        info!(count = reminders.len(), "step: gateway pending_reminders done");
        Ok(reminders)
    }

    #[instrument(skip(self))]
    async fn mark_reminder_sent(&self, reminder_id: &str) -> Result<()> {
        let url = self.endpoint(Backend::Bot, &["reminders", reminder_id, "mark-sent"])?;
        let body = self
            .execute(self.request(Method::POST, Backend::Bot, url), Backend::Bot)
            .await?;
        check_success(&body)?;
        info!("step: gateway mark_reminder_sent done");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn open_incidents(&self, limit: usize) -> Result<Vec<IncidentSummary>> {
        let mut url = self.endpoint(Backend::Main, &["api", "admin", "incidents"])?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string())
            .append_pair("status", "open,in-progress");
        let body = self
            .execute(self.request(Method::GET, Backend::Main, url), Backend::Main)
            .await?;
        let incidents: Vec<IncidentSummary> = extract_list(body)?;
        info!(count = incidents.len(), "step: gateway open_incidents done");
        Ok(incidents)
    }
}
