//! In-process [`BackendGateway`] with scripted answers and call recording.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use shora_chat::{ChatConfig, ChatSession, Conversation, FixedPicker, MemoryTipLedger, SessionHandle, Snapshot};
use shora_core::ConversationState;
use shora_gateway::{
    BackendGateway, BotReplyRequest, GatewayError, IncidentReport, IncidentSummary, ProfileUpsert,
    Registration, Reminder, Result,
};

/// Messages containing this word are answered after [`SLOW_REPLY`].
pub const SLOW_MARKER: &str = "lentement";
pub const SLOW_REPLY: Duration = Duration::from_secs(5);

#[derive(Default)]
pub struct FakeGateway {
    pub registration_fails: AtomicBool,
    pub returning_user: AtomicBool,
    pub incident_fails: AtomicBool,
    pub reply: Mutex<Option<String>>,
    pub reminders: Mutex<Vec<Reminder>>,
    pub upserts: Mutex<Vec<ProfileUpsert>>,
    pub replies_requested: Mutex<Vec<BotReplyRequest>>,
    pub incidents: Mutex<Vec<IncidentReport>>,
    pub marked_sent: Mutex<Vec<String>>,
    pub polls: AtomicUsize,
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_reminder(&self, id: &str, message: &str) {
        self.reminders.lock().unwrap().push(Reminder {
            id: id.to_string(),
            message: message.to_string(),
            image_url: None,
            created_at: None,
        });
    }

    pub fn set_reply(&self, reply: &str) {
        *self.reply.lock().unwrap() = Some(reply.to_string());
    }
}

#[async_trait]
impl BackendGateway for FakeGateway {
    async fn register_profile(&self, profile: &ProfileUpsert) -> Result<Registration> {
        self.upserts.lock().unwrap().push(profile.clone());
        if self.registration_fails.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable {
                url: "http://localhost:3001".to_string(),
            });
        }
        Ok(Registration {
            user_id: Some("u-1".to_string()),
            newly_created: !self.returning_user.load(Ordering::SeqCst),
        })
    }

    async fn bot_reply(&self, request: &BotReplyRequest) -> Result<Option<String>> {
        self.replies_requested.lock().unwrap().push(request.clone());
        if request.text.contains(SLOW_MARKER) {
            tokio::time::sleep(SLOW_REPLY).await;
        }
        let scripted = self.reply.lock().unwrap().clone();
        Ok(Some(scripted.unwrap_or_else(|| format!("Réponse à: {}", request.text))))
    }

    async fn report_incident(&self, report: &IncidentReport) -> Result<()> {
        self.incidents.lock().unwrap().push(report.clone());
        if self.incident_fails.load(Ordering::SeqCst) {
            return Err(GatewayError::Status {
                status: 500,
                message: "validation failed".to_string(),
            });
        }
        Ok(())
    }

    async fn pending_reminders(&self, _user_name: &str) -> Result<Vec<Reminder>> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reminders.lock().unwrap().clone())
    }

    async fn mark_reminder_sent(&self, reminder_id: &str) -> Result<()> {
        self.marked_sent.lock().unwrap().push(reminder_id.to_string());
        Ok(())
    }

    async fn open_incidents(&self, _limit: usize) -> Result<Vec<IncidentSummary>> {
        Ok(Vec::new())
    }
}

/// Session with deterministic picks (second quiz, second tip) and an empty in-memory tip ledger.
pub fn start(gateway: Arc<FakeGateway>) -> SessionHandle {
    start_with_ledger(gateway, Arc::new(MemoryTipLedger::new()))
}

pub fn start_with_ledger(gateway: Arc<FakeGateway>, ledger: Arc<MemoryTipLedger>) -> SessionHandle {
    let config = ChatConfig::default();
    let conversation = Conversation::with_picker(config.timings, Box::new(FixedPicker(1)));
    ChatSession::spawn(conversation, gateway, ledger, config)
}

pub async fn wait_state(handle: &SessionHandle, state: ConversationState) -> Snapshot {
    handle.wait_for(|s| s.state == state).await.unwrap()
}

pub async fn tap(handle: &SessionHandle, value: &str) {
    let snap = handle.wait_for(|s| s.live_buttons().is_some()).await.unwrap();
    let (id, _) = snap.live_buttons().unwrap();
    handle.tap_button(id.clone(), value).unwrap();
}

/// Awa → Texte → maçon → bâtiment → Français, returns the first `active` snapshot.
pub async fn onboard(handle: &SessionHandle) -> Snapshot {
    wait_state(handle, ConversationState::AskName).await;
    handle.submit_text("Awa").unwrap();
    wait_state(handle, ConversationState::ChooseMode).await;
    tap(handle, "text").await;
    handle
        .wait_for(|s| s.last_text() == Some(shora_chat::catalog::PROFESSION_QUESTION))
        .await
        .unwrap();
    handle.submit_text("maçon").unwrap();
    wait_state(handle, ConversationState::AskSiteType).await;
    handle.submit_text("bâtiment").unwrap();
    wait_state(handle, ConversationState::AskLanguage).await;
    tap(handle, "fr").await;
    wait_state(handle, ConversationState::Active).await
}
