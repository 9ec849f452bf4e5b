//! Core types: message, buttons, user profile, conversation state, quiz items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable message identifier. Reminder messages derive theirs from the server id so they can be deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh id such as `greeting-5f0c...`.
    pub fn generate(prefix: &str) -> Self {
        Self(format!("{}-{}", prefix, uuid::Uuid::new_v4()))
    }

    /// Id used for the transcript entry of a server reminder.
    pub fn for_reminder(reminder_id: &str) -> Self {
        Self(format!("reminder-{}", reminder_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who wrote the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Bot,
}

/// How the message is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Button,
    Quiz,
    Incident,
    Reminder,
}

/// One button of a prompt or quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub value: String,
    pub emoji: Option<String>,
}

impl Button {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            emoji: None,
        }
    }

    pub fn with_emoji(mut self, emoji: impl Into<String>) -> Self {
        self.emoji = Some(emoji.into());
        self
    }

    /// Label as shown to the user, emoji first when present.
    pub fn caption(&self) -> String {
        match &self.emoji {
            Some(emoji) => format!("{} {}", emoji, self.label),
            None => self.label.clone(),
        }
    }
}

/// A transcript entry. A pending message is a bot message whose text is not known yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub speaker: Speaker,
    pub text: String,
    pub kind: MessageKind,
    pub buttons: Vec<Button>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub pending: bool,
}

impl Message {
    /// A message typed (or tapped) by the user.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: MessageId::generate("user"),
            speaker: Speaker::User,
            text: text.into(),
            kind: MessageKind::Text,
            buttons: Vec::new(),
            image_url: None,
            created_at: Utc::now(),
            pending: false,
        }
    }

    /// A bot message of the given kind; the id prefix describes its origin.
    pub fn bot(prefix: &str, kind: MessageKind, text: impl Into<String>) -> Self {
        Self {
            id: MessageId::generate(prefix),
            speaker: Speaker::Bot,
            text: text.into(),
            kind,
            buttons: Vec::new(),
            image_url: None,
            created_at: Utc::now(),
            pending: false,
        }
    }

    /// Placeholder for a bot reply that is still in flight.
    pub fn pending() -> Self {
        Self {
            pending: true,
            ..Self::bot("loading", MessageKind::Text, "")
        }
    }

    pub fn with_id(mut self, id: MessageId) -> Self {
        self.id = id;
        self
    }

    pub fn with_buttons(mut self, buttons: Vec<Button>) -> Self {
        self.buttons = buttons;
        self
    }

    pub fn with_image(mut self, image_url: Option<String>) -> Self {
        self.image_url = image_url;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

/// Preferred way of talking to the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionMode {
    Text,
    Audio,
}

impl InteractionMode {
    /// Parses a button value (`text` / `audio`).
    pub fn from_value(value: &str) -> Option<Self> {
        match value {
            "text" => Some(Self::Text),
            "audio" => Some(Self::Audio),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Audio => "audio",
        }
    }
}

/// Profile built during onboarding. Field names on the wire follow the backend (`chantierType`, `langue`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<InteractionMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profession: Option<String>,
    #[serde(rename = "chantierType", skip_serializing_if = "Option::is_none")]
    pub site_type: Option<String>,
    #[serde(rename = "langue", skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(rename = "completed", default)]
    pub complete: bool,
    #[serde(rename = "userId", skip_serializing_if = "Option::is_none")]
    pub remote_user_id: Option<String>,
    #[serde(rename = "isNewUser", skip_serializing_if = "Option::is_none")]
    pub newly_created: Option<bool>,
}

impl UserProfile {
    /// Returns the name if one was given and it is not blank.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.trim().is_empty())
    }
}

/// Which step of the scripted conversation is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConversationState {
    Welcome,
    AskName,
    ChooseMode,
    AskProfession,
    AskSiteType,
    AskLanguage,
    Active,
    ReportingIncident,
    Ended,
}

impl ConversationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::AskName => "askName",
            Self::ChooseMode => "chooseMode",
            Self::AskProfession => "askProfession",
            Self::AskSiteType => "askSiteType",
            Self::AskLanguage => "askLanguage",
            Self::Active => "active",
            Self::ReportingIncident => "reportingIncident",
            Self::Ended => "ended",
        }
    }

    /// True once onboarding is over and free chat is accepted.
    pub fn is_chatting(&self) -> bool {
        matches!(self, Self::Active | Self::ReportingIncident)
    }
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a quiz option is the right answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Correct,
    Incorrect,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Correct => "correct",
            Self::Incorrect => "incorrect",
        }
    }

    pub fn from_value(value: &str) -> Option<Self> {
        match value {
            "correct" => Some(Self::Correct),
            "incorrect" => Some(Self::Incorrect),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizOption {
    pub label: &'static str,
    pub emoji: &'static str,
    pub verdict: Verdict,
}

/// A two-option safety question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizItem {
    pub question: &'static str,
    pub options: Vec<QuizOption>,
}

impl QuizItem {
    /// Buttons for the quiz message; the value carries the verdict.
    pub fn buttons(&self) -> Vec<Button> {
        self.options
            .iter()
            .map(|opt| Button::new(opt.label, opt.verdict.as_str()).with_emoji(opt.emoji))
            .collect()
    }
}
