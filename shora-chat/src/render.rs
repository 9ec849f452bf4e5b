//! Projection of a conversation into what a front-end draws, plus a plain-text formatter.

use shora_core::{Button, ConversationState, MessageId, MessageKind, Speaker};

use crate::conversation::Conversation;

pub const LOADING_TEXT: &str = "Shora réfléchit...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryBody {
    Text(String),
    Loading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    Incident,
    Reminder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub id: MessageId,
    pub speaker: Speaker,
    pub body: EntryBody,
    pub badge: Option<Badge>,
    pub image_url: Option<String>,
    /// Empty unless the buttons accept taps.
    pub buttons: Vec<Button>,
}

/// Everything a front-end needs after a state change.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub state: ConversationState,
    pub points: u32,
    pub user_name: Option<String>,
    pub entries: Vec<Entry>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self {
            state: ConversationState::Welcome,
            points: 0,
            user_name: None,
            entries: Vec::new(),
        }
    }

    /// Newest entry with live buttons.
    pub fn live_buttons(&self) -> Option<(&MessageId, &[Button])> {
        self.entries
            .iter()
            .rev()
            .find(|e| !e.buttons.is_empty())
            .map(|e| (&e.id, e.buttons.as_slice()))
    }

    pub fn last_text(&self) -> Option<&str> {
        self.entries.iter().rev().find_map(|e| match &e.body {
            EntryBody::Text(text) => Some(text.as_str()),
            EntryBody::Loading => None,
        })
    }
}

pub fn render(conversation: &Conversation) -> Vec<Entry> {
    conversation
        .transcript()
        .messages()
        .iter()
        .map(|message| Entry {
            id: message.id.clone(),
            speaker: message.speaker,
            body: if message.pending {
                EntryBody::Loading
            } else {
                EntryBody::Text(message.text.clone())
            },
            badge: match message.kind {
                MessageKind::Incident => Some(Badge::Incident),
                MessageKind::Reminder => Some(Badge::Reminder),
                _ => None,
            },
            image_url: message.image_url.clone(),
            buttons: if conversation.is_actionable(&message.id) {
                message.buttons.clone()
            } else {
                Vec::new()
            },
        })
        .collect()
}

pub fn snapshot(conversation: &Conversation) -> Snapshot {
    Snapshot {
        state: conversation.state(),
        points: conversation.points(),
        user_name: conversation.profile().display_name().map(str::to_string),
        entries: render(conversation),
    }
}

/// Terminal rendering of one entry; buttons are numbered from 1.
pub fn format_entry(entry: &Entry) -> String {
    let who = match entry.speaker {
        Speaker::User => "Toi",
        Speaker::Bot => "Shora",
    };
    let badge = match entry.badge {
        Some(Badge::Incident) => "[incident] ",
        Some(Badge::Reminder) => "[rappel] ",
        None => "",
    };
    let body = match &entry.body {
        EntryBody::Text(text) => text.as_str(),
        EntryBody::Loading => LOADING_TEXT,
    };
    let mut out = format!("{}: {}{}", who, badge, body);
    if let Some(url) = &entry.image_url {
        out.push_str(&format!("\n  (image: {})", url));
    }
    for (i, button) in entry.buttons.iter().enumerate() {
        out.push_str(&format!("\n  [{}] {}", i + 1, button.caption()));
    }
    out
}

/// Header line: user name, state, and the points total once some were earned.
pub fn format_header(snapshot: &Snapshot) -> String {
    let mut header = format!(
        "SHORA · {} · {}",
        snapshot.user_name.as_deref().unwrap_or("invité"),
        snapshot.state
    );
    if snapshot.points > 0 {
        header.push_str(&format!(" · 🏆 {} points", snapshot.points));
    }
    header
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FixedPicker;
    use crate::config::Timings;
    use crate::effect::{Outcome, Timer};
    use shora_gateway::Registration;

    fn greeted() -> Conversation {
        let mut conv = Conversation::with_picker(Timings::default(), Box::new(FixedPicker(0)));
        conv.on_timer(Timer::Welcome);
        conv.submit_text("Awa");
        conv.on_outcome(Outcome::Registered(Ok(Registration {
            user_id: None,
            newly_created: true,
        })));
        conv
    }

    #[test]
    fn test_live_buttons_only_on_current_prompt() {
        let mut conv = greeted();
        let snap = snapshot(&conv);
        let (prompt_id, buttons) = snap.live_buttons().unwrap();
        assert_eq!(buttons.len(), 2);
        let prompt_id = prompt_id.clone();

        conv.tap_button(&prompt_id, "text");
        let snap = snapshot(&conv);
        assert!(snap.live_buttons().is_none());
        let entry = snap.entries.iter().find(|e| e.id == prompt_id).unwrap();
        assert!(entry.buttons.is_empty());
    }

    #[test]
    fn test_pending_renders_loading() {
        let mut conv = greeted();
        conv.submit_text("texte");
        conv.submit_text("maçon");
        conv.submit_text("bâtiment");
        conv.submit_text("fr");
        conv.submit_text("une question");
        let snap = snapshot(&conv);
        let last = snap.entries.last().unwrap();
        assert_eq!(last.body, EntryBody::Loading);
        assert_eq!(format_entry(last), "Shora: Shora réfléchit...");
        assert_eq!(snap.last_text(), Some("une question"));
    }

    #[test]
    fn test_format_entry_numbers_buttons() {
        let snap = snapshot(&greeted());
        let entry = snap.entries.last().unwrap();
        let text = format_entry(entry);
        assert!(text.starts_with("Shora: Enchanté Awa !"));
        assert!(text.ends_with("\n  [1] 🔤 Texte\n  [2] 🎧 Audio"));
    }

    #[test]
    fn test_header_shows_points_when_earned() {
        let mut snap = Snapshot::empty();
        assert_eq!(format_header(&snap), "SHORA · invité · welcome");
        snap.points = 20;
        snap.user_name = Some("Awa".to_string());
        snap.state = ConversationState::Active;
        assert_eq!(format_header(&snap), "SHORA · Awa · active · 🏆 20 points");
    }

    #[test]
    fn test_badges_and_images() {
        let entry = Entry {
            id: MessageId::for_reminder("r1"),
            speaker: Speaker::Bot,
            body: EntryBody::Text("Casque obligatoire".to_string()),
            badge: Some(Badge::Reminder),
            image_url: Some("https://img/1.png".to_string()),
            buttons: Vec::new(),
        };
        assert_eq!(
            format_entry(&entry),
            "Shora: [rappel] Casque obligatoire\n  (image: https://img/1.png)"
        );
    }
}
