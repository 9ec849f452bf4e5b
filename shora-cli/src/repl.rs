//! Interactive terminal chat over a [`SessionHandle`].

use anyhow::Result;
use shora_chat::{format_entry, format_header, Entry, SessionHandle, Snapshot};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::cli::{parse_input, Input};

/// Prints what changed between two snapshots: new entries and entries updated in place
/// (resolved placeholders, buttons that went inactive).
#[derive(Default)]
pub struct TranscriptPrinter {
    shown: Vec<Entry>,
    points: u32,
}

impl TranscriptPrinter {
    pub fn update(&mut self, snapshot: &Snapshot) -> Vec<String> {
        let mut lines = Vec::new();
        let cleared = snapshot.entries.len() < self.shown.len()
            || self
                .shown
                .iter()
                .zip(&snapshot.entries)
                .any(|(old, new)| old.id != new.id);
        if cleared {
            lines.push("--- nouvelle conversation ---".to_string());
            self.shown.clear();
        }
        for (i, entry) in snapshot.entries.iter().enumerate() {
            match self.shown.get(i) {
                Some(old) if old == entry => {}
                Some(old) if old.body == entry.body && !entry.buttons.is_empty() => {
                    lines.push(format_entry(entry));
                }
                // only the buttons went away
                Some(old) if old.body == entry.body => {}
                _ => lines.push(format_entry(entry)),
            }
        }
        if snapshot.points != self.points {
            self.points = snapshot.points;
            lines.push(format_header(snapshot));
        }
        self.shown = snapshot.entries.clone();
        lines
    }
}

pub async fn run_chat(handle: SessionHandle) -> Result<()> {
    println!("{}", format_header(&handle.snapshot()));
    println!("(/tap <n> pour un bouton, /reset, /mic, /quit)\n");

    let mut printer = TranscriptPrinter::default();
    let mut snapshots = handle.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                for line in printer.update(&snapshot) {
                    println!("{}\n", line);
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match parse_input(&line) {
                    Input::Text(text) => handle.submit_text(text)?,
                    Input::Tap(n) => {
                        let snapshot = handle.snapshot();
                        match snapshot.live_buttons() {
                            Some((id, buttons)) if n <= buttons.len() => {
                                handle.tap_button(id.clone(), buttons[n - 1].value.clone())?;
                            }
                            Some(_) => println!("Pas de bouton {}.\n", n),
                            None => println!("Aucun bouton actif.\n"),
                        }
                    }
                    Input::Reset => handle.reset()?,
                    Input::Microphone => println!("🎤 {}\n", handle.microphone().await?),
                    Input::Quit => break,
                    Input::Empty => {}
                    Input::Unknown(command) => println!("Commande inconnue: {}\n", command),
                }
            }
        }
    }

    info!("step: terminal chat closing");
    handle.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shora_chat::EntryBody;
    use shora_core::{Button, ConversationState, MessageId, Speaker};

    fn entry(id: &str, body: EntryBody, buttons: Vec<Button>) -> Entry {
        Entry {
            id: MessageId::new(id),
            speaker: Speaker::Bot,
            body,
            badge: None,
            image_url: None,
            buttons,
        }
    }

    fn snapshot(entries: Vec<Entry>, points: u32) -> Snapshot {
        Snapshot {
            state: ConversationState::Active,
            points,
            user_name: Some("Awa".to_string()),
            entries,
        }
    }

    #[test]
    fn test_printer_prints_new_and_resolved_entries() {
        let mut printer = TranscriptPrinter::default();
        let first = snapshot(vec![entry("a", EntryBody::Loading, vec![])], 0);
        assert_eq!(printer.update(&first), vec!["Shora: Shora réfléchit...".to_string()]);
        assert!(printer.update(&first).is_empty());

        let resolved = snapshot(
            vec![
                entry("a", EntryBody::Text("Salut".to_string()), vec![]),
                entry("b", EntryBody::Text("Quiz".to_string()), vec![Button::new("Oui", "correct")]),
            ],
            0,
        );
        assert_eq!(
            printer.update(&resolved),
            vec!["Shora: Salut".to_string(), "Shora: Quiz\n  [1] Oui".to_string()]
        );

        let answered = snapshot(
            vec![
                entry("a", EntryBody::Text("Salut".to_string()), vec![]),
                entry("b", EntryBody::Text("Quiz".to_string()), vec![]),
            ],
            10,
        );
        assert_eq!(printer.update(&answered), vec!["SHORA · Awa · active · 🏆 10 points".to_string()]);
    }

    #[test]
    fn test_printer_detects_reset() {
        let mut printer = TranscriptPrinter::default();
        printer.update(&snapshot(vec![entry("a", EntryBody::Text("x".to_string()), vec![])], 0));
        let lines = printer.update(&snapshot(vec![entry("z", EntryBody::Text("Salut".to_string()), vec![])], 0));
        assert_eq!(lines[0], "--- nouvelle conversation ---");
        assert_eq!(lines[1], "Shora: Salut");
    }
}
