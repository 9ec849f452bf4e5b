//! Keyword detection on free text: plain case-insensitive substring matching, no tokenisation.
//! A name or word that merely contains a keyword ("fin" in "enfin") matches too.

const INCIDENT_KEYWORDS: [&str; 3] = ["danger", "incident", "accident"];

const FAREWELL_KEYWORDS: [&str; 10] = [
    "au revoir",
    "aurevoir",
    "merci",
    "bye",
    "à bientôt",
    "a bientot",
    "fin",
    "terminé",
    "termine",
    "terminer",
];

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    let lowered = text.to_lowercase();
    keywords.iter().any(|k| lowered.contains(k))
}

/// True when the message reports a danger, incident or accident.
pub fn is_incident_report(text: &str) -> bool {
    contains_any(text, &INCIDENT_KEYWORDS)
}

/// True when the user is closing the conversation.
pub fn is_farewell(text: &str) -> bool {
    contains_any(text, &FAREWELL_KEYWORDS)
}

/// A bot reply that asks a numbered question is followed by a quiz.
pub fn reply_invites_quiz(reply: &str) -> bool {
    reply.contains('?') && (reply.contains("1️⃣") || reply.contains("2️⃣"))
}
