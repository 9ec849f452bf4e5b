//! Fixed texts of the scripted conversation: prompts, fallbacks, safety tips and quiz items.

use rand::Rng;
use shora_core::{Button, QuizItem, QuizOption, Verdict};

pub const WELCOME: &str =
    "Salut 👋 Je suis Shora, ton compagnon sécurité sur le chantier.\n\nPour commencer, quel est ton nom ?";
pub const PROFESSION_QUESTION: &str = "Quel est ton métier ?";
pub const SITE_TYPE_QUESTION: &str = "Quel type de chantier tu fais le plus souvent ?";
pub const LANGUAGE_QUESTION: &str = "Dans quelle langue tu veux que je te parle ?";
pub const MODE_NUDGE: &str = "Touche « Texte » ou « Audio » pour continuer.";

pub const NO_ANSWER: &str = "Désolé, aucune réponse.";
pub const REPLY_FAILED: &str = "Désolé, une erreur est survenue. Réessaye plus tard.";

pub const INCIDENT_ACK: &str = "🚨 Incident détecté ! Je vais alerter le superviseur immédiatement.";
pub const INCIDENT_FILED: &str =
    "✅ Incident enregistré et signalé au superviseur. Un responsable va intervenir rapidement. Reste en sécurité !";
pub const INCIDENT_FALLBACK: &str =
    "⚠️ L'incident a été noté. Contacte directement ton superviseur si c'est urgent !";

pub const QUIZ_WRONG: &str =
    "Attention ! La bonne réponse était l'autre option. Reste vigilant ! ⚠️";
pub const CONVERSATION_OVER: &str =
    "Conversation terminée 👋 Relance une nouvelle conversation pour recommencer.";

pub const MIC_UNAVAILABLE: &str = "Fonctionnalité audio en cours de développement.";
pub const MIC_NEEDS_AUDIO_MODE: &str =
    "Active le mode audio dans tes préférences pour utiliser le microphone.";

pub const QUIZ_POINTS: u32 = 10;

pub const DAILY_TIPS: [&str; 5] = [
    "⚠️ Avant de soulever, vérifie que le sol n'est pas glissant.",
    "🦺 N'oublie pas ton casque ! C'est ton meilleur ami sur le chantier.",
    "👷 Porte toujours tes gants de protection lors de la manipulation d'outils.",
    "👀 Vérifie ton environnement avant de commencer le travail.",
    "🔌 Évite les fils électriques dénudés et signale-les immédiatement.",
];

/// (value, label, emoji) of the language prompt.
pub const LANGUAGES: [(&str, &str, &str); 3] = [
    ("fr", "Français", "🇫🇷"),
    ("ar", "Arabe", "🇲🇦"),
    ("en", "Anglais", "🇬🇧"),
];

pub fn greeting_new(name: &str) -> String {
    format!(
        "Enchanté {} ! 👋 Bienvenue sur SHORA.\n\nTu veux qu'on parle en texte ou en audio ?",
        name
    )
}

pub fn greeting_returning(name: &str) -> String {
    format!("Bon retour {} ! 👋\n\nTu veux qu'on parle en texte ou en audio ?", name)
}

/// Used when the backend could not be reached.
pub fn greeting_offline(name: &str) -> String {
    format!("Enchanté {} ! 👋\n\nTu veux qu'on parle en texte ou en audio ?", name)
}

pub fn mode_buttons() -> Vec<Button> {
    vec![
        Button::new("Texte", "text").with_emoji("🔤"),
        Button::new("Audio", "audio").with_emoji("🎧"),
    ]
}

pub fn mode_confirmation(mode_label: &str) -> String {
    format!(
        "Parfait ! Mode {} activé. 🎯\n\nMaintenant, créons ton profil rapide pour personnaliser ton expérience.",
        mode_label
    )
}

pub fn language_buttons() -> Vec<Button> {
    LANGUAGES
        .iter()
        .map(|(value, label, emoji)| Button::new(*label, *value).with_emoji(*emoji))
        .collect()
}

/// Label for a language code; anything else is shown as typed.
pub fn language_label(language: &str) -> &str {
    LANGUAGES
        .iter()
        .find(|(value, _, _)| *value == language)
        .map(|(_, label, _)| *label)
        .unwrap_or(language)
}

pub fn completion_summary(profession: &str, site_type: &str, language_label: &str) -> String {
    format!(
        "Excellent ! Profil créé. 🎉\n\nMétier: {}\nChantier: {}\nLangue: {}\n\nJe suis maintenant prêt à t'aider avec la sécurité sur ton chantier !",
        profession, site_type, language_label
    )
}

pub fn quiz_correct(total: u32) -> String {
    format!(
        "Bien joué ! Tu viens d'éviter un risque 💪\n\n+{} points ! Total: {} points 🏆",
        QUIZ_POINTS, total
    )
}

pub fn ending_reminder(name: &str) -> String {
    format!(
        "🛡️ **Rappel important avant de partir :**\n\n\
         **Comment signaler un incident :**\n\n\
         1️⃣ **Dans le chat** : Dis simplement \"Danger\" ou \"Incident\" et décris la situation\n\
         2️⃣ **Appelle les secours** en cas d'urgence :\n   \
         • 🚨 Pompiers : 19\n   \
         • 🏥 SAMU : 15\n   \
         • 🚔 Police : 17\n\
         3️⃣ **Alerte ton superviseur** directement\n\
         4️⃣ **Ne prends jamais de risques** inutiles\n\n\
         💪 Reste vigilant et prends soin de toi !\n\n\
         À bientôt {} ! 👋",
        name
    )
}

pub fn quizzes() -> Vec<QuizItem> {
    vec![
        QuizItem {
            question: "Si tu vois un fil dénudé, tu fais quoi ?",
            options: vec![
                QuizOption { label: "Je touche pour voir", emoji: "1️⃣", verdict: Verdict::Incorrect },
                QuizOption { label: "Je signale", emoji: "2️⃣", verdict: Verdict::Correct },
            ],
        },
        QuizItem {
            question: "Avant de monter sur une échelle, tu vérifies quoi ?",
            options: vec![
                QuizOption { label: "Que l'échelle est stable", emoji: "1️⃣", verdict: Verdict::Correct },
                QuizOption { label: "Rien, je monte directement", emoji: "2️⃣", verdict: Verdict::Incorrect },
            ],
        },
        QuizItem {
            question: "En cas de blessure, tu fais quoi en premier ?",
            options: vec![
                QuizOption { label: "Je continue le travail", emoji: "1️⃣", verdict: Verdict::Incorrect },
                QuizOption { label: "Je signale et je me soigne", emoji: "2️⃣", verdict: Verdict::Correct },
            ],
        },
    ]
}

/// Source of the random choices (tip, quiz). Tests pin it with [`FixedPicker`].
pub trait Picker: Send {
    /// Index in `0..len`; `len` is never zero.
    fn pick(&mut self, len: usize) -> usize;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RandomPicker;

impl Picker for RandomPicker {
    fn pick(&mut self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Deterministic picker for tests: always the same index, clamped to the catalog size.
#[derive(Debug, Clone, Copy)]
pub struct FixedPicker(pub usize);

impl Picker for FixedPicker {
    fn pick(&mut self, len: usize) -> usize {
        self.0.min(len.saturating_sub(1))
    }
}
