//! The scripted conversation as a synchronous state machine.
//!
//! [`Conversation`] never performs I/O. Every handler mutates the transcript and state, then
//! returns the [`Effect`]s the session runtime must carry out (calls, timers, watcher control).
//! Outcomes of those effects come back through [`Conversation::on_timer`] and
//! [`Conversation::on_outcome`].

use std::collections::HashSet;

use shora_core::{
    ConversationState, InteractionMode, Message, MessageId, MessageKind, Transcript, UserProfile,
    Verdict,
};
use shora_gateway::{
    BotReplyRequest, GatewayError, IncidentReport, ProfileUpsert, Registration, Reminder,
};
use tracing::{debug, info, warn};

use crate::catalog::{self, Picker, RandomPicker};
use crate::config::Timings;
use crate::effect::{BackendCall, Effect, Outcome, Timer};
use crate::keywords;

pub struct Conversation {
    state: ConversationState,
    profile: UserProfile,
    transcript: Transcript,
    points: u32,
    timings: Timings,
    picker: Box<dyn Picker>,
    /// Onboarding prompt whose buttons are live (mode or language prompt).
    active_prompt: Option<MessageId>,
    /// Most recent quiz not answered yet.
    open_quiz: Option<MessageId>,
    registering: bool,
    profession_asked: bool,
    incidents_in_flight: usize,
    /// Server ids of every reminder shown during this session; survives reset.
    delivered_reminders: HashSet<String>,
    clear_scheduled: bool,
    epoch: u64,
}

impl Conversation {
    pub fn new(timings: Timings) -> Self {
        Self::with_picker(timings, Box::new(RandomPicker))
    }

    pub fn with_picker(timings: Timings, picker: Box<dyn Picker>) -> Self {
        Self {
            state: ConversationState::Welcome,
            profile: UserProfile::default(),
            transcript: Transcript::new(),
            points: 0,
            timings,
            picker,
            active_prompt: None,
            open_quiz: None,
            registering: false,
            profession_asked: false,
            incidents_in_flight: 0,
            delivered_reminders: HashSet::new(),
            clear_scheduled: false,
            epoch: 0,
        }
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn points(&self) -> u32 {
        self.points
    }

    /// Bumped on every reset; timers and calls started in an older epoch are stale.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Whether the buttons of `message_id` accept taps right now.
    pub fn is_actionable(&self, message_id: &MessageId) -> bool {
        self.active_prompt.as_ref() == Some(message_id) || self.open_quiz.as_ref() == Some(message_id)
    }

    /// Starts a fresh conversation: the greeting follows after the welcome delay.
    pub fn open(&mut self) -> Vec<Effect> {
        if self.state != ConversationState::Welcome || !self.transcript.is_empty() {
            debug!(state = %self.state, "open ignored, conversation already started");
            return Vec::new();
        }
        vec![Effect::schedule(self.timings.welcome, Timer::Welcome)]
    }

    /// Free-text input. Blank input is ignored.
    pub fn submit_text(&mut self, text: &str) -> Vec<Effect> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }
        match self.state {
            ConversationState::Welcome => {
                debug!("input before the greeting ignored");
                Vec::new()
            }
            ConversationState::AskName => self.on_name(text),
            ConversationState::ChooseMode => self.on_mode_text(text),
            ConversationState::AskProfession => self.on_profession(text),
            ConversationState::AskSiteType => self.on_site_type(text),
            ConversationState::AskLanguage => {
                self.transcript.push(Message::user(text));
                self.complete_profile(text.to_string())
            }
            ConversationState::Active | ConversationState::ReportingIncident => self.on_chat(text),
            ConversationState::Ended => {
                self.transcript.push(Message::user(text));
                self.transcript.push(Message::bot(
                    "ended",
                    MessageKind::Text,
                    catalog::CONVERSATION_OVER,
                ));
                Vec::new()
            }
        }
    }

    /// Tap on `value` of the button row attached to `message_id`. Taps on rows that are not live are ignored.
    pub fn tap_button(&mut self, message_id: &MessageId, value: &str) -> Vec<Effect> {
        if self.active_prompt.as_ref() == Some(message_id) {
            match self.state {
                ConversationState::ChooseMode => {
                    if let Some(mode) = InteractionMode::from_value(value) {
                        return self.choose_mode(mode);
                    }
                }
                ConversationState::AskLanguage => {
                    if let Some((code, label, emoji)) =
                        catalog::LANGUAGES.iter().find(|(code, _, _)| *code == value)
                    {
                        self.transcript.push(Message::user(format!("{} {}", emoji, label)));
                        return self.complete_profile(code.to_string());
                    }
                }
                _ => {}
            }
        }
        if self.open_quiz.as_ref() == Some(message_id) {
            if let Some(verdict) = Verdict::from_value(value) {
                return self.answer_quiz(message_id, value, verdict);
            }
        }
        debug!(message_id = %message_id, value, state = %self.state, "tap on inactive button ignored");
        Vec::new()
    }

    /// Notice shown when the microphone is used. Nothing is recorded.
    pub fn microphone(&self) -> &'static str {
        match self.profile.mode {
            Some(InteractionMode::Audio) => catalog::MIC_UNAVAILABLE,
            _ => catalog::MIC_NEEDS_AUDIO_MODE,
        }
    }

    pub fn on_timer(&mut self, timer: Timer) -> Vec<Effect> {
        debug!(?timer, state = %self.state, "timer fired");
        match timer {
            Timer::Welcome if self.state == ConversationState::Welcome => {
                self.transcript
                    .push(Message::bot("welcome", MessageKind::Text, catalog::WELCOME));
                self.state = ConversationState::AskName;
                info!("step: greeting shown, asking name");
            }
            Timer::ProfessionQuestion
                if self.state == ConversationState::AskProfession && !self.profession_asked =>
            {
                self.profession_asked = true;
                self.transcript.push(Message::bot(
                    "profession",
                    MessageKind::Text,
                    catalog::PROFESSION_QUESTION,
                ));
            }
            Timer::Quiz if self.state.is_chatting() => self.push_quiz(),
            Timer::DailyTip if self.state.is_chatting() => {
                let tip = catalog::DAILY_TIPS[self.picker.pick(catalog::DAILY_TIPS.len())];
                self.transcript.push(Message::bot("tip", MessageKind::Text, tip));
                info!("step: daily tip shown");
            }
            Timer::EndingReminder if self.state.is_chatting() => return self.end(),
            Timer::ResetAfterReminder if self.clear_scheduled => return self.clear(),
            _ => debug!(?timer, state = %self.state, "stale timer ignored"),
        }
        Vec::new()
    }

    pub fn on_outcome(&mut self, outcome: Outcome) -> Vec<Effect> {
        match outcome {
            Outcome::Registered(result) => self.on_registered(result),
            Outcome::ProfileSynced(Ok(())) => {
                debug!("profile persisted");
                Vec::new()
            }
            Outcome::ProfileSynced(Err(e)) => {
                warn!(error = %e, "profile persistence failed");
                Vec::new()
            }
            Outcome::BotReplied { placeholder, result } => self.on_bot_reply(&placeholder, result),
            Outcome::IncidentFiled(result) => self.on_incident_filed(result),
            Outcome::RemindersFetched(result) => self.on_reminders(result),
            Outcome::ReminderAcknowledged {
                reminder_id,
                result,
            } => {
                if let Err(e) = result {
                    warn!(reminder_id = %reminder_id, error = %e, "mark-sent failed");
                }
                Vec::new()
            }
        }
    }

    /// Manual reset. A named user in free chat sees the ending reminder again before the conversation is cleared.
    pub fn reset(&mut self) -> Vec<Effect> {
        info!(state = %self.state, "step: reset requested");
        self.epoch += 1;
        // aborted calls never resolve their placeholder
        for id in self.transcript.pending_ids() {
            self.transcript.resolve(&id, catalog::NO_ANSWER);
        }
        let mut effects = vec![Effect::CancelPending, Effect::StopReminderWatch];
        let replay = self.profile.display_name().is_some()
            && (self.state.is_chatting() || self.state == ConversationState::Ended);
        if replay && !self.clear_scheduled {
            self.push_ending_reminder();
            self.state = ConversationState::Ended;
            self.clear_scheduled = true;
            effects.push(Effect::schedule(
                self.timings.reset_replay,
                Timer::ResetAfterReminder,
            ));
        } else {
            effects.extend(self.clear());
        }
        effects
    }

    fn on_name(&mut self, name: &str) -> Vec<Effect> {
        self.transcript.push(Message::user(name));
        if self.registering {
            debug!("registration already in flight, input not re-sent");
            return Vec::new();
        }
        self.profile.name = Some(name.to_string());
        self.registering = true;
        info!(name, "step: name received, registering");
        vec![Effect::Call(BackendCall::RegisterName(
            ProfileUpsert::name_only(name),
        ))]
    }

    fn on_registered(&mut self, result: Result<Registration, GatewayError>) -> Vec<Effect> {
        if self.state != ConversationState::AskName || !self.registering {
            debug!(state = %self.state, "registration outcome ignored");
            return Vec::new();
        }
        self.registering = false;
        let name = self.profile.display_name().unwrap_or_default().to_string();
        let greeting = match result {
            Ok(registration) => {
                let text = if registration.newly_created {
                    catalog::greeting_new(&name)
                } else {
                    catalog::greeting_returning(&name)
                };
                self.profile.remote_user_id = registration.user_id;
                self.profile.newly_created = Some(registration.newly_created);
                text
            }
            Err(e) => {
                warn!(error = %e, "registration failed, continuing without remote profile");
                catalog::greeting_offline(&name)
            }
        };
        let prompt =
            Message::bot("mode", MessageKind::Button, greeting).with_buttons(catalog::mode_buttons());
        self.active_prompt = Some(prompt.id.clone());
        self.transcript.push(prompt);
        self.state = ConversationState::ChooseMode;
        info!(newly_created = ?self.profile.newly_created, "step: asking interaction mode");
        Vec::new()
    }

    fn on_mode_text(&mut self, text: &str) -> Vec<Effect> {
        match text.to_lowercase().as_str() {
            "texte" | "text" => self.choose_mode(InteractionMode::Text),
            "audio" => self.choose_mode(InteractionMode::Audio),
            _ => {
                self.transcript.push(Message::user(text));
                self.transcript
                    .push(Message::bot("mode-nudge", MessageKind::Text, catalog::MODE_NUDGE));
                Vec::new()
            }
        }
    }

    fn choose_mode(&mut self, mode: InteractionMode) -> Vec<Effect> {
        self.active_prompt = None;
        self.profile.mode = Some(mode);
        let (caption, label) = match mode {
            InteractionMode::Text => ("🔤 Texte", "texte"),
            InteractionMode::Audio => ("🎧 Audio", "audio"),
        };
        self.transcript.push(Message::user(caption));
        self.transcript.push(Message::bot(
            "mode-confirm",
            MessageKind::Text,
            catalog::mode_confirmation(label),
        ));
        self.state = ConversationState::AskProfession;
        self.profession_asked = false;
        info!(mode = mode.as_str(), "step: mode chosen");
        vec![Effect::schedule(
            self.timings.profession_question,
            Timer::ProfessionQuestion,
        )]
    }

    fn on_profession(&mut self, profession: &str) -> Vec<Effect> {
        self.transcript.push(Message::user(profession));
        self.profile.profession = Some(profession.to_string());
        self.profession_asked = true;
        self.transcript.push(Message::bot(
            "site-type",
            MessageKind::Text,
            catalog::SITE_TYPE_QUESTION,
        ));
        self.state = ConversationState::AskSiteType;
        Vec::new()
    }

    fn on_site_type(&mut self, site_type: &str) -> Vec<Effect> {
        self.transcript.push(Message::user(site_type));
        self.profile.site_type = Some(site_type.to_string());
        let prompt = Message::bot("language", MessageKind::Button, catalog::LANGUAGE_QUESTION)
            .with_buttons(catalog::language_buttons());
        self.active_prompt = Some(prompt.id.clone());
        self.transcript.push(prompt);
        self.state = ConversationState::AskLanguage;
        Vec::new()
    }

    fn complete_profile(&mut self, language: String) -> Vec<Effect> {
        self.active_prompt = None;
        let summary = catalog::completion_summary(
            self.profile.profession.as_deref().unwrap_or_default(),
            self.profile.site_type.as_deref().unwrap_or_default(),
            catalog::language_label(&language),
        );
        self.profile.language = Some(language);
        self.profile.complete = true;
        self.transcript
            .push(Message::bot("profile", MessageKind::Text, summary));
        self.state = ConversationState::Active;
        info!("step: onboarding complete");

        let mut effects = Vec::new();
        if let Some(upsert) = ProfileUpsert::from_profile(&self.profile) {
            effects.push(Effect::Call(BackendCall::SyncProfile(upsert)));
        }
        effects.push(Effect::schedule(
            self.timings.quiz_after_profile,
            Timer::Quiz,
        ));
        if let Some(name) = self.profile.display_name() {
            effects.push(Effect::StartReminderWatch {
                user_name: name.to_string(),
            });
        }
        effects.push(Effect::CheckDailyTip);
        effects
    }

    fn on_chat(&mut self, text: &str) -> Vec<Effect> {
        self.transcript.push(Message::user(text));
        if keywords::is_incident_report(text) {
            return self.report_incident(text);
        }

        let placeholder = Message::pending();
        let placeholder_id = placeholder.id.clone();
        self.transcript.push(placeholder);
        let request = BotReplyRequest {
            text: text.to_string(),
            profile: self.profile.clone(),
            state: self.state,
        };
        let mut effects = vec![Effect::Call(BackendCall::BotReply {
            placeholder: placeholder_id,
            request,
        })];
        if keywords::is_farewell(text) {
            info!("step: farewell detected, ending reminder scheduled");
            effects.push(Effect::schedule(
                self.timings.ending_reminder,
                Timer::EndingReminder,
            ));
        }
        effects
    }

    fn report_incident(&mut self, description: &str) -> Vec<Effect> {
        self.transcript.push(Message::bot(
            "incident",
            MessageKind::Incident,
            catalog::INCIDENT_ACK,
        ));
        self.state = ConversationState::ReportingIncident;
        self.incidents_in_flight += 1;
        info!(in_flight = self.incidents_in_flight, "step: incident detected, reporting");
        vec![Effect::Call(BackendCall::ReportIncident(
            IncidentReport::from_chat(description, &self.profile),
        ))]
    }

    fn on_incident_filed(&mut self, result: Result<(), GatewayError>) -> Vec<Effect> {
        if self.incidents_in_flight == 0 {
            debug!("incident outcome without report in flight ignored");
            return Vec::new();
        }
        self.incidents_in_flight -= 1;
        let text = match result {
            Ok(()) => {
                info!("step: incident filed");
                catalog::INCIDENT_FILED
            }
            Err(e) => {
                warn!(error = %e, "incident report failed");
                catalog::INCIDENT_FALLBACK
            }
        };
        self.transcript
            .push(Message::bot("incident-result", MessageKind::Text, text));
        if self.incidents_in_flight == 0 && self.state == ConversationState::ReportingIncident {
            self.state = ConversationState::Active;
        }
        Vec::new()
    }

    fn on_bot_reply(
        &mut self,
        placeholder: &MessageId,
        result: Result<Option<String>, GatewayError>,
    ) -> Vec<Effect> {
        let (text, invites_quiz) = match result {
            Ok(Some(reply)) => {
                let invites = keywords::reply_invites_quiz(&reply);
                (reply, invites)
            }
            Ok(None) => (catalog::NO_ANSWER.to_string(), false),
            Err(GatewayError::Malformed(e)) => {
                warn!(error = %e, "bot reply payload unreadable");
                (catalog::NO_ANSWER.to_string(), false)
            }
            Err(e) => {
                warn!(error = %e, "bot reply failed");
                (catalog::REPLY_FAILED.to_string(), false)
            }
        };
        if !self.transcript.resolve(placeholder, text) {
            debug!(placeholder = %placeholder, "reply for unknown placeholder dropped");
            return Vec::new();
        }
        if invites_quiz && self.state.is_chatting() {
            return vec![Effect::schedule(self.timings.quiz_after_reply, Timer::Quiz)];
        }
        Vec::new()
    }

    fn on_reminders(&mut self, result: Result<Vec<Reminder>, GatewayError>) -> Vec<Effect> {
        let reminders = match result {
            Ok(reminders) => reminders,
            Err(e) => {
                warn!(error = %e, "reminder poll failed, retrying on next tick");
                return Vec::new();
            }
        };
        if !self.state.is_chatting() {
            debug!(state = %self.state, "reminders ignored outside free chat");
            return Vec::new();
        }

        let mut effects = Vec::new();
        for reminder in reminders {
            let id = MessageId::for_reminder(&reminder.id);
            if self.delivered_reminders.contains(&reminder.id) || self.transcript.contains(&id) {
                continue;
            }
            let mut message = Message::bot("reminder", MessageKind::Reminder, reminder.message)
                .with_id(id)
                .with_image(reminder.image_url);
            if let Some(created_at) = reminder.created_at {
                message = message.with_created_at(created_at);
            }
            self.transcript.push(message);
            self.delivered_reminders.insert(reminder.id.clone());
            effects.push(Effect::Call(BackendCall::MarkReminderSent {
                reminder_id: reminder.id,
            }));
        }
        if !effects.is_empty() {
            info!(count = effects.len(), "step: reminders delivered");
        }
        effects
    }

    fn push_quiz(&mut self) {
        let quizzes = catalog::quizzes();
        let item = &quizzes[self.picker.pick(quizzes.len())];
        let message = Message::bot("quiz", MessageKind::Quiz, item.question)
            .with_buttons(item.buttons());
        self.open_quiz = Some(message.id.clone());
        self.transcript.push(message);
        info!(question = item.question, "step: quiz shown");
    }

    fn answer_quiz(&mut self, quiz_id: &MessageId, value: &str, verdict: Verdict) -> Vec<Effect> {
        self.open_quiz = None;
        let caption = self
            .transcript
            .get(quiz_id)
            .and_then(|m| m.buttons.iter().find(|b| b.value == value))
            .map(|b| b.caption())
            .unwrap_or_else(|| value.to_string());
        self.transcript.push(Message::user(caption));
        let feedback = match verdict {
            Verdict::Correct => {
                self.points += catalog::QUIZ_POINTS;
                catalog::quiz_correct(self.points)
            }
            Verdict::Incorrect => catalog::QUIZ_WRONG.to_string(),
        };
        self.transcript
            .push(Message::bot("quiz-result", MessageKind::Text, feedback));
        info!(verdict = verdict.as_str(), points = self.points, "step: quiz answered");
        Vec::new()
    }

    fn end(&mut self) -> Vec<Effect> {
        self.push_ending_reminder();
        self.state = ConversationState::Ended;
        self.open_quiz = None;
        info!("step: conversation ended");
        vec![Effect::StopReminderWatch]
    }

    fn push_ending_reminder(&mut self) {
        let name = self.profile.display_name().unwrap_or_default().to_string();
        self.transcript.push(Message::bot(
            "ending",
            MessageKind::Text,
            catalog::ending_reminder(&name),
        ));
    }

    fn clear(&mut self) -> Vec<Effect> {
        self.epoch += 1;
        self.transcript.clear();
        self.state = ConversationState::Welcome;
        self.profile = UserProfile::default();
        self.points = 0;
        self.active_prompt = None;
        self.open_quiz = None;
        self.registering = false;
        self.profession_asked = false;
        self.incidents_in_flight = 0;
        self.clear_scheduled = false;
        info!(epoch = self.epoch, "step: conversation cleared");
        vec![Effect::schedule(self.timings.welcome, Timer::Welcome)]
    }
}
