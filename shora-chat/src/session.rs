//! Session runtime: owns one [`Conversation`] in a tokio task and carries out its effects.
//!
//! Input arrives on an mpsc command channel ([`SessionHandle`]); timers and backend calls run in
//! a [`JoinSet`] and report back on an internal channel, tagged with the conversation epoch so
//! that anything started before a reset is dropped. Every state change publishes a [`Snapshot`]
//! on a watch channel. Closing the handle (or dropping the session) aborts all outstanding work.

use std::sync::Arc;
use std::time::Duration;

use shora_core::{MessageId, Result, ShoraError};
use shora_gateway::BackendGateway;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{debug, error, info, instrument, warn};

use crate::config::ChatConfig;
use crate::conversation::Conversation;
use crate::effect::{BackendCall, Effect, Outcome, SessionEvent, Timer};
use crate::ledger::TipLedger;
use crate::render::{snapshot, Snapshot};
use crate::watcher::ReminderWatcher;

#[derive(Debug)]
enum Command {
    SubmitText(String),
    TapButton { message_id: MessageId, value: String },
    Reset,
    Microphone(oneshot::Sender<&'static str>),
    Close,
}

/// Front-end side of a running session.
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<Snapshot>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| ShoraError::SessionClosed)
    }

    pub fn submit_text(&self, text: impl Into<String>) -> Result<()> {
        self.send(Command::SubmitText(text.into()))
    }

    pub fn tap_button(&self, message_id: MessageId, value: impl Into<String>) -> Result<()> {
        self.send(Command::TapButton {
            message_id,
            value: value.into(),
        })
    }

    pub fn reset(&self) -> Result<()> {
        self.send(Command::Reset)
    }

    /// Notice for a microphone press in the current mode.
    pub async fn microphone(&self) -> Result<&'static str> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Microphone(tx))?;
        rx.await.map_err(|_| ShoraError::SessionClosed)
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    /// Waits until a published snapshot satisfies `predicate`.
    pub async fn wait_for(&self, predicate: impl FnMut(&Snapshot) -> bool) -> Result<Snapshot> {
        let mut rx = self.snapshots.clone();
        let snapshot = rx
            .wait_for(predicate)
            .await
            .map_err(|_| ShoraError::SessionClosed)?;
        Ok(snapshot.clone())
    }

    /// Stops the session and waits until every timer, call and the watcher are gone.
    pub async fn close(self) {
        let _ = self.commands.send(Command::Close);
        if let Err(e) = self.task.await {
            warn!(error = %e, "chat session task ended abnormally");
        }
    }
}

pub struct ChatSession {
    conversation: Conversation,
    gateway: Arc<dyn BackendGateway>,
    ledger: Arc<dyn TipLedger>,
    config: ChatConfig,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    /// Timers and calls; aborted on reset.
    tasks: JoinSet<()>,
    /// Incident reports; survive reset so a report is never lost, aborted on close.
    reports: JoinSet<()>,
    watcher: Option<ReminderWatcher>,
    snapshots: watch::Sender<Snapshot>,
}

impl ChatSession {
    /// Starts the session task and opens the conversation.
    pub fn spawn(
        conversation: Conversation,
        gateway: Arc<dyn BackendGateway>,
        ledger: Arc<dyn TipLedger>,
        config: ChatConfig,
    ) -> SessionHandle {
        let (snapshots, snapshot_rx) = watch::channel(snapshot(&conversation));
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let session = Self {
            conversation,
            gateway,
            ledger,
            config,
            events_tx,
            events_rx,
            tasks: JoinSet::new(),
            reports: JoinSet::new(),
            watcher: None,
            snapshots,
        };
        let task = tokio::spawn(session.run(command_rx));
        SessionHandle {
            commands,
            snapshots: snapshot_rx,
            task,
        }
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        info!("step: chat session started");
        let effects = self.conversation.open();
        self.apply(effects);
        self.publish();

        loop {
            tokio::select! {
                maybe_command = commands.recv() => {
                    let command = match maybe_command {
                        Some(Command::Close) | None => break,
                        Some(command) => command,
                    };
                    let effects = self.handle_command(command);
                    self.apply(effects);
                }
                Some(event) = self.events_rx.recv() => {
                    let effects = self.handle_event(event);
                    self.apply(effects);
                }
                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    log_join(joined);
                }
                Some(joined) = self.reports.join_next(), if !self.reports.is_empty() => {
                    log_join(joined);
                }
            }
            self.publish();
        }

        self.shutdown().await;
    }

    #[instrument(skip(self, command), fields(state = %self.conversation.state()))]
    fn handle_command(&mut self, command: Command) -> Vec<Effect> {
        match command {
            Command::SubmitText(text) => self.conversation.submit_text(&text),
            Command::TapButton { message_id, value } => {
                self.conversation.tap_button(&message_id, &value)
            }
            Command::Reset => self.conversation.reset(),
            Command::Microphone(reply) => {
                let _ = reply.send(self.conversation.microphone());
                Vec::new()
            }
            Command::Close => Vec::new(),
        }
    }

    fn handle_event(&mut self, event: SessionEvent) -> Vec<Effect> {
        let current = self.conversation.epoch();
        match event {
            SessionEvent::Timer { epoch, timer } if epoch == current => {
                self.conversation.on_timer(timer)
            }
            SessionEvent::Outcome { epoch, outcome } if epoch == current => {
                self.conversation.on_outcome(outcome)
            }
            stale => {
                debug!(?stale, current, "event from a previous conversation dropped");
                Vec::new()
            }
        }
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Call(call) => self.spawn_call(call),
                Effect::Schedule { after, timer } => self.schedule(after, timer),
                Effect::StartReminderWatch { user_name } => {
                    self.watcher = Some(ReminderWatcher::spawn(
                        Arc::clone(&self.gateway),
                        user_name,
                        self.config.reminder_poll_interval,
                        self.conversation.epoch(),
                        self.events_tx.clone(),
                    ));
                }
                Effect::StopReminderWatch => {
                    self.watcher = None;
                }
                Effect::CheckDailyTip => self.check_daily_tip(),
                Effect::CancelPending => {
                    debug!(tasks = self.tasks.len(), "cancelling pending timers and calls");
                    self.tasks.abort_all();
                }
            }
        }
    }

    fn schedule(&mut self, after: Duration, timer: Timer) {
        let events = self.events_tx.clone();
        let epoch = self.conversation.epoch();
        self.tasks.spawn(async move {
            tokio::time::sleep(after).await;
            let _ = events.send(SessionEvent::Timer { epoch, timer });
        });
    }

    fn spawn_call(&mut self, call: BackendCall) {
        let gateway = Arc::clone(&self.gateway);
        let events = self.events_tx.clone();
        let epoch = self.conversation.epoch();
        let set = match call {
            BackendCall::ReportIncident(_) => &mut self.reports,
            _ => &mut self.tasks,
        };
        set.spawn(async move {
            let outcome = perform(gateway.as_ref(), call).await;
            let _ = events.send(SessionEvent::Outcome { epoch, outcome });
        });
    }

    fn check_daily_tip(&mut self) {
        let today = chrono::Local::now().date_naive();
        match self.ledger.claim(today) {
            Ok(true) => self.schedule(self.config.timings.daily_tip, Timer::DailyTip),
            Ok(false) => {}
            Err(e) => warn!(error = %e, "tip ledger unavailable, skipping daily tip"),
        }
    }

    fn publish(&self) {
        let next = snapshot(&self.conversation);
        self.snapshots.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    async fn shutdown(mut self) {
        self.watcher = None;
        self.tasks.shutdown().await;
        self.reports.shutdown().await;
        info!("step: chat session closed");
    }
}

async fn perform(gateway: &dyn BackendGateway, call: BackendCall) -> Outcome {
    match call {
        BackendCall::RegisterName(profile) => {
            Outcome::Registered(gateway.register_profile(&profile).await)
        }
        BackendCall::SyncProfile(profile) => {
            Outcome::ProfileSynced(gateway.register_profile(&profile).await.map(|_| ()))
        }
        BackendCall::BotReply {
            placeholder,
            request,
        } => Outcome::BotReplied {
            placeholder,
            result: gateway.bot_reply(&request).await,
        },
        BackendCall::ReportIncident(report) => {
            Outcome::IncidentFiled(gateway.report_incident(&report).await)
        }
        BackendCall::MarkReminderSent { reminder_id } => {
            let result = gateway.mark_reminder_sent(&reminder_id).await;
            Outcome::ReminderAcknowledged {
                reminder_id,
                result,
            }
        }
    }
}

fn log_join(joined: std::result::Result<(), JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            error!(error = %e, "session task panicked");
        }
    }
}
