//! What the state machine asks the session runtime to do, and what comes back.

use shora_core::MessageId;
use shora_gateway::{
    BotReplyRequest, GatewayError, IncidentReport, ProfileUpsert, Registration, Reminder,
};
use std::time::Duration;

/// Instruction returned by [`Conversation`](crate::Conversation) handlers, executed in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Call(BackendCall),
    Schedule { after: Duration, timer: Timer },
    StartReminderWatch { user_name: String },
    StopReminderWatch,
    /// Consult the daily-tip ledger; schedule [`Timer::DailyTip`] if no tip was shown today.
    CheckDailyTip,
    /// Abort every outstanding timer and call.
    CancelPending,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    RegisterName(ProfileUpsert),
    SyncProfile(ProfileUpsert),
    BotReply {
        placeholder: MessageId,
        request: BotReplyRequest,
    },
    ReportIncident(IncidentReport),
    MarkReminderSent { reminder_id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    Welcome,
    ProfessionQuestion,
    Quiz,
    EndingReminder,
    DailyTip,
    ResetAfterReminder,
}

/// A settled backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Registered(Result<Registration, GatewayError>),
    ProfileSynced(Result<(), GatewayError>),
    BotReplied {
        placeholder: MessageId,
        result: Result<Option<String>, GatewayError>,
    },
    IncidentFiled(Result<(), GatewayError>),
    RemindersFetched(Result<Vec<Reminder>, GatewayError>),
    ReminderAcknowledged {
        reminder_id: String,
        result: Result<(), GatewayError>,
    },
}

/// Event delivered back to the session loop, tagged with the conversation epoch it was started in.
#[derive(Debug)]
pub(crate) enum SessionEvent {
    Timer { epoch: u64, timer: Timer },
    Outcome { epoch: u64, outcome: Outcome },
}

impl Effect {
    pub fn schedule(after: Duration, timer: Timer) -> Self {
        Effect::Schedule { after, timer }
    }
}
