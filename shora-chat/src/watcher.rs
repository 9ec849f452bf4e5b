//! Reminder polling task. Aborted when dropped.

use std::sync::Arc;
use std::time::Duration;

use shora_gateway::BackendGateway;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::effect::{Outcome, SessionEvent};

const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

pub(crate) struct ReminderWatcher {
    user_name: String,
    handle: JoinHandle<()>,
}

impl ReminderWatcher {
    /// Polls immediately, then every `period`, until dropped or the session stops listening.
    pub(crate) fn spawn(
        gateway: Arc<dyn BackendGateway>,
        user_name: String,
        period: Duration,
        epoch: u64,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        let period = period.max(MIN_POLL_INTERVAL);
        info!(user_name = %user_name, period_secs = period.as_secs(), "step: reminder watcher started");
        let name = user_name.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let result = gateway.pending_reminders(&name).await;
                let outcome = Outcome::RemindersFetched(result);
                if events.send(SessionEvent::Outcome { epoch, outcome }).is_err() {
                    debug!("session gone, reminder watcher exiting");
                    break;
                }
            }
        });
        Self { user_name, handle }
    }
}

impl Drop for ReminderWatcher {
    fn drop(&mut self) {
        self.handle.abort();
        debug!(user_name = %self.user_name, "reminder watcher stopped");
    }
}
