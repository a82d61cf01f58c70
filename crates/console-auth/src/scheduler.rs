//! Proactive token refresh.
//!
//! A cancellable background task tied to the session's authenticated
//! lifetime: armed after a successful login or bootstrap, disarmed on
//! logout, and self-terminating once the session stops being authenticated.

use crate::SessionManager;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Refresh period. Must stay strictly shorter than the server's access-token
/// lifetime (~15 minutes); the margin absorbs clock skew and tick jitter.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Schedules proactive access-token refreshes for an authenticated session.
pub struct RefreshScheduler {
    session: Arc<SessionManager>,
    period: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl RefreshScheduler {
    /// Create a scheduler with the default refresh period.
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self::with_period(session, REFRESH_INTERVAL)
    }

    /// Create a scheduler with a custom refresh period.
    pub fn with_period(session: Arc<SessionManager>, period: Duration) -> Self {
        Self {
            session,
            period,
            task: Mutex::new(None),
        }
    }

    /// Arm the scheduler. Replaces any previously armed task, so at most one
    /// refresh task exists per scheduler no matter how often this is called.
    pub fn arm(&self) {
        let mut task = self.task.lock().unwrap();
        if let Some(previous) = task.take() {
            previous.abort();
        }

        let session = self.session.clone();
        let period = self.period;

        *task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately; the token was minted just
            // now, so skip it.
            ticker.tick().await;

            loop {
                ticker.tick().await;

                if !session.is_authenticated() {
                    debug!("Session no longer authenticated, stopping proactive refresh");
                    break;
                }

                if !session.refresh_access_token().await {
                    warn!("Proactive refresh failed, stopping");
                    break;
                }

                debug!("Proactive refresh complete");
            }
        }));
    }

    /// Disarm the scheduler, cancelling the refresh task if one is running.
    pub fn disarm(&self) {
        let mut task = self.task.lock().unwrap();
        if let Some(handle) = task.take() {
            handle.abort();
            debug!("Proactive refresh disarmed");
        }
    }

    /// Whether a refresh task is currently armed and running.
    pub fn is_armed(&self) -> bool {
        self.task
            .lock()
            .unwrap()
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}
