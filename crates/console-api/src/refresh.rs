//! Single-flight token refresh coordination.
//!
//! Several concurrent requests can discover an expired token at the same
//! moment (a dashboard firing parallel queries); exactly one refresh call
//! may be issued for that expiry event. The coordinator is an explicit state
//! object owned by the client: the first caller to find it idle performs the
//! refresh, everyone else parks on a oneshot waiter and is woken with the
//! outcome.

use console_auth::SessionManager;
use std::sync::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

enum RefreshState {
    Idle,
    InFlight {
        waiters: Vec<oneshot::Sender<Option<String>>>,
    },
}

/// Coordinates concurrent 401 recoveries onto a single refresh call.
pub(crate) struct RefreshCoordinator {
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(RefreshState::Idle),
        }
    }

    /// Whether a refresh is currently in flight.
    pub(crate) fn is_in_flight(&self) -> bool {
        matches!(&*self.state.lock().unwrap(), RefreshState::InFlight { .. })
    }

    /// Recover from an authentication failure.
    ///
    /// Returns the fresh access token when the session was refreshed, or
    /// `None` when the refresh failed (the session has been reset by then).
    pub(crate) async fn recover(&self, session: &SessionManager) -> Option<String> {
        // The flag must flip to in-flight before any network I/O so a caller
        // arriving between "check" and "refresh" cannot start a second one.
        let waiter = {
            let mut state = self.state.lock().unwrap();
            match &mut *state {
                RefreshState::InFlight { waiters } => {
                    let (tx, rx) = oneshot::channel();
                    waiters.push(tx);
                    Some(rx)
                }
                RefreshState::Idle => {
                    *state = RefreshState::InFlight {
                        waiters: Vec::new(),
                    };
                    None
                }
            }
        };

        if let Some(rx) = waiter {
            debug!("Refresh already in flight, waiting for it to resolve");
            return rx.await.ok().flatten();
        }

        let token = if session.refresh_access_token().await {
            session.access_token()
        } else {
            None
        };

        // Notify every parked waiter and go idle in one critical section, so
        // no waiter enqueued before the reset can miss its wake-up.
        let mut state = self.state.lock().unwrap();
        if let RefreshState::InFlight { waiters } =
            std::mem::replace(&mut *state, RefreshState::Idle)
        {
            debug!(waiters = waiters.len(), "Refresh resolved, waking waiters");
            for waiter in waiters {
                let _ = waiter.send(token.clone());
            }
        }

        token
    }
}
