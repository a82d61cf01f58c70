//! Session state machine using rust-fsm.
//!
//! An explicit finite state machine for the session lifecycle, replacing
//! implicit state derivation from storage checks.
//!
//! ## State Diagram
//!
//! ```text
//! ┌─────────────────┐
//! │    Anonymous    │ (initial)
//! └────────┬────────┘
//!          │ AuthenticationStarted (login or bootstrap validation)
//!          ▼
//! ┌─────────────────┐
//! │  Authenticating │──── AuthenticationFailed ──► Anonymous
//! └────────┬────────┘
//!          │ AuthenticationSucceeded        TokenRejected
//!          ▼                                      │
//! ┌─────────────────┐                             ▼
//! │  Authenticated  │◄── RefreshSucceeded ┌─────────────────┐
//! └────────┬────────┘                     │     Expired     │
//!          │ RefreshStarted               └────────┬────────┘
//!          ▼                                       │ RefreshStarted
//! ┌─────────────────┐◄──────────────────----──────┘
//! │   Refreshing    │──── RefreshFailed ──► Anonymous
//! └─────────────────┘
//!
//! LoggedOut returns to Anonymous from any settled or refreshing state.
//! ```

use rust_fsm::*;
use serde::{Deserialize, Serialize};

// Define the FSM using rust-fsm's declarative macro.
// This generates a module `session_machine` with:
// - session_machine::State (enum)
// - session_machine::Input (enum)
// - session_machine::StateMachine (type alias)
// - session_machine::Impl (trait impl)
state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub session_machine(Anonymous)

    Anonymous => {
        AuthenticationStarted => Authenticating
    },
    Authenticating => {
        AuthenticationSucceeded => Authenticated,
        AuthenticationFailed => Anonymous,
        // Persisted token rejected during bootstrap validation
        TokenRejected => Expired
    },
    Authenticated => {
        RefreshStarted => Refreshing,
        TokenRejected => Expired,
        LoggedOut => Anonymous
    },
    Expired => {
        RefreshStarted => Refreshing,
        LoggedOut => Anonymous
    },
    Refreshing => {
        RefreshSucceeded => Authenticated,
        RefreshFailed => Anonymous,
        LoggedOut => Anonymous
    }
}

// Re-export the generated types with clearer names
pub use session_machine::Input as AuthMachineInput;
pub use session_machine::State as AuthMachineState;
pub use session_machine::StateMachine as AuthMachine;

/// User-facing session state for status reporting.
///
/// This is a simplified view of the FSM state for the shell and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    /// No session.
    Anonymous,
    /// Login or bootstrap validation in progress.
    Authenticating,
    /// Valid session.
    Authenticated,
    /// Token known rejected; recovery refresh not yet resolved.
    Expired,
    /// Token refresh in progress.
    Refreshing,
}

impl AuthState {
    /// Returns true if the session holds a settled, valid state.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated)
    }

    /// Returns true if the state is a transient/in-progress state.
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthState::Authenticating | AuthState::Refreshing)
    }
}

impl From<&AuthMachineState> for AuthState {
    fn from(state: &AuthMachineState) -> Self {
        match state {
            AuthMachineState::Anonymous => AuthState::Anonymous,
            AuthMachineState::Authenticating => AuthState::Authenticating,
            AuthMachineState::Authenticated => AuthState::Authenticated,
            AuthMachineState::Expired => AuthState::Expired,
            AuthMachineState::Refreshing => AuthState::Refreshing,
        }
    }
}
