//! Session management for the MAAS console.
//!
//! This crate provides:
//! - Login, registration, and logout against the platform auth endpoints
//! - Token persistence through the console storage layer
//! - A single shared refresh primitive with session-epoch race protection
//! - Proactive token refresh tied to the authenticated lifetime
//! - Explicit FSM-based session state management

mod auth_fsm;
mod error;
mod scheduler;
mod session;

pub use auth_fsm::session_machine;
pub use auth_fsm::{AuthMachine, AuthMachineInput, AuthMachineState, AuthState};
pub use error::{AuthError, AuthResult};
pub use scheduler::{RefreshScheduler, REFRESH_INTERVAL};
pub use session::{RegisterRequest, RegisterResponse, SessionManager};
