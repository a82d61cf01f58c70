//! Session manager with FSM-based state tracking.
//!
//! The FSM tracks transient states (authenticating, refreshing) that are
//! never persisted, while the session data itself (tokens, profile) lives in
//! a [`SessionStore`] and is written back on every mutation. The manager is
//! explicitly constructed and shared behind an `Arc`; the HTTP layer reads
//! the current access token through it instead of holding its own copy.

use crate::auth_fsm::{AuthMachine, AuthMachineInput, AuthState};
use crate::{AuthError, AuthResult};
use console_storage::{SessionRecord, SessionStore, UserProfile};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Fixed timeout applied to every auth endpoint call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Login request body.
#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Login response payload.
#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: UserProfile,
}

/// Token refresh request body.
#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Token refresh response payload. Only the access token is replaced.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    expires_in: i64,
}

/// Registration request. Registration does not authenticate the user; a
/// successful registration routes back to login.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_name: Option<String>,
}

impl RegisterRequest {
    /// Validate the request before it is allowed anywhere near the network.
    pub fn validate(&self) -> AuthResult<()> {
        if self.email.trim().is_empty() {
            return Err(AuthError::Validation("Email is required".to_string()));
        }
        if !self.email.contains('@') {
            return Err(AuthError::Validation("Email is invalid".to_string()));
        }
        if self.full_name.trim().is_empty() {
            return Err(AuthError::Validation("Full name is required".to_string()));
        }
        if self.password.is_empty() {
            return Err(AuthError::Validation("Password is required".to_string()));
        }
        if self.password.len() < 8 {
            return Err(AuthError::Validation(
                "Password must be at least 8 characters long".to_string(),
            ));
        }
        if !self.password.chars().any(|c| c.is_ascii_lowercase()) {
            return Err(AuthError::Validation(
                "Password must contain at least one lowercase letter".to_string(),
            ));
        }
        if !self.password.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(AuthError::Validation(
                "Password must contain at least one uppercase letter".to_string(),
            ));
        }
        if !self.password.chars().any(|c| c.is_ascii_digit()) {
            return Err(AuthError::Validation(
                "Password must contain at least one digit".to_string(),
            ));
        }
        if !self.password.chars().any(|c| "!@#$%^&*(),.?\":{}|<>".contains(c)) {
            return Err(AuthError::Validation(
                "Password must contain at least one special character".to_string(),
            ));
        }
        if self.password != self.confirm_password {
            return Err(AuthError::Validation("Passwords do not match".to_string()));
        }
        Ok(())
    }
}

/// Registration response payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    pub user_id: String,
    pub email: String,
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub message: String,
}

/// Extract the server-provided error message from a response body, falling
/// back to a generic message when the body has no usable `message` field.
fn server_message(body: &str, fallback: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| fallback.to_string())
}

/// Manager for the console's single authenticated session.
pub struct SessionManager {
    store: SessionStore,
    http_client: Client,
    api_url: String,
    /// Internal FSM for tracking session state transitions.
    fsm: Mutex<AuthMachine>,
    /// In-memory mirror of the persisted record.
    record: Mutex<SessionRecord>,
    /// Last credential-error message, for inline display on forms. Transient.
    last_error: Mutex<Option<String>>,
    /// Logical session generation. Advanced on logout and on a new login;
    /// a refresh whose epoch has moved on discards its result.
    epoch: AtomicU64,
}

impl SessionManager {
    /// Create a new session manager, hydrating from the store.
    pub fn new(store: SessionStore, api_url: &str) -> AuthResult<Self> {
        let mut record = store.load()?;
        if !record.is_empty() {
            debug!("Hydrated persisted session from storage");
        }
        // A record claiming authentication without a token cannot be trusted.
        if record.is_authenticated && record.access_token.is_none() {
            record.is_authenticated = false;
        }

        let http_client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            store,
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
            fsm: Mutex::new(AuthMachine::new()),
            record: Mutex::new(record),
            last_error: Mutex::new(None),
            epoch: AtomicU64::new(0),
        })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/api/v1/auth/{}", self.api_url, path)
    }

    /// Transition the FSM, failing on an impossible transition.
    fn transition(&self, input: &AuthMachineInput) -> AuthResult<AuthState> {
        let mut fsm = self.fsm.lock().unwrap();
        let old_state = AuthState::from(fsm.state());

        fsm.consume(input).map_err(|_| {
            AuthError::InvalidStateTransition(format!(
                "Cannot apply {:?} in state {:?}",
                input,
                fsm.state()
            ))
        })?;

        let new_state = AuthState::from(fsm.state());
        if old_state != new_state {
            debug!(
                old_state = ?old_state,
                new_state = ?new_state,
                "Session state transition"
            );
        }

        Ok(new_state)
    }

    fn set_error(&self, message: Option<String>) {
        *self.last_error.lock().unwrap() = message;
    }

    /// Current session state.
    pub fn state(&self) -> AuthState {
        let fsm = self.fsm.lock().unwrap();
        AuthState::from(fsm.state())
    }

    /// Current access token, if any.
    pub fn access_token(&self) -> Option<String> {
        self.record.lock().unwrap().access_token.clone()
    }

    /// Cached profile of the signed-in user, if any.
    pub fn user(&self) -> Option<UserProfile> {
        self.record.lock().unwrap().user.clone()
    }

    /// Whether the session is authenticated.
    pub fn is_authenticated(&self) -> bool {
        self.record.lock().unwrap().is_authenticated
    }

    /// Last credential-error message, if any.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().unwrap().clone()
    }

    /// Clear the stored error message.
    pub fn clear_error(&self) {
        self.set_error(None);
    }

    /// Current session epoch.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// A copy of the current session record.
    pub fn snapshot(&self) -> SessionRecord {
        self.record.lock().unwrap().clone()
    }

    /// Login with email and password.
    ///
    /// On success the tokens and profile are stored and persisted, and every
    /// subsequent request through the shared handle carries the new token.
    /// On failure the server's message is stored for inline display and the
    /// error is returned so the caller can react.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<UserProfile> {
        self.transition(&AuthMachineInput::AuthenticationStarted)?;
        self.set_error(None);

        debug!(email = %email, "Attempting login");

        let response = match self
            .http_client
            .post(self.auth_url("login"))
            .json(&LoginRequest { email, password })
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                self.set_error(Some("Login failed".to_string()));
                self.transition(&AuthMachineInput::AuthenticationFailed)?;
                return Err(AuthError::Http(e));
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = server_message(&body, "Login failed");
            warn!(status = %status, "Login rejected");
            self.set_error(Some(message.clone()));
            self.transition(&AuthMachineInput::AuthenticationFailed)?;
            return Err(AuthError::InvalidCredentials(message));
        }

        let data: LoginResponse = match response.json().await {
            Ok(data) => data,
            Err(e) => {
                self.set_error(Some("Login failed".to_string()));
                self.transition(&AuthMachineInput::AuthenticationFailed)?;
                return Err(AuthError::Http(e));
            }
        };

        {
            let mut record = self.record.lock().unwrap();
            record.access_token = Some(data.access_token);
            record.refresh_token = Some(data.refresh_token);
            record.user = Some(data.user.clone());
            record.is_authenticated = true;
            self.store.save(&record)?;
        }

        // A new login starts a new session generation.
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.transition(&AuthMachineInput::AuthenticationSucceeded)?;

        info!(
            user_id = %data.user.id,
            expires_in = data.expires_in,
            "Login successful"
        );

        Ok(data.user)
    }

    /// Register a new account. Does not authenticate the user.
    ///
    /// Invalid requests are rejected client-side before any network I/O.
    pub async fn register(&self, request: &RegisterRequest) -> AuthResult<RegisterResponse> {
        request.validate()?;
        self.set_error(None);

        debug!(email = %request.email, "Attempting registration");

        let response = match self
            .http_client
            .post(self.auth_url("register"))
            .json(request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                self.set_error(Some("Registration failed".to_string()));
                return Err(AuthError::Http(e));
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = server_message(&body, "Registration failed");
            warn!(status = %status, "Registration rejected");
            self.set_error(Some(message.clone()));
            return Err(AuthError::Registration(message));
        }

        let data: RegisterResponse = response.json().await?;
        info!(user_id = %data.user_id, "Registration successful");
        Ok(data)
    }

    /// Logout. Always succeeds locally.
    pub async fn logout(&self) {
        // Best-effort server notification, fire and forget: a dead backend
        // must never block a local logout.
        if let Some(token) = self.access_token() {
            match self
                .http_client
                .post(self.auth_url("logout"))
                .bearer_auth(&token)
                .send()
                .await
            {
                Ok(response) if !response.status().is_success() => {
                    debug!(status = %response.status(), "Logout notification rejected (ignored)");
                }
                Ok(_) => {}
                Err(e) => {
                    debug!(error = %e, "Logout notification failed (ignored)");
                }
            }
        }

        self.epoch.fetch_add(1, Ordering::SeqCst);

        {
            let mut record = self.record.lock().unwrap();
            *record = SessionRecord::default();
        }
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear persisted session");
        }

        // Logging out of an already-anonymous session is a no-op.
        let _ = self.transition(&AuthMachineInput::LoggedOut);
        self.set_error(None);

        info!("Logged out");
    }

    /// Refresh the access token using the stored refresh token.
    ///
    /// Returns `false` without network I/O when no refresh token is present.
    /// Any refresh failure is fatal to the session: the session is reset via
    /// [`Self::logout`] and `false` is returned. The refresh token and the
    /// cached profile are untouched on success.
    pub async fn refresh_access_token(&self) -> bool {
        let refresh_token = {
            let record = self.record.lock().unwrap();
            record.refresh_token.clone()
        };
        let Some(refresh_token) = refresh_token else {
            debug!("No refresh token present, skipping refresh");
            return false;
        };

        let started_epoch = self.epoch.load(Ordering::SeqCst);

        // Proactive and reactive refreshes may overlap; the transition is
        // best-effort so a redundant caller does not error out of Refreshing.
        let _ = self.transition(&AuthMachineInput::RefreshStarted);

        match self.try_refresh(&refresh_token).await {
            Ok(access_token) => {
                {
                    let mut record = self.record.lock().unwrap();
                    if self.epoch.load(Ordering::SeqCst) != started_epoch {
                        debug!("Session epoch advanced during refresh, discarding new token");
                        return false;
                    }
                    record.access_token = Some(access_token);
                    if let Err(e) = self.store.save(&record) {
                        warn!(error = %e, "Failed to persist refreshed token");
                    }
                }
                let _ = self.transition(&AuthMachineInput::RefreshSucceeded);
                true
            }
            Err(e) => {
                if self.epoch.load(Ordering::SeqCst) != started_epoch {
                    debug!("Session epoch advanced during refresh, ignoring failure");
                    return false;
                }
                warn!(error = %e, "Token refresh failed, resetting session");
                self.logout().await;
                false
            }
        }
    }

    /// Single attempt to refresh the access token.
    async fn try_refresh(&self, refresh_token: &str) -> AuthResult<String> {
        debug!("Refreshing access token");

        let response = self
            .http_client
            .post(self.auth_url("refresh"))
            .json(&RefreshRequest { refresh_token })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::TokenRefresh(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let data: RefreshResponse = response.json().await?;
        debug!(expires_in = data.expires_in, "Access token refreshed");
        Ok(data.access_token)
    }

    /// Restore a persisted session on startup.
    ///
    /// With no persisted access token this is a no-op and performs zero
    /// network calls. Otherwise the token is validated by fetching the
    /// current profile; a rejected token falls back to the refresh path, and
    /// a failed refresh leaves the session already reset.
    ///
    /// Returns `Ok(true)` when an authenticated session was restored.
    pub async fn initialize_auth(&self) -> AuthResult<bool> {
        let access_token = {
            let record = self.record.lock().unwrap();
            record.access_token.clone()
        };
        let Some(access_token) = access_token else {
            debug!("No persisted access token, starting anonymous");
            return Ok(false);
        };

        self.transition(&AuthMachineInput::AuthenticationStarted)?;

        match self.fetch_profile(&access_token).await {
            Ok(user) => {
                {
                    let mut record = self.record.lock().unwrap();
                    record.user = Some(user.clone());
                    record.is_authenticated = true;
                    self.store.save(&record)?;
                }
                self.transition(&AuthMachineInput::AuthenticationSucceeded)?;
                info!(user_id = %user.id, "Restored persisted session");
                Ok(true)
            }
            Err(e) => {
                debug!(error = %e, "Persisted token rejected, attempting refresh");
                let _ = self.transition(&AuthMachineInput::TokenRejected);

                if self.refresh_access_token().await {
                    {
                        let mut record = self.record.lock().unwrap();
                        record.is_authenticated = true;
                        if let Err(e) = self.store.save(&record) {
                            warn!(error = %e, "Failed to persist restored session");
                        }
                    }
                    info!("Session restored via refresh");
                    Ok(true)
                } else {
                    // refresh_access_token has already reset the session
                    info!("Persisted session could not be restored");
                    Ok(false)
                }
            }
        }
    }

    /// Fetch the current user's profile with the given token.
    async fn fetch_profile(&self, access_token: &str) -> AuthResult<UserProfile> {
        let response = self
            .http_client
            .get(self.auth_url("me"))
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::SessionInvalid(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}
