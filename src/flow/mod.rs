//! Two-step login handshake: credentials first, then an emailed
//! verification code when the account requires it. Every operation
//! resolves to a [`FlowOutcome`]; expected failures (wrong password,
//! expired code, unreachable server) are results, never errors.

use std::sync::{Arc, Mutex, PoisonError};

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::api::{ApiError, AuthApi, UserProfile};
use crate::session::{LockStatus, LoginAttempts, SessionManager};

const MISSING_FIELDS: &str = "Please enter both email and password";
const CONNECTION_ERROR: &str = "Connection error. Check your network and try again.";
const INVALID_CREDENTIALS: &str = "Invalid credentials";
const INVALID_CODE: &str = "Invalid or expired code";
const NO_PENDING_VERIFICATION: &str = "No verification is pending";
const CODE_SENT: &str = "Code sent to your email";

/// Where the handshake currently stands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowState {
    AwaitingCredentials,
    /// A one-time code was emailed to this address.
    AwaitingCode { email: String },
    Authenticated,
}

/// Uniform result of every flow operation, pattern-matched by the UI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowOutcome {
    Success { message: String, user: UserProfile },
    VerificationRequired { message: String },
    Failure { message: String },
}

/// Shape check for the emailed codes: exactly six characters. Anything
/// else about the code is the server's call.
#[must_use]
pub fn valid_code(code: &str) -> bool {
    code.trim().chars().count() == 6
}

/// Drives the handshake and hands successful tokens to the session manager.
pub struct LoginFlow {
    api: Arc<dyn AuthApi>,
    session: Arc<SessionManager>,
    attempts: LoginAttempts,
    state: Mutex<FlowState>,
}

impl LoginFlow {
    #[must_use]
    pub fn new(api: Arc<dyn AuthApi>, session: Arc<SessionManager>, attempts: LoginAttempts) -> Self {
        Self {
            api,
            session,
            attempts,
            state: Mutex::new(FlowState::AwaitingCredentials),
        }
    }

    #[must_use]
    pub fn state(&self) -> FlowState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The address mid-way through verification, if any.
    #[must_use]
    pub fn pending_email(&self) -> Option<String> {
        match self.state() {
            FlowState::AwaitingCode { email } => Some(email),
            _ => None,
        }
    }

    fn set_state(&self, state: FlowState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// First step: email and password. Empty fields fail locally without
    /// touching the network.
    pub async fn submit_credentials(&self, email: &str, password: &SecretString) -> FlowOutcome {
        let email = email.trim().to_lowercase();
        if email.is_empty() || password.expose_secret().trim().is_empty() {
            return FlowOutcome::Failure {
                message: MISSING_FIELDS.to_string(),
            };
        }

        if let LockStatus::Locked { remaining_minutes } = self.attempts.status() {
            return FlowOutcome::Failure {
                message: format!("Too many attempts. Try again in {remaining_minutes} minutes"),
            };
        }

        match self.api.login(&email, password.expose_secret()).await {
            Ok(body) if body.requires_verification() => {
                self.attempts.reset();
                debug!("verification code requested for {email}");
                self.set_state(FlowState::AwaitingCode { email });
                FlowOutcome::VerificationRequired {
                    message: body.message.unwrap_or_else(|| CODE_SENT.to_string()),
                }
            }
            Ok(body) => match (body.token, body.user) {
                (Some(token), Some(user)) => {
                    self.attempts.reset();
                    self.session.set_session(&token, &user);
                    self.set_state(FlowState::Authenticated);
                    FlowOutcome::Success {
                        message: format!("Welcome {}!", user.name),
                        user,
                    }
                }
                _ => {
                    self.attempts.record_failure();
                    FlowOutcome::Failure {
                        message: body
                            .message
                            .unwrap_or_else(|| INVALID_CREDENTIALS.to_string()),
                    }
                }
            },
            Err(err) => {
                self.attempts.record_failure();
                FlowOutcome::Failure {
                    message: failure_message(&err, INVALID_CREDENTIALS),
                }
            }
        }
    }

    /// Second step: the emailed code, uppercased before it is sent. The
    /// caller is expected to shape-check with [`valid_code`] first.
    pub async fn submit_code(&self, code: &str) -> FlowOutcome {
        let Some(email) = self.pending_email() else {
            self.set_state(FlowState::AwaitingCredentials);
            return FlowOutcome::Failure {
                message: NO_PENDING_VERIFICATION.to_string(),
            };
        };

        let code = code.trim().to_uppercase();

        match self.api.verify_code(&email, &code).await {
            Ok(body) => match (body.token, body.user) {
                (Some(token), Some(user)) => {
                    self.session.set_session(&token, &user);
                    self.set_state(FlowState::Authenticated);
                    FlowOutcome::Success {
                        message: format!("Welcome {}!", user.name),
                        user,
                    }
                }
                _ => FlowOutcome::Failure {
                    message: body.message.unwrap_or_else(|| INVALID_CODE.to_string()),
                },
            },
            Err(err) => FlowOutcome::Failure {
                message: failure_message(&err, INVALID_CODE),
            },
        }
    }

    /// Abandons a pending verification and returns to the credentials step.
    pub fn cancel_verification(&self) {
        self.set_state(FlowState::AwaitingCredentials);
    }

    /// Signs out: best-effort network leg, then the local clear, which
    /// runs whatever the network did. The caller navigates to the login
    /// page afterwards.
    pub async fn logout(&self) {
        if let Some(token) = self.session.token() {
            if let Err(err) = self.api.logout(&token).await {
                warn!("logout request failed: {err}");
            }
        }

        self.session.clear_session();
        self.set_state(FlowState::AwaitingCredentials);
    }
}

/// Maps an API error to the message the form shows: the server's own
/// message when it sent one, the fixed fallback for bare rejections, and
/// the connection message for anything the transport could not complete.
fn failure_message(err: &ApiError, fallback: &str) -> String {
    match err {
        ApiError::Http { message, .. } if !message.is_empty() => message.clone(),
        ApiError::Http { .. } => fallback.to_string(),
        _ => CONNECTION_ERROR.to_string(),
    }
}
