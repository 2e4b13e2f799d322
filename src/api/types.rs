//! Request and response types for the platform's auth endpoints. Login
//! payloads carry credentials, so they must never be logged.

use serde::{Deserialize, Serialize};

/// Profile snapshot captured when a token is issued.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Clone, Debug, Serialize)]
pub struct VerifyCodeRequest<'a> {
    pub email: &'a str,
    pub code: &'a str,
}

/// Body shared by the auth endpoints. The platform returns either a token
/// with its profile, or a status marker with a prompt message.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

impl AuthResponse {
    /// Status marker signaling the second authentication step.
    pub const VERIFICATION_REQUIRED: &'static str = "verification_required";

    #[must_use]
    pub fn requires_verification(&self) -> bool {
        self.status.as_deref() == Some(Self::VERIFICATION_REQUIRED)
    }
}
