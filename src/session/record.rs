use crate::api::UserProfile;
use serde::{Deserialize, Serialize};

/// Store keys cleared together on logout or expiry.
pub const RECORD_KEY: &str = "token_record";
pub const TOKEN_KEY: &str = "auth_token";
pub const NAME_KEY: &str = "user_name";
pub const EMAIL_KEY: &str = "user_email";
pub const ROLE_KEY: &str = "user_role";
pub const ATTEMPTS_KEY: &str = "login_attempts";

pub const SESSION_KEYS: [&str; 5] = [RECORD_KEY, TOKEN_KEY, NAME_KEY, EMAIL_KEY, ROLE_KEY];

/// Token lifetime: 8 hours.
pub const TOKEN_EXPIRY_MS: u64 = 8 * 60 * 60 * 1000;

/// Persisted bundle of bearer token, profile snapshot and expiry bounds.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenRecord {
    pub token: String,
    pub user: UserProfile,
    pub issued_at: u64,
    pub expires_at: u64,
}

impl TokenRecord {
    #[must_use]
    pub fn issue(token: &str, user: &UserProfile, now_ms: u64) -> Self {
        Self {
            token: token.to_string(),
            user: user.clone(),
            issued_at: now_ms,
            expires_at: now_ms + TOKEN_EXPIRY_MS,
        }
    }

    /// A record is usable strictly before its expiry instant.
    #[must_use]
    pub fn is_live(&self, now_ms: u64) -> bool {
        self.expires_at > self.issued_at && now_ms < self.expires_at
    }
}
