//! Consecutive-failure tracking for the login form. The platform ships
//! with lockout disabled; the counter is inert until the policy enables
//! it, and stale lockout state is purged at startup while disabled.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::clock::Clock;
use super::record::ATTEMPTS_KEY;
use super::store::SessionStore;

/// Lockout policy. Disabled by default; activation is pending a product
/// decision, so no CLI switch is exposed yet.
#[derive(Clone, Copy, Debug)]
pub struct LockoutPolicy {
    pub enabled: bool,
    pub max_attempts: u32,
    pub lockout_ms: u64,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            max_attempts: 3,
            lockout_ms: 15 * 60 * 1000,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct AttemptRecord {
    count: u32,
    last_attempt: u64,
}

/// Whether the login form should accept a submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockStatus {
    Open,
    Locked { remaining_minutes: u64 },
}

pub struct LoginAttempts {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    policy: LockoutPolicy,
}

impl LoginAttempts {
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>, clock: Arc<dyn Clock>, policy: LockoutPolicy) -> Self {
        if !policy.enabled {
            // drop any lockout state left over from when the flag was on
            store.remove(ATTEMPTS_KEY);
        }
        Self {
            store,
            clock,
            policy,
        }
    }

    fn read(&self) -> AttemptRecord {
        self.store
            .get(ATTEMPTS_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    /// Records a failed submission and returns the running count.
    pub fn record_failure(&self) -> u32 {
        if !self.policy.enabled {
            return 0;
        }

        let mut attempts = self.read();
        attempts.count += 1;
        attempts.last_attempt = self.clock.now_ms();

        if let Ok(raw) = serde_json::to_string(&attempts) {
            self.store.set(ATTEMPTS_KEY, &raw);
        }

        debug!("failed login attempt {} recorded", attempts.count);
        attempts.count
    }

    pub fn reset(&self) {
        self.store.remove(ATTEMPTS_KEY);
    }

    #[must_use]
    pub fn status(&self) -> LockStatus {
        if !self.policy.enabled {
            return LockStatus::Open;
        }

        let attempts = self.read();
        if attempts.count < self.policy.max_attempts {
            return LockStatus::Open;
        }

        let elapsed = self.clock.now_ms().saturating_sub(attempts.last_attempt);
        if elapsed >= self.policy.lockout_ms {
            self.reset();
            return LockStatus::Open;
        }

        let remaining = self.policy.lockout_ms - elapsed;
        LockStatus::Locked {
            remaining_minutes: remaining.div_ceil(60_000),
        }
    }
}
