//! Client-side session model: the persisted token record, its expiry
//! rules, and the timers that keep a live session refreshed and an idle
//! one closed. [`SessionManager`] is the single source of truth for
//! "is there a usable authenticated session"; everything else asks it.

pub mod attempts;
pub mod clock;
pub mod record;
pub mod store;

mod monitor;

pub use attempts::{LockStatus, LockoutPolicy, LoginAttempts};
pub use clock::{Clock, ManualClock, SystemClock};
pub use record::TokenRecord;
pub use store::{default_session_file, FileStore, MemoryStore, SessionStore};

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::api::{AuthApi, UserProfile};
use record::{EMAIL_KEY, NAME_KEY, RECORD_KEY, ROLE_KEY, SESSION_KEYS, TOKEN_KEY};

/// Refresh a live token every 30 minutes.
pub(crate) const REFRESH_INTERVAL: Duration = Duration::from_secs(30 * 60);
/// Close the session after one hour without user activity.
pub(crate) const IDLE_TIMEOUT: Duration = Duration::from_secs(60 * 60);
/// Delay between the idle warning and the actual sign-out.
pub(crate) const IDLE_GRACE: Duration = Duration::from_secs(2);

/// Pages the guard distinguishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Page {
    Login,
    Dashboard,
}

/// Display fields mirrored from the persisted record for page chrome.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserDisplay {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

/// Access decision for a page load. Advisory only: the API's acceptance
/// of the bearer token is the real authorization boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PageGuard {
    /// No usable session on a protected page.
    RedirectToLogin,
    /// Valid session on the login page.
    RedirectToDashboard,
    /// Stay put; `Some(user)` when authenticated.
    Stay { user: Option<UserDisplay> },
}

#[derive(Default)]
struct Tasks {
    refresh: Option<JoinHandle<()>>,
    idle: Option<JoinHandle<()>>,
}

/// Owns the session token record and the timers attached to it.
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    api: Arc<dyn AuthApi>,
    state_tx: watch::Sender<bool>,
    tasks: Mutex<Tasks>,
    last_activity: Mutex<Option<Instant>>,
}

impl SessionManager {
    #[must_use]
    pub fn new(
        store: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
        api: Arc<dyn AuthApi>,
    ) -> Arc<Self> {
        let (state_tx, _) = watch::channel(false);
        let manager = Arc::new(Self {
            store,
            clock,
            api,
            state_tx,
            tasks: Mutex::new(Tasks::default()),
            last_activity: Mutex::new(None),
        });

        // reading also purges any stale or corrupt record left on disk
        let live = manager.is_authenticated();
        manager.state_tx.send_replace(live);
        manager
    }

    /// Persists a fresh record for `token` and (re)arms the session timers.
    pub fn set_session(self: &Arc<Self>, token: &str, user: &UserProfile) {
        self.write_session(token, user);
        self.arm_timers();
    }

    /// Returns the bearer token while the record is live. An expired or
    /// unreadable record behaves as absence and is purged on the spot.
    pub fn token(&self) -> Option<String> {
        let raw = self.store.get(RECORD_KEY)?;

        match serde_json::from_str::<TokenRecord>(&raw) {
            Ok(token_record) if token_record.is_live(self.clock.now_ms()) => {
                Some(token_record.token)
            }
            Ok(_) => {
                warn!("session token expired");
                self.clear_session();
                None
            }
            Err(err) => {
                warn!("unreadable session record: {err}");
                self.clear_session();
                None
            }
        }
    }

    /// Removes every persisted session key and disarms the timers.
    /// Safe to call with no session in place.
    pub fn clear_session(&self) {
        for key in SESSION_KEYS {
            self.store.remove(key);
        }
        self.disarm_timers();
        self.state_tx.send_replace(false);
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// One refresh leg. Failure is never fatal: the record is left alone
    /// and expires naturally. The session is re-validated immediately
    /// before the write so a refresh resolving after a sign-out cannot
    /// resurrect it.
    pub async fn refresh_now(&self) {
        let Some(token) = self.token() else {
            return;
        };

        match self.api.refresh(&token).await {
            Ok(body) => {
                let (Some(token), Some(user)) = (body.token, body.user) else {
                    warn!("refresh response missing token, keeping current session");
                    return;
                };
                if self.is_authenticated() {
                    self.write_session(&token, &user);
                    debug!("session token refreshed");
                }
            }
            Err(err) => warn!("token refresh failed: {err}"),
        }
    }

    /// Access decision for a page load. Also mirrors the display fields
    /// for authenticated stays.
    #[must_use]
    pub fn guard_page(&self, page: Page) -> PageGuard {
        let authenticated = self.is_authenticated();

        match page {
            Page::Login if authenticated => PageGuard::RedirectToDashboard,
            Page::Login => PageGuard::Stay { user: None },
            Page::Dashboard if authenticated => PageGuard::Stay {
                user: Some(self.user_display()),
            },
            Page::Dashboard => PageGuard::RedirectToLogin,
        }
    }

    #[must_use]
    pub fn user_display(&self) -> UserDisplay {
        UserDisplay {
            name: self.store.get(NAME_KEY),
            email: self.store.get(EMAIL_KEY),
            role: self.store.get(ROLE_KEY),
        }
    }

    /// Pushes the idle deadline forward. Called for every interaction the
    /// console observes.
    pub fn record_activity(&self) {
        *self
            .last_activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
    }

    /// Observes session validity transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.state_tx.subscribe()
    }

    /// Arms the timers when a session is valid at page-load time.
    pub fn arm_monitors(self: &Arc<Self>) {
        if self.is_authenticated() {
            self.arm_timers();
        }
    }

    fn write_session(&self, token: &str, user: &UserProfile) {
        let token_record = TokenRecord::issue(token, user, self.clock.now_ms());

        match serde_json::to_string(&token_record) {
            Ok(raw) => self.store.set(RECORD_KEY, &raw),
            Err(err) => {
                warn!("cannot serialize session record: {err}");
                return;
            }
        }

        self.store.set(TOKEN_KEY, token);
        self.store.set(NAME_KEY, &user.name);
        self.store.set(EMAIL_KEY, &user.email);
        match &user.role {
            Some(role) => self.store.set(ROLE_KEY, role),
            None => self.store.remove(ROLE_KEY),
        }

        self.state_tx.send_replace(true);
    }

    fn arm_timers(self: &Arc<Self>) {
        if tokio::runtime::Handle::try_current().is_err() {
            debug!("no async runtime, session timers not armed");
            return;
        }

        self.record_activity();

        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = tasks.refresh.take() {
            handle.abort();
        }
        if let Some(handle) = tasks.idle.take() {
            handle.abort();
        }
        tasks.refresh = Some(monitor::spawn_refresh(Arc::downgrade(self)));
        tasks.idle = Some(monitor::spawn_idle_watch(Arc::downgrade(self)));
    }

    fn disarm_timers(&self) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = tasks.refresh.take() {
            handle.abort();
        }
        if let Some(handle) = tasks.idle.take() {
            handle.abort();
        }
    }

    pub(crate) fn idle_deadline(&self) -> Instant {
        self.last_activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .map_or_else(|| Instant::now() + IDLE_TIMEOUT, |at| at + IDLE_TIMEOUT)
    }

    /// Full sign-out after the idle grace period: best-effort network leg,
    /// then the unconditional local clear.
    pub(crate) async fn close_idle_session(&self) {
        if let Some(token) = self.token() {
            if let Err(err) = self.api.logout(&token).await {
                debug!("logout request failed: {err}");
            }
        }
        self.clear_session();
    }
}
