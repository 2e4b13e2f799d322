pub mod login;
pub mod logout;
pub mod status;

use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::api::ApiClient;
use crate::cli::globals::GlobalArgs;
use crate::flow::LoginFlow;
use crate::session::{
    default_session_file, FileStore, LockoutPolicy, LoginAttempts, MemoryStore, SessionManager,
    SessionStore, SystemClock,
};

/// Actions the CLI can dispatch.
#[derive(Debug)]
pub enum Action {
    Login,
    Logout,
    Status { remote: bool },
}

/// Wired components every action works with.
pub(crate) struct Context {
    pub api: Arc<ApiClient>,
    pub session: Arc<SessionManager>,
    pub flow: LoginFlow,
}

pub(crate) fn context(globals: &GlobalArgs) -> Result<Context> {
    let api = Arc::new(ApiClient::new(&globals.api_url)?);

    let store: Arc<dyn SessionStore> = if globals.ephemeral {
        Arc::new(MemoryStore::new())
    } else {
        let file = match &globals.state_dir {
            Some(dir) => dir.join("session.json"),
            None => default_session_file()
                .context("cannot determine a state directory; pass --state-dir or --ephemeral")?,
        };
        Arc::new(FileStore::open(file))
    };

    let clock = Arc::new(SystemClock);
    let session = SessionManager::new(store.clone(), clock.clone(), api.clone());
    let attempts = LoginAttempts::new(store, clock, LockoutPolicy::default());
    let flow = LoginFlow::new(api.clone(), session.clone(), attempts);

    Ok(Context { api, session, flow })
}
