//! Background tasks armed while a session is valid: the periodic token
//! refresh and the inactivity watch. Both hold only a weak handle to the
//! manager so an abandoned session does not keep them alive.

use std::sync::Weak;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant};
use tracing::warn;

use super::{SessionManager, IDLE_GRACE, IDLE_TIMEOUT, REFRESH_INTERVAL};

pub(super) fn spawn_refresh(manager: Weak<SessionManager>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = interval_at(Instant::now() + REFRESH_INTERVAL, REFRESH_INTERVAL);
        loop {
            tick.tick().await;
            let Some(manager) = manager.upgrade() else {
                break;
            };
            manager.refresh_now().await;
        }
    })
}

pub(super) fn spawn_idle_watch(manager: Weak<SessionManager>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let Some(strong) = manager.upgrade() else {
                break;
            };
            let deadline = strong.idle_deadline();
            drop(strong);

            if Instant::now() < deadline {
                tokio::time::sleep_until(deadline).await;
                continue;
            }

            let Some(strong) = manager.upgrade() else {
                break;
            };
            if strong.is_authenticated() {
                warn!(
                    "no activity for {} minutes, signing out",
                    IDLE_TIMEOUT.as_secs() / 60
                );
                sleep(IDLE_GRACE).await;
                strong.close_idle_session().await;
            }
            break;
        }
    })
}
