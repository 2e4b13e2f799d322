//! Transient console messages. A notice stays current for five seconds
//! and is then dismissed by a cancellable task, so a later `status` does
//! not replay stale flow outcomes.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;

const DISMISS_AFTER: Duration = Duration::from_secs(5);

#[derive(Default)]
pub struct Notices {
    current: Arc<Mutex<Option<String>>>,
    dismiss: Mutex<Option<JoinHandle<()>>>,
}

impl Notices {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a notice and (re)arms its dismissal.
    pub fn set(&self, message: &str) {
        *self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(message.to_string());

        let mut dismiss = self.dismiss.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = dismiss.take() {
            handle.abort();
        }

        if tokio::runtime::Handle::try_current().is_err() {
            debug!("no async runtime, notice kept until replaced");
            return;
        }

        let current = self.current.clone();
        *dismiss = Some(tokio::spawn(async move {
            sleep(DISMISS_AFTER).await;
            *current.lock().unwrap_or_else(PoisonError::into_inner) = None;
        }));
    }

    #[must_use]
    pub fn current(&self) -> Option<String> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear(&self) {
        *self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;

        let mut dismiss = self.dismiss.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = dismiss.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::task::yield_now;
    use tokio::time::advance;

    #[tokio::test(start_paused = true)]
    async fn notice_dismisses_after_five_seconds() {
        let notices = Notices::new();
        notices.set("Welcome Ana!");
        yield_now().await;
        assert_eq!(notices.current().as_deref(), Some("Welcome Ana!"));

        advance(Duration::from_secs(4)).await;
        yield_now().await;
        assert_eq!(notices.current().as_deref(), Some("Welcome Ana!"));

        advance(Duration::from_secs(2)).await;
        yield_now().await;
        assert_eq!(notices.current(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn replacing_a_notice_restarts_the_timer() {
        let notices = Notices::new();
        notices.set("first");
        yield_now().await;

        advance(Duration::from_secs(4)).await;
        yield_now().await;
        notices.set("second");
        yield_now().await;

        advance(Duration::from_secs(4)).await;
        yield_now().await;
        assert_eq!(notices.current().as_deref(), Some("second"));

        advance(Duration::from_secs(2)).await;
        yield_now().await;
        assert_eq!(notices.current(), None);
    }

    #[tokio::test]
    async fn clear_drops_the_notice_immediately() {
        let notices = Notices::new();
        notices.set("pending");
        notices.clear();
        assert_eq!(notices.current(), None);
    }
}
