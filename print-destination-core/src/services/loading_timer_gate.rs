//! Minimum display time for the loading indicator

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::AbortHandle;

#[derive(Default)]
struct GateInner {
    elapsed: bool,
    /// Bumped on every start/cancel/reset; a timer only fires for its own generation
    generation: u64,
    timer: Option<AbortHandle>,
}

/// Loading-Timer Gate
///
/// Keeps the throbber up for at least `duration` after a dialog opens, so an
/// empty result does not flash before discovery has had a chance to report.
/// Once elapsed the flag stays set until [`LoadingTimerGate::reset`].
pub struct LoadingTimerGate {
    duration: Duration,
    inner: Arc<Mutex<GateInner>>,
}

impl LoadingTimerGate {
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            inner: Arc::new(Mutex::new(GateInner::default())),
        }
    }

    /// Whether the minimum loading time has elapsed in this session
    pub async fn is_elapsed(&self) -> bool {
        self.inner.lock().await.elapsed
    }

    /// Whether a timer is scheduled and has not fired yet
    #[cfg(test)]
    pub(crate) async fn is_pending(&self) -> bool {
        self.inner.lock().await.timer.is_some()
    }

    /// Schedule the one-shot timer.
    ///
    /// Does nothing when the gate already elapsed or a timer is pending.
    /// `on_elapsed` runs exactly once, after the flag is set.
    /// Returns whether a timer was scheduled.
    pub async fn start<F, Fut>(&self, on_elapsed: F) -> bool
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut guard = self.inner.lock().await;
        if guard.elapsed || guard.timer.is_some() {
            return false;
        }

        guard.generation += 1;
        let generation = guard.generation;
        let inner = Arc::clone(&self.inner);
        let duration = self.duration;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            {
                let mut guard = inner.lock().await;
                if guard.generation != generation {
                    return;
                }
                guard.elapsed = true;
                guard.timer = None;
            }
            log::debug!("Minimum loading time elapsed after {duration:?}");
            on_elapsed().await;
        });

        guard.timer = Some(handle.abort_handle());
        log::debug!("Loading timer started ({duration:?})");
        true
    }

    /// Cancel a pending timer without marking the gate elapsed.
    ///
    /// Returns whether a pending timer was cancelled.
    pub async fn cancel(&self) -> bool {
        let mut guard = self.inner.lock().await;
        match guard.timer.take() {
            Some(handle) => {
                guard.generation += 1;
                handle.abort();
                log::debug!("Loading timer cancelled");
                true
            }
            None => false,
        }
    }

    /// Start a fresh session: clear the flag and drop any pending timer.
    pub async fn reset(&self) {
        let mut guard = self.inner.lock().await;
        guard.elapsed = false;
        guard.generation += 1;
        if let Some(handle) = guard.timer.take() {
            handle.abort();
        }
        log::debug!("Loading timer reset");
    }
}
