use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;

/// Identifies one lookup. Only the most recently issued token is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(u64);

/// Keeps at most one lookup live. Starting a new one aborts the previous task
/// and invalidates its token, so a late response can be recognised and dropped.
#[derive(Default)]
pub struct RequestController {
    generation: AtomicU64,
    inflight: Mutex<Option<AbortHandle>>,
}

impl RequestController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> RequestToken {
        let id = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(previous) = self.inflight.lock().take() {
            previous.abort();
            tracing::trace!(superseded_by = id, "cancelled in-flight lookup");
        }
        RequestToken(id)
    }

    /// Register the task running `token`'s lookup so a later `begin` can abort it.
    pub fn track(&self, token: RequestToken, task: AbortHandle) {
        let mut slot = self.inflight.lock();
        if self.is_current(token) {
            *slot = Some(task);
        } else {
            task.abort();
        }
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.generation.load(Ordering::SeqCst) == token.0
    }

    /// Drop the task handle once the current lookup has settled.
    pub fn finish(&self, token: RequestToken) {
        let mut slot = self.inflight.lock();
        if self.is_current(token) {
            slot.take();
        }
    }

    /// Invalidate and abort whatever is in flight.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(previous) = self.inflight.lock().take() {
            previous.abort();
            tracing::trace!("cancelled in-flight lookup");
        }
    }
}

/// Runs a job only after `delay` has passed without another `schedule` call.
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<AbortHandle>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn schedule<F>(&self, runtime: &Handle, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay;
        let mut pending = self.pending.lock();
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        let task = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            job.await;
        });
        *pending = Some(task.abort_handle());
    }

    pub fn cancel(&self) {
        if let Some(previous) = self.pending.lock().take() {
            previous.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn rapid_schedules_run_only_the_last_job() {
        let debouncer = Debouncer::new(Duration::from_millis(350));
        let runs = Arc::new(Mutex::new(Vec::new()));
        let handle = Handle::current();

        for (i, text) in ["R", "Rå", "Råd"].into_iter().enumerate() {
            let runs = runs.clone();
            debouncer.schedule(&handle, async move { runs.lock().push(text) });
            if i < 2 {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
        tokio::time::sleep(Duration::from_millis(349)).await;
        assert!(runs.lock().is_empty());
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(*runs.lock(), vec!["Råd"]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_pending_job() {
        let debouncer = Debouncer::new(Duration::from_millis(50));
        let runs = Arc::new(Mutex::new(0));
        let counter = runs.clone();
        debouncer.schedule(&Handle::current(), async move { *counter.lock() += 1 });
        debouncer.cancel();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(*runs.lock(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn begin_supersedes_and_aborts_previous() {
        let controller = RequestController::new();
        let first = controller.begin();
        let slow = tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(5)).await;
        });
        controller.track(first, slow.abort_handle());
        assert!(controller.is_current(first));

        let second = controller.begin();
        assert!(!controller.is_current(first));
        assert!(controller.is_current(second));
        assert!(slow.await.unwrap_err().is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn tracking_a_stale_token_aborts_the_task() {
        let controller = RequestController::new();
        let stale = controller.begin();
        controller.cancel();
        let task = tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(5)).await;
        });
        controller.track(stale, task.abort_handle());
        assert!(task.await.unwrap_err().is_cancelled());
    }
}
