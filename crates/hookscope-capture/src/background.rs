//! Fire-and-forget background work.
//!
//! Network calls started from the hot path run as detached tokio tasks. The
//! process gives them a short grace period before exiting and abandons
//! whatever is still running.

use std::fmt::Display;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Handles of detached tasks started during one invocation.
#[derive(Debug, Default)]
pub struct BackgroundTasks {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` in the background. Its error is logged, never returned.
    ///
    /// Outside a tokio runtime the task is dropped.
    pub fn spawn<F, E>(&self, name: &'static str, task: F)
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let Ok(runtime) = Handle::try_current() else {
            debug!(task = name, "no async runtime, skipping background task");
            return;
        };

        let handle = runtime.spawn(async move {
            if let Err(e) = task.await {
                warn!(task = name, error = %e, "background task failed");
            }
        });
        self.lock().push(handle);
    }

    /// Number of tasks not yet settled.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait up to `grace` for every task, then abort the rest.
    ///
    /// Returns how many tasks were abandoned.
    pub async fn settle(&self, grace: Duration) -> usize {
        let handles = std::mem::take(&mut *self.lock());
        let deadline = tokio::time::Instant::now() + grace;
        let mut abandoned = 0;

        for mut handle in handles {
            if tokio::time::timeout_at(deadline, &mut handle).await.is_err() {
                handle.abort();
                abandoned += 1;
            }
        }
        if abandoned > 0 {
            debug!(abandoned, "abandoned background tasks at exit");
        }
        abandoned
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.handles.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
