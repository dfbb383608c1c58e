use menu_core::error::{MenuError, Result};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

type Slot<T> = watch::Sender<Option<T>>;

/// Process-local single-flight registry: at most one `thunk` in flight per
/// key. Waiters on the same key join a `watch` channel that always hands a
/// late subscriber the current (possibly already-resolved) state, so there
/// is no race between "thunk just finished" and "waiter just subscribed".
/// The registry mutex is held only across map insert/remove, never across
/// the coalesced call itself.
///
/// `thunk` itself never fails here -- the orchestrator it wraps already
/// swallows every recoverable error into its own result type. The only
/// error this type produces is `Timeout`, on both the owner's call and any
/// waiter joined to it.
pub struct Coalescer<T: Clone + Send + 'static> {
    inflight: Mutex<HashMap<String, Arc<Slot<T>>>>,
    timeout: Duration,
}

impl<T: Clone + Send + 'static> Default for Coalescer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + 'static> Coalescer<T> {
    pub fn new() -> Self {
        Self {
            inflight: Mutex::new(HashMap::new()),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            inflight: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    /// Run `thunk` for `key`, or join an in-flight call for the same key.
    /// Cancelling a waiter never cancels the `thunk` it joined — only the
    /// timeout on the owner's call can do that, and then every waiter
    /// (owner included) receives `MenuError::Timeout`.
    pub async fn run<F, Fut>(&self, key: &str, thunk: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send,
    {
        let mut guard = self.inflight.lock().await;
        if let Some(slot) = guard.get(key).cloned() {
            drop(guard);
            return wait_for_slot(&slot, self.timeout).await;
        }

        let (sender, _) = watch::channel(None);
        let slot = Arc::new(sender);
        guard.insert(key.to_string(), slot.clone());
        drop(guard);

        let outcome = tokio::time::timeout(self.timeout, thunk()).await;
        self.inflight.lock().await.remove(key);

        match outcome {
            Ok(value) => {
                let _ = slot.send(Some(value.clone()));
                Ok(value)
            }
            Err(_) => Err(MenuError::Timeout),
        }
    }
}

async fn wait_for_slot<T: Clone>(slot: &watch::Sender<Option<T>>, timeout: Duration) -> Result<T> {
    let mut receiver = slot.subscribe();
    tokio::time::timeout(timeout, async {
        loop {
            if let Some(value) = receiver.borrow().clone() {
                return Some(value);
            }
            if receiver.changed().await.is_err() {
                return None;
            }
        }
    })
    .await
    .ok()
    .flatten()
    .ok_or(MenuError::Timeout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn concurrent_calls_for_the_same_key_invoke_the_thunk_once() {
        let coalescer: Arc<Coalescer<u32>> = Arc::new(Coalescer::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let coalescer = coalescer.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                coalescer
                    .run("key", || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        42
                    })
                    .await
            }));
        }

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|r| *r == 42));
    }

    #[tokio::test]
    async fn different_keys_run_independently() {
        let coalescer: Coalescer<u32> = Coalescer::new();
        let a = coalescer.run("a", || async { 1 }).await.unwrap();
        let b = coalescer.run("b", || async { 2 }).await.unwrap();
        assert_eq!((a, b), (1, 2));
    }

    #[tokio::test]
    async fn timeout_is_returned_when_the_thunk_is_too_slow() {
        let coalescer: Coalescer<u32> = Coalescer::with_timeout(Duration::from_millis(10));
        let result = coalescer
            .run("slow", || async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                1
            })
            .await;
        assert!(matches!(result, Err(MenuError::Timeout)));
    }

    #[tokio::test]
    async fn a_fresh_call_after_completion_is_not_blocked_by_the_old_slot() {
        let coalescer: Arc<Coalescer<u32>> = Arc::new(Coalescer::new());
        coalescer.run("first", || async { 7 }).await.unwrap();
        let result = coalescer.run("first", || async { 7 }).await.unwrap();
        assert_eq!(result, 7);
    }
}
