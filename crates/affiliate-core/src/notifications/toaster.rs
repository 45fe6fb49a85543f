//! The toast broadcaster service.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;
use tracing::debug;

use super::{Severity, Toast, ToastId};
use crate::config::NotificationConfig;

type Listener = Arc<dyn Fn(&[Toast]) + Send + Sync>;

#[derive(Default)]
struct Inner {
    toasts: Vec<Toast>,
    listeners: Vec<(u64, Listener)>,
    next_listener: u64,
    next_seq: u64,
}

impl Inner {
    /// Visible toasts plus the listeners to tell about them. Cloned so that
    /// callbacks run without the lock held.
    fn snapshot(&self, now: Instant) -> (Vec<Toast>, Vec<Listener>) {
        let toasts = self
            .toasts
            .iter()
            .filter(|t| !t.is_expired(now))
            .cloned()
            .collect();
        let listeners = self.listeners.iter().map(|(_, l)| Arc::clone(l)).collect();
        (toasts, listeners)
    }
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

fn notify(toasts: &[Toast], listeners: &[Listener]) {
    for listener in listeners {
        listener(toasts);
    }
}

/// Remove `id` and notify, unless it is already gone.
fn remove(inner: &Mutex<Inner>, id: &ToastId) -> bool {
    let mut guard = lock(inner);
    let before = guard.toasts.len();
    guard.toasts.retain(|t| &t.id != id);
    if guard.toasts.len() == before {
        return false;
    }
    let (toasts, listeners) = guard.snapshot(Instant::now());
    drop(guard);
    notify(&toasts, &listeners);
    true
}

/// Shared toast broadcaster. Clones are handles onto the same state.
#[derive(Clone)]
pub struct Toaster {
    inner: Arc<Mutex<Inner>>,
    default_ttl: Duration,
}

impl Toaster {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            default_ttl,
        }
    }

    pub fn from_config(config: &NotificationConfig) -> Self {
        Self::new(config.default_ttl())
    }

    pub const fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Publish with the default time-to-live.
    pub fn publish(&self, message: impl Into<String>, severity: Severity) -> ToastId {
        self.publish_with_ttl(message, severity, self.default_ttl)
    }

    /// Publish a toast that disappears after `ttl` unless dismissed sooner.
    ///
    /// Subscribers are called before this returns. Expiry is scheduled on the
    /// current Tokio runtime; without one, the toast is still hidden from
    /// [`Self::visible`] once its time is up, but nobody is told.
    pub fn publish_with_ttl(
        &self,
        message: impl Into<String>,
        severity: Severity,
        ttl: Duration,
    ) -> ToastId {
        let now = Instant::now();
        let mut guard = lock(&self.inner);
        let id = ToastId::new(Utc::now().timestamp_millis(), guard.next_seq);
        guard.next_seq += 1;
        guard.toasts.retain(|t| !t.is_expired(now));
        guard.toasts.push(Toast {
            id: id.clone(),
            message: message.into(),
            severity,
            ttl,
            expires_at: now + ttl,
        });
        let (toasts, listeners) = guard.snapshot(now);
        drop(guard);

        debug!(toast_id = %id, %severity, ?ttl, "Toast published");
        notify(&toasts, &listeners);
        self.schedule_expiry(id.clone(), ttl);
        id
    }

    pub fn success(&self, message: impl Into<String>) -> ToastId {
        self.publish(message, Severity::Success)
    }

    pub fn error(&self, message: impl Into<String>) -> ToastId {
        self.publish(message, Severity::Error)
    }

    pub fn warning(&self, message: impl Into<String>) -> ToastId {
        self.publish(message, Severity::Warning)
    }

    pub fn info(&self, message: impl Into<String>) -> ToastId {
        self.publish(message, Severity::Info)
    }

    /// Remove a toast now. Returns `false` if it had already gone.
    pub fn dismiss(&self, id: &ToastId) -> bool {
        let removed = remove(&self.inner, id);
        if removed {
            debug!(toast_id = %id, "Toast dismissed");
        }
        removed
    }

    /// Toasts published and not yet expired or dismissed, oldest first.
    pub fn visible(&self) -> Vec<Toast> {
        lock(&self.inner).snapshot(Instant::now()).0
    }

    /// Register `callback` for every change. Dropping the returned handle
    /// unsubscribes.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&[Toast]) + Send + Sync + 'static,
    {
        let mut guard = lock(&self.inner);
        let id = guard.next_listener;
        guard.next_listener += 1;
        guard.listeners.push((id, Arc::new(callback)));
        drop(guard);

        Subscription {
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner).listeners.len()
    }

    fn schedule_expiry(&self, id: ToastId, ttl: Duration) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!(toast_id = %id, "No runtime, toast will expire lazily");
            return;
        };
        let inner = Arc::downgrade(&self.inner);
        handle.spawn(async move {
            tokio::time::sleep(ttl).await;
            if let Some(inner) = inner.upgrade()
                && remove(&inner, &id)
            {
                debug!(toast_id = %id, "Toast expired");
            }
        });
    }
}

impl std::fmt::Debug for Toaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let guard = lock(&self.inner);
        f.debug_struct("Toaster")
            .field("toasts", &guard.toasts.len())
            .field("listeners", &guard.listeners.len())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

/// Handle returned by [`Toaster::subscribe`].
#[must_use = "dropping a Subscription unsubscribes immediately"]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    inner: Weak<Mutex<Inner>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            lock(&inner).listeners.retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    type Seen = Arc<Mutex<Vec<Vec<String>>>>;

    fn recorder(toaster: &Toaster) -> (Seen, Subscription) {
        let seen: Seen = Arc::default();
        let sink = Arc::clone(&seen);
        let sub = toaster.subscribe(move |toasts| {
            sink.lock()
                .unwrap()
                .push(toasts.iter().map(|t| t.message.clone()).collect());
        });
        (seen, sub)
    }

    fn last(seen: &Seen) -> Vec<String> {
        seen.lock().unwrap().last().cloned().unwrap_or_default()
    }

    #[tokio::test(start_paused = true)]
    async fn publish_notifies_immediately_and_expires() {
        let toaster = Toaster::new(Duration::from_secs(5));
        let (seen, _sub) = recorder(&toaster);

        toaster.publish_with_ttl("Saved", Severity::Success, Duration::from_millis(100));
        assert_eq!(toaster.visible().len(), 1);
        assert_eq!(last(&seen), vec!["Saved"]);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(toaster.visible().is_empty());
        assert!(last(&seen).is_empty());
        assert_eq!(seen.lock().unwrap().len(), 2);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn toasts_are_delivered_in_publish_order() {
        let toaster = Toaster::new(Duration::from_secs(5));
        let (seen, _sub) = recorder(&toaster);

        toaster.info("first");
        toaster.warning("second");
        toaster.error("third");
        assert_eq!(last(&seen), vec!["first", "second", "third"]);
    }

    #[tokio::test(start_paused = true)]
    async fn dismiss_removes_early_and_timer_is_a_no_op() {
        let toaster = Toaster::new(Duration::from_millis(200));
        let (seen, _sub) = recorder(&toaster);

        let id = toaster.success("Copied");
        assert!(toaster.dismiss(&id));
        assert!(toaster.visible().is_empty());
        assert!(!toaster.dismiss(&id));
        assert_eq!(seen.lock().unwrap().len(), 2);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_subscription_stops_callbacks() {
        let toaster = Toaster::new(Duration::from_secs(5));
        let (seen, sub) = recorder(&toaster);
        assert_eq!(toaster.subscriber_count(), 1);

        sub.unsubscribe();
        assert_eq!(toaster.subscriber_count(), 0);
        toaster.info("nobody hears this");
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn ids_are_unique_within_a_millisecond() {
        let toaster = Toaster::new(Duration::from_secs(5));
        let a = toaster.info("a");
        let b = toaster.info("b");
        assert_ne!(a, b);
    }

    #[tokio::test(start_paused = true)]
    async fn clones_share_state() {
        let toaster = Toaster::new(Duration::from_secs(5));
        let other = toaster.clone();
        other.info("from a clone");
        assert_eq!(toaster.visible().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn callbacks_may_publish_reentrantly() {
        let toaster = Toaster::new(Duration::from_secs(5));
        let handle = toaster.clone();
        let _sub = toaster.subscribe(move |toasts| {
            if toasts.len() == 1 && toasts[0].severity == Severity::Error {
                handle.info("follow-up");
            }
        });
        toaster.error("boom");
        assert_eq!(toaster.visible().len(), 2);
    }

    #[test]
    fn outside_a_runtime_toasts_expire_lazily() {
        let toaster = Toaster::new(Duration::ZERO);
        toaster.info("gone at once");
        assert!(toaster.visible().is_empty());
    }
}
