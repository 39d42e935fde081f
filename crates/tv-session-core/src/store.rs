//! Reactive state container with broadcast subscriptions.

use std::sync::{PoisonError, RwLock};

use futures::StreamExt;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

/// Broadcast capacity. Lagging subscribers skip straight to newer values.
const CHANNEL_CAPACITY: usize = 64;

/// Reactive state container.
///
/// Holds the current value and broadcasts every change to subscribers.
/// UI consumers subscribe and re-render on change; mutation goes through
/// the owner's methods only.
pub struct Store<T> {
    value: RwLock<T>,
    sender: broadcast::Sender<T>,
}

impl<T> Default for Store<T>
where
    T: Default + Clone + PartialEq + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Store<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create a store holding `initial`.
    #[must_use]
    pub fn new(initial: T) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            value: RwLock::new(initial),
            sender,
        }
    }

    /// Clone the current value.
    #[must_use]
    pub fn snapshot(&self) -> T {
        self.value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Read a projection of the current value without cloning all of it.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Mutate the value in place.
    ///
    /// Subscribers are notified only if the value actually changed.
    /// Returns whether it changed.
    pub fn update<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        let mut value = self.value.write().unwrap_or_else(PoisonError::into_inner);
        let before = value.clone();
        f(&mut value);
        if *value == before {
            return false;
        }
        // Sent under the lock so subscribers observe writes in order.
        let _ = self.sender.send(value.clone());
        true
    }

    /// Replace the value wholesale.
    pub fn replace(&self, next: T) -> bool {
        self.update(|value| *value = next)
    }

    /// Get a receiver for live changes.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Stream that yields the current value first, then live changes.
    #[must_use]
    pub fn stream(&self) -> futures::stream::BoxStream<'static, T> {
        // Subscribe before the snapshot so no change slips between them.
        let rx = self.subscribe();
        let current = self.snapshot();

        let live = BroadcastStream::new(rx).filter_map(|res| async move { res.ok() });

        futures::stream::once(async move { current }).chain(live).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_reports_change() {
        let store = Store::new(1_u32);
        assert!(store.update(|v| *v = 2));
        assert!(!store.update(|v| *v = 2));
        assert_eq!(store.snapshot(), 2);
    }

    #[tokio::test]
    async fn test_subscribers_only_see_changes() {
        let store = Store::new(false);
        let mut rx = store.subscribe();

        store.replace(false);
        store.replace(true);

        assert!(rx.recv().await.unwrap());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_stream_starts_with_current_value() {
        let store = Store::new(String::from("idle"));
        let mut stream = store.stream();

        assert_eq!(stream.next().await.unwrap(), "idle");
        store.replace("busy".to_string());
        assert_eq!(stream.next().await.unwrap(), "busy");
    }

    #[test]
    fn test_stream_pending_until_change() {
        let store = Store::new(0_u8);
        let mut stream = store.stream();
        assert_eq!(tokio_test::block_on(stream.next()), Some(0));

        let mut next = tokio_test::task::spawn(stream.next());
        tokio_test::assert_pending!(next.poll());

        store.replace(1);
        assert!(next.is_woken());
        tokio_test::assert_ready_eq!(next.poll(), Some(1));
    }

    #[test]
    fn test_read_projection() {
        let store = Store::new((3_u8, "x"));
        assert_eq!(store.read(|v| v.0), 3);
    }
}
