//! Explicit observer lists for flow events.

use std::sync::{Arc, RwLock};

type Receiver<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// A broadcast point for one event type.
///
/// Receivers are called synchronously, in connection order.
pub struct Signal<E> {
    receivers: Arc<RwLock<Vec<Receiver<E>>>>,
}

impl<E> Signal<E> {
    pub fn new() -> Self {
        Self {
            receivers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn connect<F>(&self, receiver: F)
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.receivers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(Arc::new(receiver));
    }

    /// Deliver `event` to every receiver, returning how many were called.
    pub fn send(&self, event: &E) -> usize {
        let receivers: Vec<Receiver<E>> = self
            .receivers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        for receiver in &receivers {
            receiver(event);
        }
        receivers.len()
    }
}

impl<E> Default for Signal<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for Signal<E> {
    fn clone(&self) -> Self {
        Self {
            receivers: Arc::clone(&self.receivers),
        }
    }
}

impl<E> std::fmt::Debug for Signal<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self
            .receivers
            .read()
            .map(|receivers| receivers.len())
            .unwrap_or_default();
        f.debug_struct("Signal").field("receivers", &count).finish()
    }
}
