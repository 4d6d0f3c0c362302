//! Subscription handles for live queries.
//!
//! The callback lives behind a mutex that is held while it runs. Dropping the handle takes
//! the callback out under the same lock and aborts the feed task, so once `unsubscribe`
//! (or drop) returns, the callback will never run again.

use super::{Document, UpdateCallback};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;

type CallbackSlot = Arc<Mutex<Option<UpdateCallback>>>;

/// Handed to a feed task; forwards result sets to the subscriber's callback.
#[derive(Clone)]
pub struct Delivery {
    slot: CallbackSlot,
}

impl Delivery {
    /// Runs the callback with `documents`. Returns false once the subscription is gone, at
    /// which point the feed should stop.
    pub fn deliver(&self, documents: Vec<Document>) -> bool {
        let mut guard = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_mut() {
            Some(callback) => {
                callback(documents);
                true
            }
            None => false,
        }
    }
}

/// Active live query. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    slot: CallbackSlot,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Spawns `feed` on the current tokio runtime with a [`Delivery`] bound to `on_update`.
    pub fn spawn<F, Fut>(on_update: UpdateCallback, feed: F) -> Self
    where
        F: FnOnce(Delivery) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let slot: CallbackSlot = Arc::new(Mutex::new(Some(on_update)));
        let delivery = Delivery { slot: slot.clone() };
        let task = tokio::spawn(feed(delivery));
        Self {
            slot,
            task: Some(task),
        }
    }

    pub fn unsubscribe(self) {}

    pub fn is_active(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
