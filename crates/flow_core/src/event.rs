//! One-shot events: payloads that are acted upon by at most one observer, once.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tokio::sync::watch;

#[derive(Debug)]
pub struct OneShot<T> {
    content: T,
    handled: AtomicBool,
}

impl<T> OneShot<T> {
    pub fn new(content: T) -> Self {
        Self {
            content,
            handled: AtomicBool::new(false),
        }
    }

    /// Returns the payload the first time it is called and `None` afterwards.
    pub fn take_if_unhandled(&self) -> Option<&T> {
        if self.handled.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(&self.content)
        }
    }

    pub fn apply_if_unhandled(&self, f: impl FnOnce(&T)) {
        if let Some(content) = self.take_if_unhandled() {
            f(content);
        }
    }

    pub fn peek(&self) -> &T {
        &self.content
    }

    pub fn is_handled(&self) -> bool {
        self.handled.load(Ordering::Acquire)
    }
}

pub type EventReceiver<T> = watch::Receiver<Option<Arc<OneShot<T>>>>;

/// Holds the most recent one-shot event. Late subscribers see it, already consumed
/// if an earlier observer handled it.
#[derive(Debug)]
pub struct EventChannel<T> {
    sender: watch::Sender<Option<Arc<OneShot<T>>>>,
}

impl<T> Default for EventChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EventChannel<T> {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self { sender }
    }

    pub fn emit(&self, content: T) {
        self.sender.send_replace(Some(Arc::new(OneShot::new(content))));
    }

    pub fn subscribe(&self) -> EventReceiver<T> {
        self.sender.subscribe()
    }

    pub fn latest(&self) -> Option<Arc<OneShot<T>>> {
        self.sender.borrow().clone()
    }
}

/// Waits for the next emission on `receiver`. `None` once the channel is closed.
pub async fn next_event<T>(receiver: &mut EventReceiver<T>) -> Option<Arc<OneShot<T>>> {
    receiver.changed().await.ok()?;
    receiver.borrow_and_update().clone()
}
