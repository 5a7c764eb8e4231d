use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use super::ProviderEvent;

type Listeners = Arc<Mutex<HashMap<u64, mpsc::UnboundedSender<ProviderEvent>>>>;

/// Fan-out of provider notifications to every live [`Subscription`].
#[derive(Clone, Default)]
pub struct ProviderEventHub {
    listeners: Listeners,
    next_id: Arc<AtomicU64>,
}

impl ProviderEventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.insert(id, tx);
        }

        let listeners = Arc::downgrade(&self.listeners);
        Subscription::new(rx, move || {
            if let Some(listeners) = listeners.upgrade()
                && let Ok(mut listeners) = listeners.lock()
            {
                listeners.remove(&id);
            }
        })
    }

    /// Delivers `event` to all listeners and returns how many received it.
    pub fn emit(&self, event: ProviderEvent) -> usize {
        let Ok(mut listeners) = self.listeners.lock() else {
            return 0;
        };
        listeners.retain(|_, tx| tx.send(event.clone()).is_ok());
        listeners.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().map(|l| l.len()).unwrap_or(0)
    }
}

/// A registered provider listener. Dropping it unregisters the listener.
pub struct Subscription {
    events: mpsc::UnboundedReceiver<ProviderEvent>,
    unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new(events: mpsc::UnboundedReceiver<ProviderEvent>, unsubscribe: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            events,
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// Next already-delivered event, without waiting.
    pub fn try_next(&mut self) -> Option<ProviderEvent> {
        self.events.try_recv().ok()
    }

    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
        self.events.close();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}
