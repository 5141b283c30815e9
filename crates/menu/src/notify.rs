//! Payload-free change notification.

use std::sync::{Arc, Mutex, Weak};

type Listener = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

/// Fan-out of "something changed" signals to registered listeners.
#[derive(Default, Clone)]
pub struct ChangeNotifier {
    listeners: Arc<Mutex<Listeners>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener`. It stays registered until the returned
    /// [`Subscription`] is dropped.
    pub fn subscribe(&self, listener: impl Fn() + Send + Sync + 'static) -> Subscription {
        let id = match self.listeners.lock() {
            Ok(mut guard) => {
                let id = guard.next_id;
                guard.next_id += 1;
                guard.entries.push((id, Arc::new(listener)));
                id
            }
            Err(_) => u64::MAX,
        };
        Subscription {
            listeners: Arc::downgrade(&self.listeners),
            id,
        }
    }

    /// Calls every listener. Listeners may subscribe, unsubscribe or notify
    /// again from inside the callback.
    pub fn notify(&self) {
        let snapshot: Vec<Listener> = match self.listeners.lock() {
            Ok(guard) => guard.entries.iter().map(|(_, l)| Arc::clone(l)).collect(),
            Err(_) => return,
        };
        for listener in snapshot {
            listener();
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().map(|g| g.entries.len()).unwrap_or(0)
    }
}

/// Handle keeping a listener registered. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    listeners: Weak<Mutex<Listeners>>,
    id: u64,
}

impl Subscription {
    /// Unsubscribes explicitly; same as dropping.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade()
            && let Ok(mut guard) = listeners.lock()
        {
            guard.entries.retain(|(id, _)| *id != self.id);
        }
    }
}
