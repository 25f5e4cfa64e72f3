//! Explicit event subscriptions.
//!
//! Components that want to react to shell events register a listener and
//! keep the returned [`Subscription`]. Dropping it unregisters the listener,
//! so teardown happens exactly when the subscriber goes away.
//!
//! Everything runs on the interaction thread; the bus is not `Send`.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

type Listener<E> = Box<dyn FnMut(&E)>;

struct Registry<E> {
    next_id: u64,
    listeners: Vec<(u64, Listener<E>)>,
    /// Ids unsubscribed while their listener was running.
    dropped: Vec<u64>,
}

/// Synchronous fan-out of events to registered listeners.
pub struct EventBus<E> {
    registry: Rc<RefCell<Registry<E>>>,
}

impl<E: 'static> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> EventBus<E> {
    pub fn new() -> Self {
        Self {
            registry: Rc::new(RefCell::new(Registry {
                next_id: 0,
                listeners: Vec::new(),
                dropped: Vec::new(),
            })),
        }
    }

    /// Registers `listener` until the returned subscription is dropped.
    #[must_use = "dropping the subscription unregisters the listener"]
    pub fn subscribe(&self, listener: impl FnMut(&E) + 'static) -> Subscription {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.push((id, Box::new(listener)));

        let weak: Weak<RefCell<Registry<E>>> = Rc::downgrade(&self.registry);
        Subscription {
            unsubscribe: Some(Box::new(move || {
                let Some(registry) = weak.upgrade() else {
                    return;
                };
                let mut registry = registry.borrow_mut();
                let before = registry.listeners.len();
                registry.listeners.retain(|(lid, _)| *lid != id);
                if registry.listeners.len() == before {
                    registry.dropped.push(id);
                }
            })),
        }
    }

    /// Delivers `event` to every listener, in subscription order.
    ///
    /// Listeners may subscribe or unsubscribe while being called; changes
    /// take effect from the next emit.
    pub fn emit(&self, event: &E) {
        let mut running = std::mem::take(&mut self.registry.borrow_mut().listeners);
        for (_, listener) in running.iter_mut() {
            listener(event);
        }

        let mut registry = self.registry.borrow_mut();
        let dropped = std::mem::take(&mut registry.dropped);
        running.retain(|(id, _)| !dropped.contains(id));
        running.append(&mut registry.listeners);
        registry.listeners = running;
    }

    pub fn listener_count(&self) -> usize {
        self.registry.borrow().listeners.len()
    }
}

/// Keeps a listener registered for as long as it lives.
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Unregisters now instead of at drop.
    pub fn cancel(mut self) {
        if let Some(f) = self.unsubscribe.take() {
            f();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(f) = self.unsubscribe.take() {
            f();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn dropping_subscription_stops_delivery() {
        let bus = EventBus::<u32>::new();
        let seen = Rc::new(Cell::new(0));

        let counter = seen.clone();
        let sub = bus.subscribe(move |n| counter.set(counter.get() + n));
        bus.emit(&2);
        drop(sub);
        bus.emit(&5);

        assert_eq!(seen.get(), 2);
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn subscription_may_outlive_bus() {
        let bus = EventBus::<()>::new();
        let sub = bus.subscribe(|_| {});
        drop(bus);
        sub.cancel();
    }

    #[test]
    fn listener_can_cancel_itself_during_emit() {
        let bus = EventBus::<()>::new();
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let calls = Rc::new(Cell::new(0));

        let (s, c) = (slot.clone(), calls.clone());
        let sub = bus.subscribe(move |_| {
            c.set(c.get() + 1);
            s.borrow_mut().take();
        });
        *slot.borrow_mut() = Some(sub);

        bus.emit(&());
        bus.emit(&());
        assert_eq!(calls.get(), 1);
        assert_eq!(bus.listener_count(), 0);
    }
}
