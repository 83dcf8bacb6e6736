//! Single-threaded change notification.
//!
//! A [`Signal`] keeps its handlers in registration order and delivers
//! synchronously on the emitting call stack. Handlers are snapshotted before
//! delivery, so a handler may connect or disconnect others (or itself) while
//! a notification is in flight; a handler disconnected mid-emission is not
//! invoked for the remainder of that emission.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use smallvec::SmallVec;

type Handler<A> = Rc<dyn Fn(&A)>;

struct Registry<A: 'static> {
    next_id: Cell<u64>,
    handlers: RefCell<IndexMap<u64, Handler<A>>>,
}

pub struct Signal<A: 'static> {
    registry: Rc<Registry<A>>,
}

impl<A: 'static> Default for Signal<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: 'static> fmt::Debug for Signal<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("handlers", &self.handler_count())
            .finish()
    }
}

impl<A: 'static> Signal<A> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Rc::new(Registry {
                next_id: Cell::new(1),
                handlers: RefCell::new(IndexMap::new()),
            }),
        }
    }

    /// Registers `handler`; it stays connected until the returned guard drops.
    #[must_use = "dropping the subscription disconnects the handler"]
    pub fn connect<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&A) + 'static,
    {
        let id = self.registry.next_id.get();
        self.registry.next_id.set(id + 1);
        self.registry
            .handlers
            .borrow_mut()
            .insert(id, Rc::new(handler));

        let registry: Weak<Registry<A>> = Rc::downgrade(&self.registry);
        Subscription {
            disconnect: Some(Box::new(move || {
                if let Some(registry) = registry.upgrade() {
                    registry.handlers.borrow_mut().shift_remove(&id);
                }
            })),
        }
    }

    pub fn emit(&self, args: &A) {
        let snapshot: SmallVec<[(u64, Handler<A>); 4]> = self
            .registry
            .handlers
            .borrow()
            .iter()
            .map(|(id, handler)| (*id, Rc::clone(handler)))
            .collect();

        for (id, handler) in snapshot {
            let still_connected = self.registry.handlers.borrow().contains_key(&id);
            if still_connected {
                handler(args);
            }
        }
    }

    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.registry.handlers.borrow().len()
    }
}

/// RAII connection guard returned by [`Signal::connect`].
pub struct Subscription {
    disconnect: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Disconnects immediately instead of waiting for drop.
    pub fn disconnect(mut self) {
        if let Some(disconnect) = self.disconnect.take() {
            disconnect();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("connected", &self.disconnect.is_some())
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(disconnect) = self.disconnect.take() {
            disconnect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handlers_run_in_registration_order() {
        let signal = Signal::<u32>::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let first_log = Rc::clone(&log);
        let _first = signal.connect(move |v| first_log.borrow_mut().push(("first", *v)));
        let second_log = Rc::clone(&log);
        let _second = signal.connect(move |v| second_log.borrow_mut().push(("second", *v)));

        signal.emit(&7);
        assert_eq!(*log.borrow(), vec![("first", 7), ("second", 7)]);
    }

    #[test]
    fn dropping_subscription_disconnects() {
        let signal = Signal::<()>::new();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let subscription = signal.connect(move |()| counter.set(counter.get() + 1));

        signal.emit(&());
        drop(subscription);
        signal.emit(&());

        assert_eq!(hits.get(), 1);
        assert_eq!(signal.handler_count(), 0);
    }

    #[test]
    fn handler_disconnected_mid_emission_is_skipped() {
        let signal = Rc::new(Signal::<()>::new());
        let victim_slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let victim_hits = Rc::new(Cell::new(0));

        let slot = Rc::clone(&victim_slot);
        let _killer = signal.connect(move |()| {
            slot.borrow_mut().take();
        });
        let hits = Rc::clone(&victim_hits);
        *victim_slot.borrow_mut() = Some(signal.connect(move |()| hits.set(hits.get() + 1)));

        signal.emit(&());
        assert_eq!(victim_hits.get(), 0);
    }
}
