use std::cell::RefCell;
use std::rc::Rc;

use crate::core::Subscription;

use super::{ItemsChanged, SharedModel};

/// Upstream model reference plus its `items_changed` connection.
///
/// Shared by every adapter so rebinding and forwarding behave uniformly.
pub(crate) struct ModelBinding<T: 'static> {
    model: RefCell<Option<SharedModel<T>>>,
    subscription: RefCell<Option<Subscription>>,
}

impl<T: 'static> Default for ModelBinding<T> {
    fn default() -> Self {
        Self {
            model: RefCell::new(None),
            subscription: RefCell::new(None),
        }
    }
}

impl<T: 'static> ModelBinding<T> {
    pub(crate) fn model(&self) -> Option<SharedModel<T>> {
        self.model.borrow().clone()
    }

    pub(crate) fn is_bound_to(&self, model: Option<&SharedModel<T>>) -> bool {
        match (self.model.borrow().as_ref(), model) {
            (Some(current), Some(candidate)) => Rc::ptr_eq(current, candidate),
            (None, None) => true,
            _ => false,
        }
    }

    pub(crate) fn n_items(&self) -> usize {
        self.model().map_or(0, |model| model.n_items())
    }

    pub(crate) fn item(&self, position: usize) -> Option<T> {
        self.model().and_then(|model| model.item(position))
    }

    /// Swaps the upstream model and routes its changes to `on_changed`.
    ///
    /// Returns `(old_len, new_len)` so the caller can publish the synthetic
    /// whole-list replacement.
    pub(crate) fn rebind<F>(&self, model: Option<SharedModel<T>>, on_changed: F) -> (usize, usize)
    where
        F: Fn(&ItemsChanged) + 'static,
    {
        let old_len = self.n_items();

        self.subscription.borrow_mut().take();
        let subscription = model
            .as_ref()
            .map(|model| model.items_changed().connect(on_changed));
        let new_len = model.as_ref().map_or(0, |model| model.n_items());

        *self.model.borrow_mut() = model;
        *self.subscription.borrow_mut() = subscription;

        (old_len, new_len)
    }

    pub(crate) fn unbind(&self) {
        self.subscription.borrow_mut().take();
        self.model.borrow_mut().take();
    }
}
