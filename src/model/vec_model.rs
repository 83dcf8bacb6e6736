use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::core::Signal;

use super::{ItemsChanged, ListModel, SharedModel};

/// Plain in-memory list model; the raw event store at the top of a chain.
pub struct VecModel<T> {
    items: RefCell<Vec<T>>,
    items_changed: Signal<ItemsChanged>,
}

impl<T> fmt::Debug for VecModel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VecModel")
            .field("len", &self.items.borrow().len())
            .finish()
    }
}

impl<T: Clone + 'static> Default for VecModel<T> {
    fn default() -> Self {
        Self::from_vec(Vec::new())
    }
}

impl<T: Clone + 'static> VecModel<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            items: RefCell::new(items),
            items_changed: Signal::new(),
        }
    }

    /// Wraps `self` for chaining into adapters.
    #[must_use]
    pub fn into_shared(self) -> SharedModel<T> {
        Rc::new(self)
    }

    /// Replaces `removed` items at `position` with `added`.
    ///
    /// `position` and `removed` are clamped to the current length.
    pub fn splice<I>(&self, position: usize, removed: usize, added: I)
    where
        I: IntoIterator<Item = T>,
    {
        let change = {
            let mut items = self.items.borrow_mut();
            let position = position.min(items.len());
            let removed = removed.min(items.len() - position);
            let before = items.len();
            items.splice(position..position + removed, added);
            let added = items.len() + removed - before;
            ItemsChanged::new(position, removed, added)
        };

        if change.is_noop() {
            return;
        }
        trace!(
            position = change.position,
            removed = change.removed,
            added = change.added,
            "vec model spliced"
        );
        self.items_changed.emit(&change);
    }

    pub fn append<I>(&self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        let len = self.len();
        self.splice(len, 0, items);
    }

    pub fn push(&self, item: T) {
        self.append(std::iter::once(item));
    }

    pub fn remove(&self, position: usize) -> Option<T> {
        let item = self.items.borrow().get(position).cloned()?;
        self.splice(position, 1, std::iter::empty());
        Some(item)
    }

    pub fn clear(&self) {
        let len = self.len();
        self.splice(0, len, std::iter::empty());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    /// Borrows the backing storage for bulk reads.
    pub fn with_items<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.items.borrow())
    }
}

impl<T: Clone + 'static> ListModel for VecModel<T> {
    type Item = T;

    fn n_items(&self) -> usize {
        self.len()
    }

    fn item(&self, position: usize) -> Option<T> {
        self.items.borrow().get(position).cloned()
    }

    fn items_changed(&self) -> &Signal<ItemsChanged> {
        &self.items_changed
    }
}
