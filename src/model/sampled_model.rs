use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::api::ProjectionConfig;
use crate::core::Signal;

use super::binding::ModelBinding;
use super::{ItemsChanged, ListModel, SharedModel};

/// Downsampler exposing at most `max_items` evenly spread items.
///
/// When the underlying sequence is longer than the cap, display position `d`
/// maps to `floor(d / exposed_len * real_len)`, so the exposed items still
/// span the whole sequence.
pub struct SampledModel<T: 'static> {
    this: Weak<Self>,
    binding: ModelBinding<T>,
    max_items: Cell<usize>,
    exposed_len: Cell<usize>,
    items_changed: Signal<ItemsChanged>,
}

impl<T: 'static> fmt::Debug for SampledModel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SampledModel")
            .field("max_items", &self.max_items.get())
            .field("exposed_len", &self.exposed_len.get())
            .field("real_len", &self.binding.n_items())
            .finish()
    }
}

/// `0` means unbounded.
fn effective_max_items(max_items: usize) -> usize {
    if max_items == 0 {
        usize::MAX - 1
    } else {
        max_items
    }
}

impl<T: 'static> SampledModel<T> {
    #[must_use]
    pub fn new(model: Option<SharedModel<T>>, max_items: usize) -> Rc<Self> {
        let sampled = Rc::new_cyclic(|this| Self {
            this: this.clone(),
            binding: ModelBinding::default(),
            max_items: Cell::new(effective_max_items(max_items)),
            exposed_len: Cell::new(0),
            items_changed: Signal::new(),
        });
        sampled.set_model(model);
        sampled
    }

    #[must_use]
    pub fn from_config(model: Option<SharedModel<T>>, config: &ProjectionConfig) -> Rc<Self> {
        Self::new(model, config.sampled_max_items)
    }

    #[must_use]
    pub fn model(&self) -> Option<SharedModel<T>> {
        self.binding.model()
    }

    pub fn set_model(&self, model: Option<SharedModel<T>>) {
        if self.binding.is_bound_to(model.as_ref()) {
            return;
        }

        let this = self.this.clone();
        self.binding.rebind(model, move |_change| {
            if let Some(sampled) = this.upgrade() {
                sampled.refresh();
            }
        });
        debug!(real_len = self.binding.n_items(), "sampled model rebound");
        self.refresh();
    }

    #[must_use]
    pub fn max_items(&self) -> usize {
        self.max_items.get()
    }

    pub fn set_max_items(&self, max_items: usize) {
        let max_items = effective_max_items(max_items);
        if max_items == self.max_items.get() {
            return;
        }
        self.max_items.set(max_items);
        debug!(max_items, "sampled model cap changed");
        self.refresh();
    }

    /// Length of the underlying sequence.
    #[must_use]
    pub fn real_len(&self) -> usize {
        self.binding.n_items()
    }

    /// Underlying position shown at display position `position`.
    #[must_use]
    pub fn source_position(&self, position: usize) -> Option<usize> {
        let exposed_len = self.exposed_len.get();
        if position >= exposed_len {
            return None;
        }
        let real_len = self.real_len();
        if real_len <= exposed_len {
            return Some(position);
        }
        let scaled = (position as f64 / exposed_len as f64 * real_len as f64).floor() as usize;
        Some(scaled.min(real_len - 1))
    }

    fn refresh(&self) {
        let old_len = self.exposed_len.get();
        let new_len = self.real_len().min(self.max_items.get());
        self.exposed_len.set(new_len);

        let change = ItemsChanged::replace_all(old_len, new_len);
        if !change.is_noop() {
            self.items_changed.emit(&change);
        }
    }
}

impl<T: 'static> ListModel for SampledModel<T> {
    type Item = T;

    fn n_items(&self) -> usize {
        self.exposed_len.get()
    }

    fn item(&self, position: usize) -> Option<T> {
        self.source_position(position)
            .and_then(|source| self.binding.item(source))
    }

    fn items_changed(&self) -> &Signal<ItemsChanged> {
        &self.items_changed
    }
}
