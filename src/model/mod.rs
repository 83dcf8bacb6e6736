//! Read-only list adapters chained between raw event stores and charts.
//!
//! Every adapter implements [`ListModel`] and republishes structural changes
//! through its own `items_changed` signal, synchronously and in causal order.
//! Only [`NormalizedSeries`] defers work (its recompute runs on a
//! [`crate::scheduler::Scheduler`]).

mod binding;
mod normalized_series;
mod sampled_model;
mod series;
mod time_filter_model;
mod vec_model;

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::core::Signal;

pub use normalized_series::{NormalizedItem, NormalizedSeries};
pub use sampled_model::SampledModel;
pub use series::{
    IdentityKind, Series, SeriesKind, TimeSeries, TimeSeriesItem, TimeSeriesKind, XyItem,
    XyKind, XySeries,
};
pub use time_filter_model::{Slice, TimeFilterModel};
pub use vec_model::VecModel;

/// Structural change: `removed` items at `position` were replaced by `added` items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemsChanged {
    pub position: usize,
    pub removed: usize,
    pub added: usize,
}

impl ItemsChanged {
    #[must_use]
    pub const fn new(position: usize, removed: usize, added: usize) -> Self {
        Self {
            position,
            removed,
            added,
        }
    }

    /// Whole-list replacement from `old_len` to `new_len` items.
    #[must_use]
    pub const fn replace_all(old_len: usize, new_len: usize) -> Self {
        Self::new(0, old_len, new_len)
    }

    /// In-place update of `count` items starting at `position`.
    #[must_use]
    pub const fn update(position: usize, count: usize) -> Self {
        Self::new(position, count, count)
    }

    #[must_use]
    pub const fn is_noop(self) -> bool {
        self.removed == 0 && self.added == 0
    }
}

/// Indexable sequence with structural change notification.
pub trait ListModel {
    type Item;

    fn n_items(&self) -> usize;

    /// `None` for out-of-range positions.
    fn item(&self, position: usize) -> Option<Self::Item>;

    fn items_changed(&self) -> &Signal<ItemsChanged>;

    fn is_empty(&self) -> bool {
        self.n_items() == 0
    }
}

/// Type-erased shared model, the unit chained between adapters.
pub type SharedModel<T> = Rc<dyn ListModel<Item = T>>;

/// Extraction function applied to raw items.
pub type Extract<T, V> = Rc<dyn Fn(&T) -> V>;
