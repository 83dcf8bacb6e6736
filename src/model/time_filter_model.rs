use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::api::ProjectionConfig;
use crate::core::{Signal, TimeSpan};
use crate::document::Timed;

use super::binding::ModelBinding;
use super::{Extract, ItemsChanged, ListModel, SharedModel};

/// Contiguous range `[offset, offset + len)` of the underlying sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Slice {
    pub offset: usize,
    pub len: usize,
}

impl Slice {
    #[must_use]
    pub const fn end(self) -> usize {
        self.offset + self.len
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }
}

/// Window over an ascending-time sequence exposing items with
/// `window.begin <= time <= window.end`.
///
/// The slice is located with two binary searches and recomputed from scratch
/// whenever the window or the underlying sequence changes.
pub struct TimeFilterModel<T: 'static> {
    this: Weak<Self>,
    binding: ModelBinding<T>,
    time_fn: RefCell<Extract<T, i64>>,
    window: Cell<TimeSpan>,
    inclusive: Cell<bool>,
    slice: Cell<Slice>,
    items_changed: Signal<ItemsChanged>,
}

impl<T: 'static> fmt::Debug for TimeFilterModel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeFilterModel")
            .field("window", &self.window.get())
            .field("inclusive", &self.inclusive.get())
            .field("slice", &self.slice.get())
            .finish()
    }
}

impl<T: Timed + 'static> TimeFilterModel<T> {
    #[must_use]
    pub fn new(model: Option<SharedModel<T>>, window: TimeSpan) -> Rc<Self> {
        Self::with_time_fn(model, window, |item: &T| item.time_nsec())
    }

    /// Builds a filter whose `inclusive` flag follows `config`.
    #[must_use]
    pub fn from_config(
        model: Option<SharedModel<T>>,
        window: TimeSpan,
        config: &ProjectionConfig,
    ) -> Rc<Self> {
        let filter = Self::new(model, window);
        filter.set_inclusive(config.time_filter_inclusive);
        filter
    }
}

impl<T: 'static> TimeFilterModel<T> {
    /// Like [`TimeFilterModel::new`] but reads timestamps through `time_fn`.
    #[must_use]
    pub fn with_time_fn<F>(model: Option<SharedModel<T>>, window: TimeSpan, time_fn: F) -> Rc<Self>
    where
        F: Fn(&T) -> i64 + 'static,
    {
        let filter = Rc::new_cyclic(|this| Self {
            this: this.clone(),
            binding: ModelBinding::default(),
            time_fn: RefCell::new(Rc::new(time_fn)),
            window: Cell::new(window),
            inclusive: Cell::new(false),
            slice: Cell::new(Slice::default()),
            items_changed: Signal::new(),
        });
        filter.set_model(model);
        filter
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
        self.binding.rebind(model, move |change| {
            if let Some(filter) = this.upgrade() {
                filter.source_items_changed(*change);
            }
        });

        let old = self.slice.get();
        let new = self.refresh_slice();
        debug!(old_len = old.len, new_len = new.len, "time filter model rebound");
        self.emit_replace(old, new);
    }

    #[must_use]
    pub fn window(&self) -> TimeSpan {
        self.window.get()
    }

    /// Moves the window; notifies only when the exposed slice changed.
    pub fn set_window(&self, window: TimeSpan) {
        if window == self.window.get() {
            return;
        }
        self.window.set(window);

        let old = self.slice.get();
        let new = self.refresh_slice();
        debug!(
            begin = window.begin_nsec,
            end = window.end_nsec,
            offset = new.offset,
            len = new.len,
            "time filter window moved"
        );
        if new != old {
            self.emit_replace(old, new);
        }
    }

    #[must_use]
    pub fn is_inclusive(&self) -> bool {
        self.inclusive.get()
    }

    /// Widens the slice by one item on each side where such an item exists.
    pub fn set_inclusive(&self, inclusive: bool) {
        if inclusive == self.inclusive.get() {
            return;
        }
        self.inclusive.set(inclusive);

        let old = self.slice.get();
        let new = self.refresh_slice();
        if new != old {
            self.emit_replace(old, new);
        }
    }

    pub fn set_time_fn<F>(&self, time_fn: F)
    where
        F: Fn(&T) -> i64 + 'static,
    {
        *self.time_fn.borrow_mut() = Rc::new(time_fn);

        let old = self.slice.get();
        let new = self.refresh_slice();
        self.emit_replace(old, new);
    }

    /// Current exposed range of the underlying sequence.
    #[must_use]
    pub fn slice(&self) -> Slice {
        self.slice.get()
    }

    /// Position in the underlying sequence of exposed item `position`.
    #[must_use]
    pub fn source_position(&self, position: usize) -> Option<usize> {
        let slice = self.slice.get();
        (position < slice.len).then(|| slice.offset + position)
    }

    fn source_items_changed(&self, change: ItemsChanged) {
        let old = self.slice.get();
        let new = self.refresh_slice();

        let after_slice = change.position >= old.end();
        let in_place_before = change.position + change.removed <= old.offset
            && change.removed == change.added;
        if new == old && (after_slice || in_place_before) {
            trace!(position = change.position, "time filter ignores change outside window");
            return;
        }
        if after_slice && new.offset == old.offset {
            self.emit_tail(old, new);
            return;
        }
        self.emit_replace(old, new);
    }

    /// The exposed prefix is untouched; only the items past it differ.
    fn emit_tail(&self, old: Slice, new: Slice) {
        let kept = old.len.min(new.len);
        let change = ItemsChanged::new(kept, old.len - kept, new.len - kept);
        trace!(
            position = change.position,
            removed = change.removed,
            added = change.added,
            "time filter extends its tail"
        );
        self.items_changed.emit(&change);
    }

    fn emit_replace(&self, old: Slice, new: Slice) {
        let change = ItemsChanged::replace_all(old.len, new.len);
        if !change.is_noop() {
            self.items_changed.emit(&change);
        }
    }

    fn refresh_slice(&self) -> Slice {
        let slice = match self.binding.model() {
            Some(model) => {
                let time_fn = self.time_fn.borrow().clone();
                compute_slice(
                    model.as_ref(),
                    time_fn.as_ref(),
                    self.window.get(),
                    self.inclusive.get(),
                )
            }
            None => Slice::default(),
        };
        self.slice.set(slice);
        slice
    }
}

impl<T: 'static> ListModel for TimeFilterModel<T> {
    type Item = T;

    fn n_items(&self) -> usize {
        self.slice.get().len
    }

    fn item(&self, position: usize) -> Option<T> {
        self.source_position(position)
            .and_then(|source| self.binding.item(source))
    }

    fn items_changed(&self) -> &Signal<ItemsChanged> {
        &self.items_changed
    }
}

fn compute_slice<T>(
    model: &dyn ListModel<Item = T>,
    time_fn: &dyn Fn(&T) -> i64,
    window: TimeSpan,
    inclusive: bool,
) -> Slice {
    let n_items = model.n_items();
    if window.is_unbounded() {
        return Slice {
            offset: 0,
            len: n_items,
        };
    }
    if window.begin_nsec > window.end_nsec {
        return Slice::default();
    }

    let time_at = |position: usize| model.item(position).map(|item| time_fn(&item));
    let mut first = partition_point(n_items, |i| time_at(i).is_some_and(|t| t < window.begin_nsec));
    let mut end = partition_point(n_items, |i| time_at(i).is_some_and(|t| t <= window.end_nsec));

    if inclusive && n_items > 0 {
        first = first.saturating_sub(1);
        end = (end + 1).min(n_items);
    }

    if first >= end {
        return Slice {
            offset: first.min(n_items),
            len: 0,
        };
    }
    Slice {
        offset: first,
        len: end - first,
    }
}

/// First position in `0..len` for which `pred` is false, assuming `pred`
/// holds for a prefix of the range.
fn partition_point(len: usize, mut pred: impl FnMut(usize) -> bool) -> usize {
    let mut low = 0;
    let mut high = len;
    while low < high {
        let mid = low + (high - low) / 2;
        if pred(mid) {
            low = mid + 1;
        } else {
            high = mid;
        }
    }
    low
}
