//! Incrementally maintained axis coordinates for every item of a series.
//!
//! Each position is either valid or *missing*. Upstream splices, axis range
//! changes and reconfiguration mark positions missing; a cooperative task on
//! the [`Scheduler`] walks the missing set in ascending order, writes
//! `axis.normalize(extract(item))` and publishes one in-place update per
//! contiguous run of recomputed positions. Reads never wait: a missing
//! position reads as `0.0`.
//!
//! While the axis is pathological (`min == max`) nothing is scheduled and
//! range changes do not invalidate, so previously computed values stay
//! frozen until the axis becomes well-formed again.

use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Instant;

use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use crate::core::{Axis, AxisRange, AxisValue, IndexSet, Signal, Subscription};
use crate::scheduler::{DEADLINE_CHECK_INTERVAL, Scheduler, TaskHandle, TaskStatus};

use super::binding::ModelBinding;
use super::{Extract, ItemsChanged, ListModel, SharedModel};

/// Raw item paired with its current normalized value.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedItem<T> {
    pub item: T,
    pub value: f64,
}

#[derive(Debug, Default)]
struct NormalizedState {
    values: Vec<f64>,
    missing: IndexSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Invalidation {
    RangeChanged,
    Reconfigured,
}

pub struct NormalizedSeries<T: 'static> {
    this: Weak<Self>,
    scheduler: Scheduler,
    binding: ModelBinding<T>,
    axis: RefCell<Option<Rc<dyn Axis>>>,
    axis_subscription: RefCell<Option<Subscription>>,
    extract: RefCell<Option<Extract<T, AxisValue>>>,
    state: RefCell<NormalizedState>,
    scheduled_update: Cell<Option<TaskHandle>>,
    disposed: Cell<bool>,
    inverted: Cell<bool>,
    title: RefCell<Option<String>>,
    items_changed: Signal<ItemsChanged>,
}

impl<T: 'static> fmt::Debug for NormalizedSeries<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("NormalizedSeries")
            .field("title", &self.title.borrow())
            .field("n_values", &state.values.len())
            .field("missing", &state.missing.len())
            .field("scheduled", &self.scheduled_update.get().is_some())
            .field("inverted", &self.inverted.get())
            .field("disposed", &self.disposed.get())
            .finish()
    }
}

impl<T: 'static> NormalizedSeries<T> {
    /// Creates a series whose recompute slices run on `scheduler`.
    ///
    /// Any of `series`, `axis` and `extract` may be supplied later; values
    /// are only computed once all three are present.
    #[must_use]
    pub fn new(
        scheduler: &Scheduler,
        series: Option<SharedModel<T>>,
        axis: Option<Rc<dyn Axis>>,
        extract: Option<Extract<T, AxisValue>>,
    ) -> Rc<Self> {
        let normalized = Rc::new_cyclic(|this| Self {
            this: this.clone(),
            scheduler: scheduler.clone(),
            binding: ModelBinding::default(),
            axis: RefCell::new(None),
            axis_subscription: RefCell::new(None),
            extract: RefCell::new(extract),
            state: RefCell::new(NormalizedState::default()),
            scheduled_update: Cell::new(None),
            disposed: Cell::new(false),
            inverted: Cell::new(false),
            title: RefCell::new(None),
            items_changed: Signal::new(),
        });
        normalized.set_axis(axis);
        normalized.set_series(series);
        normalized
    }

    /// Convenience constructor with all collaborators present.
    #[must_use]
    pub fn with_extract<F>(
        scheduler: &Scheduler,
        series: SharedModel<T>,
        axis: Rc<dyn Axis>,
        extract: F,
    ) -> Rc<Self>
    where
        F: Fn(&T) -> AxisValue + 'static,
    {
        Self::new(scheduler, Some(series), Some(axis), Some(Rc::new(extract)))
    }

    #[must_use]
    pub fn series(&self) -> Option<SharedModel<T>> {
        self.binding.model()
    }

    /// Rebinds the underlying series; every position becomes missing.
    pub fn set_series(&self, series: Option<SharedModel<T>>) {
        if self.disposed.get() || self.binding.is_bound_to(series.as_ref()) {
            return;
        }

        let this = self.this.clone();
        let (old_len, new_len) = self.binding.rebind(series, move |change| {
            if let Some(normalized) = this.upgrade() {
                normalized.source_items_changed(*change);
            }
        });

        debug!(old_len, new_len, "normalized series rebound");
        self.source_items_changed(ItemsChanged::replace_all(old_len, new_len));
    }

    #[must_use]
    pub fn axis(&self) -> Option<Rc<dyn Axis>> {
        self.axis.borrow().clone()
    }

    /// Replaces the axis; every position becomes missing.
    pub fn set_axis(&self, axis: Option<Rc<dyn Axis>>) {
        if self.disposed.get() {
            return;
        }
        let unchanged = match (self.axis.borrow().as_ref(), axis.as_ref()) {
            (Some(current), Some(candidate)) => Rc::ptr_eq(current, candidate),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return;
        }

        self.axis_subscription.borrow_mut().take();
        let subscription = axis.as_ref().map(|axis| {
            let this = self.this.clone();
            axis.range_changed().connect(move |range: &AxisRange| {
                if let Some(normalized) = this.upgrade() {
                    trace!(min = range.min, max = range.max, "normalized series axis moved");
                    normalized.invalidate(Invalidation::RangeChanged);
                }
            })
        });
        *self.axis.borrow_mut() = axis;
        *self.axis_subscription.borrow_mut() = subscription;

        debug!("normalized series axis replaced");
        self.invalidate(Invalidation::Reconfigured);
    }

    /// Replaces the value extractor; every position becomes missing.
    pub fn set_extract(&self, extract: Option<Extract<T, AxisValue>>) {
        if self.disposed.get() {
            return;
        }
        *self.extract.borrow_mut() = extract;
        self.invalidate(Invalidation::Reconfigured);
    }

    #[must_use]
    pub fn is_inverted(&self) -> bool {
        self.inverted.get()
    }

    /// Stores `1 - normalize(v)` instead of `normalize(v)`.
    pub fn set_inverted(&self, inverted: bool) {
        if inverted != self.inverted.get() {
            self.inverted.set(inverted);
            self.invalidate(Invalidation::Reconfigured);
        }
    }

    #[must_use]
    pub fn title(&self) -> Option<String> {
        self.title.borrow().clone()
    }

    pub fn set_title(&self, title: Option<String>) {
        *self.title.borrow_mut() = title;
    }

    /// Normalized value at `position`; `0.0` while missing or out of range.
    #[must_use]
    pub fn value_at(&self, position: usize) -> f64 {
        let state = self.state.borrow();
        if position >= state.values.len() || state.missing.contains(position) {
            return 0.0;
        }
        state.values[position]
    }

    /// Materialized values, parallel to the underlying series.
    ///
    /// Entries of missing positions hold their last computed value (or `0.0`
    /// for freshly inserted ones); use [`NormalizedSeries::value_at`] when the
    /// zero sentinel matters. Do not hold the borrow across pipeline mutations.
    #[must_use]
    pub fn values(&self) -> Ref<'_, [f64]> {
        Ref::map(self.state.borrow(), |state| state.values.as_slice())
    }

    #[must_use]
    pub fn missing_count(&self) -> usize {
        self.state.borrow().missing.len()
    }

    #[must_use]
    pub fn is_missing(&self, position: usize) -> bool {
        self.state.borrow().missing.contains(position)
    }

    /// `true` while a recompute task is queued.
    #[must_use]
    pub fn is_update_scheduled(&self) -> bool {
        self.scheduled_update.get().is_some()
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    /// Tears down: cancels the pending task and drops every collaborator.
    ///
    /// A slice already queued on the scheduler observes the flag and exits
    /// without touching state.
    pub fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        self.scheduler.clear(&self.scheduled_update);
        self.axis_subscription.borrow_mut().take();
        self.axis.borrow_mut().take();
        self.extract.borrow_mut().take();
        self.binding.unbind();
        debug!("normalized series disposed");
    }

    fn can_compute(&self) -> bool {
        let axis_ready = self
            .axis
            .borrow()
            .as_ref()
            .is_some_and(|axis| !axis.is_pathological());
        axis_ready && self.extract.borrow().is_some() && self.binding.model().is_some()
    }

    fn source_items_changed(&self, change: ItemsChanged) {
        if self.disposed.get() {
            return;
        }

        let change = {
            let mut state = self.state.borrow_mut();
            let len = state.values.len();
            let position = change.position.min(len);
            let removed = change.removed.min(len - position);
            let added = change.added;

            state.missing.splice(position, removed, added);
            state.missing.add_range(position, added);
            state
                .values
                .splice(position..position + removed, std::iter::repeat_n(0.0, added));

            ItemsChanged::new(position, removed, added)
        };

        if !change.is_noop() {
            self.items_changed.emit(&change);
        }
        self.maybe_update();
    }

    fn invalidate(&self, reason: Invalidation) {
        if self.disposed.get() {
            return;
        }

        if reason == Invalidation::RangeChanged {
            let pathological = self
                .axis
                .borrow()
                .as_ref()
                .is_some_and(|axis| axis.is_pathological());
            if pathological {
                trace!("axis is pathological; keeping normalized values frozen");
                return;
            }
        }

        let n_items = {
            let mut state = self.state.borrow_mut();
            let n_items = state.values.len();
            state.missing.clear();
            state.missing.add_range(0, n_items);
            n_items
        };

        if n_items > 0 {
            self.items_changed.emit(&ItemsChanged::update(0, n_items));
            self.maybe_update();
        }
    }

    fn maybe_update(&self) {
        if self.disposed.get() || self.scheduled_update.get().is_some() {
            return;
        }
        if self.state.borrow().missing.is_empty() || !self.can_compute() {
            return;
        }

        let this = self.this.clone();
        let handle = self.scheduler.add(move |deadline| match this.upgrade() {
            Some(normalized) => normalized.update_missing(deadline),
            None => {
                warn!("normalized series dropped with a recompute pending");
                TaskStatus::Done
            }
        });
        self.scheduled_update.set(Some(handle));
    }

    /// One scheduler slice of the recompute pass.
    fn update_missing(&self, deadline: Instant) -> TaskStatus {
        if self.disposed.get() {
            return TaskStatus::Done;
        }
        if !self.can_compute() {
            self.scheduled_update.set(None);
            return TaskStatus::Done;
        }

        let model = self.binding.model();
        let axis = self.axis.borrow().clone();
        let extract = self.extract.borrow().clone();
        let (Some(model), Some(axis), Some(extract)) = (model, axis, extract) else {
            self.scheduled_update.set(None);
            return TaskStatus::Done;
        };
        let inverted = self.inverted.get();

        let mut runs: SmallVec<[ItemsChanged; 4]> = SmallVec::new();
        let mut processed = 0usize;
        {
            let mut state = self.state.borrow_mut();
            let mut run: Option<(usize, usize)> = None;

            while let Some(position) = state.missing.pop_first() {
                let normalized = model
                    .item(position)
                    .map_or(0.0, |item| axis.normalize_value(extract(&item)));
                if let Some(slot) = state.values.get_mut(position) {
                    *slot = if inverted { 1.0 - normalized } else { normalized };
                }
                processed += 1;

                run = match run {
                    Some((first, count)) if first + count == position => Some((first, count + 1)),
                    Some((first, count)) => {
                        runs.push(ItemsChanged::update(first, count));
                        Some((position, 1))
                    }
                    None => Some((position, 1)),
                };

                if processed % DEADLINE_CHECK_INTERVAL == 0 && Instant::now() >= deadline {
                    break;
                }
            }

            if let Some((first, count)) = run {
                runs.push(ItemsChanged::update(first, count));
            }
        }

        for change in &runs {
            if self.disposed.get() {
                return TaskStatus::Done;
            }
            self.items_changed.emit(change);
        }

        let remaining = self.state.borrow().missing.len();
        trace!(processed, remaining, runs = runs.len(), "normalized series slice");

        if remaining == 0 {
            self.scheduled_update.set(None);
            TaskStatus::Done
        } else {
            TaskStatus::Continue
        }
    }
}

impl<T: 'static> Drop for NormalizedSeries<T> {
    fn drop(&mut self) {
        self.disposed.set(true);
        self.scheduler.clear(&self.scheduled_update);
    }
}

impl<T: 'static> ListModel for NormalizedSeries<T> {
    type Item = NormalizedItem<T>;

    fn n_items(&self) -> usize {
        self.state.borrow().values.len()
    }

    fn item(&self, position: usize) -> Option<NormalizedItem<T>> {
        if position >= self.n_items() {
            return None;
        }
        let value = self.value_at(position);
        self.binding
            .item(position)
            .map(|item| NormalizedItem { item, value })
    }

    fn items_changed(&self) -> &Signal<ItemsChanged> {
        &self.items_changed
    }
}
