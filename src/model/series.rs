use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::core::{AxisValue, Signal};

use super::binding::ModelBinding;
use super::{Extract, ItemsChanged, ListModel, SharedModel};

/// The single extension point of a [`Series`]: how a raw item becomes a view item.
pub trait SeriesKind<T>: 'static {
    type Item;

    fn derive(&self, position: usize, item: T) -> Self::Item;
}

/// Read-only adapter exposing `kind.derive(i, raw[i])` for every raw position.
///
/// The series owns no items; it forwards upstream structural changes
/// unchanged and synthesizes a whole-list replacement on rebinding.
pub struct Series<T: 'static, K: SeriesKind<T>> {
    this: Weak<Self>,
    kind: K,
    binding: ModelBinding<T>,
    title: RefCell<Option<String>>,
    items_changed: Signal<ItemsChanged>,
}

impl<T: 'static, K: SeriesKind<T>> fmt::Debug for Series<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Series")
            .field("title", &self.title.borrow())
            .field("n_items", &self.binding.n_items())
            .finish()
    }
}

impl<T: 'static, K: SeriesKind<T>> Series<T, K> {
    #[must_use]
    pub fn new(model: Option<SharedModel<T>>, kind: K) -> Rc<Self> {
        let series = Rc::new_cyclic(|this| Self {
            this: this.clone(),
            kind,
            binding: ModelBinding::default(),
            title: RefCell::new(None),
            items_changed: Signal::new(),
        });
        series.set_model(model);
        series
    }

    #[must_use]
    pub fn kind(&self) -> &K {
        &self.kind
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
        let (old_len, new_len) = self.binding.rebind(model, move |change| {
            if let Some(series) = this.upgrade() {
                series.items_changed.emit(change);
            }
        });

        debug!(old_len, new_len, "series model rebound");
        if old_len > 0 || new_len > 0 {
            self.items_changed
                .emit(&ItemsChanged::replace_all(old_len, new_len));
        }
    }

    #[must_use]
    pub fn title(&self) -> Option<String> {
        self.title.borrow().clone()
    }

    pub fn set_title(&self, title: Option<String>) {
        *self.title.borrow_mut() = title;
    }
}

impl<T: 'static, K: SeriesKind<T>> ListModel for Series<T, K> {
    type Item = K::Item;

    fn n_items(&self) -> usize {
        self.binding.n_items()
    }

    fn item(&self, position: usize) -> Option<K::Item> {
        self.binding
            .item(position)
            .map(|item| self.kind.derive(position, item))
    }

    fn items_changed(&self) -> &Signal<ItemsChanged> {
        &self.items_changed
    }
}

/// Passes raw items through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityKind;

impl<T: 'static> SeriesKind<T> for IdentityKind {
    type Item = T;

    fn derive(&self, _position: usize, item: T) -> T {
        item
    }
}

/// Coordinate pair derived from a raw item.
#[derive(Debug, Clone, PartialEq)]
pub struct XyItem<T> {
    pub item: T,
    pub x: AxisValue,
    pub y: AxisValue,
}

pub struct XyKind<T> {
    x: Extract<T, AxisValue>,
    y: Extract<T, AxisValue>,
}

impl<T> XyKind<T> {
    pub fn new(
        x: impl Fn(&T) -> AxisValue + 'static,
        y: impl Fn(&T) -> AxisValue + 'static,
    ) -> Self {
        Self {
            x: Rc::new(x),
            y: Rc::new(y),
        }
    }
}

impl<T: 'static> SeriesKind<T> for XyKind<T> {
    type Item = XyItem<T>;

    fn derive(&self, _position: usize, item: T) -> XyItem<T> {
        XyItem {
            x: (self.x)(&item),
            y: (self.y)(&item),
            item,
        }
    }
}

pub type XySeries<T> = Series<T, XyKind<T>>;

/// Begin/end pair derived from a raw item, e.g. a mark's duration.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesItem<T> {
    pub item: T,
    pub begin_nsec: i64,
    pub end_nsec: i64,
}

impl<T> TimeSeriesItem<T> {
    #[must_use]
    pub fn duration(&self) -> i64 {
        self.end_nsec.saturating_sub(self.begin_nsec)
    }
}

pub struct TimeSeriesKind<T> {
    begin: Extract<T, i64>,
    end: Extract<T, i64>,
}

impl<T> TimeSeriesKind<T> {
    pub fn new(begin: impl Fn(&T) -> i64 + 'static, end: impl Fn(&T) -> i64 + 'static) -> Self {
        Self {
            begin: Rc::new(begin),
            end: Rc::new(end),
        }
    }
}

impl<T: 'static> SeriesKind<T> for TimeSeriesKind<T> {
    type Item = TimeSeriesItem<T>;

    fn derive(&self, _position: usize, item: T) -> TimeSeriesItem<T> {
        TimeSeriesItem {
            begin_nsec: (self.begin)(&item),
            end_nsec: (self.end)(&item),
            item,
        }
    }
}

pub type TimeSeries<T> = Series<T, TimeSeriesKind<T>>;
