use std::cell::{Cell, RefCell};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::signal::Signal;

/// Heterogeneous numeric value extracted from a raw event before it is
/// placed on an axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AxisValue {
    Int64(i64),
    UInt64(u64),
    Int32(i32),
    UInt32(u32),
    Double(f64),
    Float(f32),
}

impl AxisValue {
    #[must_use]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int64(v) => v as f64,
            Self::UInt64(v) => v as f64,
            Self::Int32(v) => f64::from(v),
            Self::UInt32(v) => f64::from(v),
            Self::Double(v) => v,
            Self::Float(v) => f64::from(v),
        }
    }
}

impl fmt::Display for AxisValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int64(v) => write!(f, "{v}"),
            Self::UInt64(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::UInt32(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v:.2}"),
            Self::Float(v) => write!(f, "{v:.2}"),
        }
    }
}

macro_rules! impl_axis_value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for AxisValue {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

impl_axis_value_from!(
    i64 => Int64,
    u64 => UInt64,
    i32 => Int32,
    u32 => UInt32,
    f64 => Double,
    f32 => Float,
);

/// Range payload delivered with `range-changed`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

/// Maps a domain-specific numeric range onto `[0, 1]`.
///
/// Implementations mutate through `&self`; axes are shared between their
/// owner and any number of readers on one thread.
pub trait Axis {
    fn title(&self) -> Option<String>;
    fn min(&self) -> f64;
    fn set_min(&self, min: f64);
    fn max(&self) -> f64;
    fn set_max(&self, max: f64);

    /// Maps `value` into axis space where `min -> 0` and `max -> 1`.
    ///
    /// Undefined for a pathological axis; check [`Axis::is_pathological`] first.
    fn normalize(&self, value: f64) -> f64;

    /// `true` when the range is degenerate and normalization would divide by zero.
    fn is_pathological(&self) -> bool;

    /// Fired after the range actually changed.
    fn range_changed(&self) -> &Signal<AxisRange>;

    fn normalize_value(&self, value: AxisValue) -> f64 {
        self.normalize(value.as_f64())
    }

    fn range(&self) -> AxisRange {
        AxisRange {
            min: self.min(),
            max: self.max(),
        }
    }
}

/// Linear axis over `[min, max]`.
pub struct ValueAxis {
    title: RefCell<Option<String>>,
    min: Cell<f64>,
    max: Cell<f64>,
    distance: Cell<f64>,
    range_changed: Signal<AxisRange>,
}

impl fmt::Debug for ValueAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueAxis")
            .field("title", &self.title.borrow())
            .field("min", &self.min.get())
            .field("max", &self.max.get())
            .finish()
    }
}

impl ValueAxis {
    #[must_use]
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            title: RefCell::new(None),
            min: Cell::new(min),
            max: Cell::new(max),
            distance: Cell::new(max - min),
            range_changed: Signal::new(),
        }
    }

    #[must_use]
    pub fn with_title(self, title: impl Into<String>) -> Self {
        *self.title.borrow_mut() = Some(title.into());
        self
    }

    pub fn set_title(&self, title: Option<String>) {
        *self.title.borrow_mut() = title;
    }

    #[must_use]
    pub fn distance(&self) -> f64 {
        self.distance.get()
    }

    /// Moves both endpoints and notifies at most once.
    pub fn set_range(&self, min: f64, max: f64) {
        if min == self.min.get() && max == self.max.get() {
            return;
        }
        self.min.set(min);
        self.max.set(max);
        self.emit_range_changed();
    }

    fn emit_range_changed(&self) {
        self.distance.set(self.max.get() - self.min.get());
        let range = self.range();
        trace!(min = range.min, max = range.max, "axis range changed");
        self.range_changed.emit(&range);
    }
}

impl Axis for ValueAxis {
    fn title(&self) -> Option<String> {
        self.title.borrow().clone()
    }

    fn min(&self) -> f64 {
        self.min.get()
    }

    fn set_min(&self, min: f64) {
        if min != self.min.get() {
            self.min.set(min);
            self.emit_range_changed();
        }
    }

    fn max(&self) -> f64 {
        self.max.get()
    }

    fn set_max(&self, max: f64) {
        if max != self.max.get() {
            self.max.set(max);
            self.emit_range_changed();
        }
    }

    fn normalize(&self, value: f64) -> f64 {
        (value - self.min.get()) / self.distance.get()
    }

    fn is_pathological(&self) -> bool {
        self.min.get() == self.max.get()
    }

    fn range_changed(&self) -> &Signal<AxisRange> {
        &self.range_changed
    }
}
