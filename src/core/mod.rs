pub mod axis;
pub mod index_set;
pub mod signal;
pub mod time_span;

pub use axis::{Axis, AxisRange, AxisValue, ValueAxis};
pub use index_set::IndexSet;
pub use signal::{Signal, Subscription};
pub use time_span::{NSEC_PER_MSEC, NSEC_PER_SEC, NSEC_PER_USEC, TimeSpan, format_nsec};
