use std::fmt;

use serde::{Deserialize, Serialize};

pub const NSEC_PER_USEC: i64 = 1_000;
pub const NSEC_PER_MSEC: i64 = 1_000_000;
pub const NSEC_PER_SEC: i64 = 1_000_000_000;

/// Nanosecond interval relative to the capture start.
///
/// A span may be temporarily inverted (`begin_nsec > end_nsec`); call
/// [`TimeSpan::order`] before relying on `begin <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSpan {
    pub begin_nsec: i64,
    pub end_nsec: i64,
}

impl Default for TimeSpan {
    fn default() -> Self {
        Self::UNBOUNDED
    }
}

impl TimeSpan {
    /// The identity window: every timestamp is inside it.
    pub const UNBOUNDED: Self = Self {
        begin_nsec: i64::MIN,
        end_nsec: i64::MAX,
    };

    #[must_use]
    pub const fn new(begin_nsec: i64, end_nsec: i64) -> Self {
        Self {
            begin_nsec,
            end_nsec,
        }
    }

    /// Zero-length span located at `time_nsec`.
    #[must_use]
    pub const fn at(time_nsec: i64) -> Self {
        Self::new(time_nsec, time_nsec)
    }

    #[must_use]
    pub const fn duration(self) -> i64 {
        self.end_nsec.saturating_sub(self.begin_nsec)
    }

    #[must_use]
    pub const fn is_unbounded(self) -> bool {
        self.begin_nsec == i64::MIN && self.end_nsec == i64::MAX
    }

    /// Returns the same interval with `begin_nsec <= end_nsec`.
    #[must_use]
    pub const fn order(self) -> Self {
        if self.begin_nsec > self.end_nsec {
            Self::new(self.end_nsec, self.begin_nsec)
        } else {
            self
        }
    }

    /// Shifts both endpoints so that `point_nsec` becomes the origin.
    #[must_use]
    pub const fn relative_to(self, point_nsec: i64) -> Self {
        Self::new(
            self.begin_nsec.saturating_sub(point_nsec),
            self.end_nsec.saturating_sub(point_nsec),
        )
    }

    /// Inclusive containment test on an ordered span.
    #[must_use]
    pub const fn contains(self, time_nsec: i64) -> bool {
        time_nsec >= self.begin_nsec && time_nsec <= self.end_nsec
    }

    /// `true` when `other` lies completely inside `self`.
    #[must_use]
    pub const fn contains_span(self, other: Self) -> bool {
        other.begin_nsec >= self.begin_nsec && other.end_nsec <= self.end_nsec
    }

    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.begin_nsec <= other.end_nsec && other.begin_nsec <= self.end_nsec
    }

    /// Intersects `self` with `allowed`.
    ///
    /// Returns `false` and zeroes both endpoints when the spans are disjoint.
    pub fn clamp(&mut self, allowed: Self) -> bool {
        if !self.intersects(allowed) {
            *self = Self::new(0, 0);
            return false;
        }

        self.begin_nsec = self.begin_nsec.max(allowed.begin_nsec);
        self.end_nsec = self.end_nsec.min(allowed.end_nsec);
        true
    }

    /// Smallest span containing both `self` and `other`.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self::new(
            self.begin_nsec.min(other.begin_nsec),
            self.end_nsec.max(other.end_nsec),
        )
    }
}

/// Formats a nanosecond offset using the largest unit below its magnitude.
///
/// `0` renders as `0.000 s`, values under a millisecond as microseconds,
/// values under a second as milliseconds and everything else as seconds.
#[must_use]
pub fn format_nsec(nsec: i64) -> String {
    if nsec == 0 {
        format!("{:.3} s", 0.0)
    } else if nsec < NSEC_PER_MSEC {
        format!("{:.3} μs", nsec as f64 / NSEC_PER_USEC as f64)
    } else if nsec < NSEC_PER_SEC {
        format!("{:.3} ms", nsec as f64 / NSEC_PER_MSEC as f64)
    } else {
        format!("{:.3} s", nsec as f64 / NSEC_PER_SEC as f64)
    }
}

impl fmt::Display for TimeSpan {
    /// `<begin>` for instants, `<begin> (<duration>)` otherwise.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_nsec(self.begin_nsec))?;
        if self.begin_nsec != self.end_nsec {
            write!(f, " ({})", format_nsec(self.duration()))?;
        }
        Ok(())
    }
}
