use serde::{Deserialize, Serialize};

use crate::core::{AxisValue, TimeSpan};

use super::Timed;

/// Stack sample taken on `cpu` for thread `tid` of process `pid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub time_nsec: i64,
    pub cpu: i32,
    pub pid: i32,
    pub tid: i32,
}

/// Application-defined interval with a group/name label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mark {
    pub time_nsec: i64,
    pub duration_nsec: i64,
    pub group: String,
    pub name: String,
    #[serde(default)]
    pub message: String,
}

impl Mark {
    #[must_use]
    pub fn end_time_nsec(&self) -> i64 {
        self.time_nsec.saturating_add(self.duration_nsec)
    }

    #[must_use]
    pub fn time_span(&self) -> TimeSpan {
        TimeSpan::new(self.time_nsec, self.end_time_nsec())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CounterValue {
    pub time_nsec: i64,
    pub counter_id: u32,
    pub value: AxisValue,
}

impl CounterValue {
    /// Integer counters print plainly, floating point ones with six decimals.
    #[must_use]
    pub fn format_value(&self) -> String {
        match self.value {
            AxisValue::Double(v) => format!("{v:.6}"),
            AxisValue::Float(v) => format!("{:.6}", f64::from(v)),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogMessage {
    pub time_nsec: i64,
    pub domain: String,
    pub message: String,
}

/// Process lifetime; `exit_time_nsec` equals `time_nsec` while still running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Process {
    pub time_nsec: i64,
    pub exit_time_nsec: i64,
    pub pid: i32,
    pub title: String,
}

macro_rules! impl_timed {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Timed for $ty {
                fn time_nsec(&self) -> i64 {
                    self.time_nsec
                }
            }
        )*
    };
}

impl_timed!(Sample, Mark, CounterValue, LogMessage, Process);
