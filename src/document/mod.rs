//! Capture-side collaborators: time-stamped frames and the documents that
//! hold them as ascending list models.

mod frames;
mod mark_catalog;
mod memory;

use crate::core::TimeSpan;

pub use frames::{CounterValue, LogMessage, Mark, Process, Sample};
pub use mark_catalog::MarkCatalog;
pub use memory::MemoryDocument;

/// Anything carrying an absolute capture timestamp.
pub trait Timed {
    fn time_nsec(&self) -> i64;
}

impl Timed for i64 {
    fn time_nsec(&self) -> i64 {
        *self
    }
}

/// Opened capture as seen by a session.
pub trait Document {
    /// Whole-capture span; every frame time lies inside it.
    fn time_span(&self) -> TimeSpan;
}

/// Borrowed frame handed to `Session::describe`.
#[derive(Debug, Clone, Copy)]
pub enum DocumentItem<'a> {
    Sample(&'a Sample),
    Mark(&'a Mark),
    CounterValue(&'a CounterValue),
    Log(&'a LogMessage),
    Process(&'a Process),
}

impl Timed for DocumentItem<'_> {
    fn time_nsec(&self) -> i64 {
        match self {
            Self::Sample(sample) => sample.time_nsec,
            Self::Mark(mark) => mark.time_nsec,
            Self::CounterValue(value) => value.time_nsec,
            Self::Log(log) => log.time_nsec,
            Self::Process(process) => process.time_nsec,
        }
    }
}
