//! trace-projection: data-projection core of a trace viewer.
//!
//! Raw, time-sorted event streams are narrowed to a time window
//! ([`model::TimeFilterModel`]), capped to a renderable item count
//! ([`model::SampledModel`]) and mapped onto `[0, 1]` axis coordinates
//! ([`model::NormalizedSeries`]). Recomputation is spread across cooperative
//! [`scheduler::Scheduler`] slices; [`api::Session`] owns the time spans and
//! axes the pipeline is driven by.
//!
//! Everything here is single-threaded.

pub mod api;
pub mod core;
pub mod document;
pub mod error;
pub mod model;
pub mod scheduler;
pub mod telemetry;

pub use api::{ProjectionConfig, Session, SessionOptions};
pub use error::{ProjectionError, ProjectionResult};
