//! Session-level surface: configuration, frame filters and the per-document
//! coordinator.

mod config;
mod filter;
mod session;

pub use config::{ProjectionConfig, SessionOptions};
pub use filter::{EveryFilter, Filter, MarkFilter};
pub use session::Session;
