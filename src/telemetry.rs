//! Telemetry helpers for viewers embedding `trace-projection`.
//!
//! Events are emitted under the `trace_projection::*` targets:
//! `debug` for rebinding, window moves and session changes, `trace` for
//! every scheduler tick and recompute slice, `warn` when a recompute task
//! outlives its series. Slice-level output is noisy; a filter such as
//! `RUST_LOG=trace_projection=debug` keeps it off.

/// Installs a compact fmt subscriber filtered by `RUST_LOG` (default `info`).
///
/// Returns `false` without the `telemetry` feature, or when the host already
/// installed a global subscriber.
#[must_use]
pub fn init_default_tracing() -> bool {
    #[cfg(feature = "telemetry")]
    {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        return tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .compact()
            .try_init()
            .is_ok();
    }

    #[cfg(not(feature = "telemetry"))]
    {
        false
    }
}
