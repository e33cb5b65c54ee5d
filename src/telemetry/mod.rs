//! Opt-in tracing setup.
//!
//! The library itself only emits `tracing` events; nothing here is required
//! for correct behavior. Binaries and tests that want formatted output call
//! [`init_tracing`] once.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install an env-filtered fmt subscriber.
///
/// Honors `RUST_LOG`; defaults to `info` for this crate and `warn` for
/// everything else. Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("warn,snpforge=info"))
        .expect("static filter directive");

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init();
}
