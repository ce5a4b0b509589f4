//! Tracing setup
//!
//! The library only emits events; installing a subscriber is left to the
//! embedding binary or test. `RUST_LOG` controls verbosity, e.g.
//! `RUST_LOG=aerogate=debug` to see every engine call and policy refusal.

/// Install a fmt subscriber filtered by `RUST_LOG`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
