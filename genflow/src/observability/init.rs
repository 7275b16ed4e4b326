//! Subscriber initialization for binaries and tests.

use tracing_subscriber::EnvFilter;

/// Installs a formatting subscriber honoring `RUST_LOG`.
///
/// Defaults to `info` when no filter is set. Safe to call more than once;
/// later calls are no-ops.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_tracing();
        init_tracing();
        // Second call must not panic
    }
}
