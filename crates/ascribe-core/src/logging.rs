//! Tracing subscriber setup.
//!
//! The engine only emits `tracing` events; binaries and tests that want to
//! see them call [`init_subscriber`] once.

use tracing_subscriber::EnvFilter;

/// Install a stderr subscriber filtered at `level`.
///
/// `RUST_LOG` takes precedence over `level` when set. Calls after the first
/// are no-ops.
pub fn init_subscriber(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    // a global default may already be set
    let _ = subscriber.try_init();
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_harmless() {
        init_subscriber("warn");
        init_subscriber("debug");
        tracing::warn!(target: "ascribe_core", "after init");
    }
}
