//! Tracing setup for the binary
//!
//! Logs go to stderr so they never interleave with the narrative on stdout.
//! `RUST_LOG` wins over the configured level.

use tracing_subscriber::EnvFilter;

/// Install the global `fmt` subscriber
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(default_level, "Tracing initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        init_tracing("warn");
        init_tracing("debug");
    }
}
