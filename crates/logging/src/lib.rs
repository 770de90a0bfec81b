#![deny(unsafe_code)]
#![deny(missing_docs)]

//! # Overview
//!
//! Installs a `tracing` subscriber whose verbosity is driven by a single
//! repeat-count argument (`-v`, `-vv`, `-vv...`), the way the binary's `-v`
//! flag is meant to work: 0 repeats is `WARN`, 1 is `INFO`, 2 is `DEBUG`,
//! and 3 or more is `TRACE`.
//!
//! [`init`] is idempotent: the underlying `tracing` global subscriber can
//! only be installed once per process, so a second call is a harmless no-op
//! rather than a panic, which matters for tests that call it from multiple
//! `#[test]` functions in the same binary.

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Maps a `-v` repeat count to a `tracing` level.
#[must_use]
pub fn level_for_verbosity(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Installs a process-global `tracing` subscriber at the level
/// [`level_for_verbosity`] maps `verbosity` to.
///
/// An `RUST_LOG` environment variable, if set, overrides the computed
/// level via `tracing_subscriber::EnvFilter`'s usual precedence.
///
/// Safe to call more than once; only the first call takes effect.
pub fn init(verbosity: u8) {
    INIT.call_once(|| {
        let level = level_for_verbosity(verbosity);
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_zero_is_warn() {
        assert_eq!(level_for_verbosity(0), Level::WARN);
    }

    #[test]
    fn verbosity_one_is_info() {
        assert_eq!(level_for_verbosity(1), Level::INFO);
    }

    #[test]
    fn verbosity_two_is_debug() {
        assert_eq!(level_for_verbosity(2), Level::DEBUG);
    }

    #[test]
    fn verbosity_three_and_above_is_trace() {
        assert_eq!(level_for_verbosity(3), Level::TRACE);
        assert_eq!(level_for_verbosity(255), Level::TRACE);
    }

    #[test]
    fn init_does_not_panic_when_called_repeatedly() {
        init(2);
        init(0);
    }
}
