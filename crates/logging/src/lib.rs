//! Bridges the client's single `verbose: bool` construction option onto a
//! [`tracing_subscriber`] filter, rather than hand-rolling level checks
//! throughout the codebase.
//!
//! There is no process-wide `DEBUG` flag: every transport is constructed
//! with its own [`VerbosityConfig`], and [`init`] is safe to call once per
//! process regardless of how many transports request it.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

/// Construction-time verbosity selection.
///
/// `RUST_LOG`, when set, always takes precedence over `verbose` so ad-hoc
/// debugging doesn't require touching call sites.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct VerbosityConfig {
    pub verbose: bool,
}

impl VerbosityConfig {
    #[must_use]
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    fn filter(self) -> EnvFilter {
        let default_directive = if self.verbose { "debug" } else { "warn" };
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
    }
}

static INIT: Once = Once::new();

/// Installs a global `tracing` subscriber derived from `config`.
///
/// Idempotent: only the first call in a process installs a subscriber, so
/// constructing several transports in the same process is safe. Later calls
/// silently keep the first subscriber's filter.
pub fn init(config: VerbosityConfig) {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(config.filter())
            .with_target(true)
            .init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_default_filter_is_warn() {
        let config = VerbosityConfig::new(false);
        assert!(config.filter().to_string().contains("warn"));
    }

    #[test]
    fn verbose_filter_is_debug() {
        let config = VerbosityConfig::new(true);
        assert!(config.filter().to_string().contains("debug"));
    }
}
