//! Tracing subscriber setup for the `affiliate-hub` binary.
//!
//! Log lines always go to stderr; stdout carries command output only.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const TARGETS: [&str; 3] = ["affiliate_core", "affiliate_cli", "affiliate_hub"];

/// Filter directives giving every Affiliate Hub crate the same `level`,
/// e.g. `affiliate_core=warn,affiliate_cli=warn,affiliate_hub=warn`.
pub fn crate_directives(level: &str) -> String {
    TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Filter from `RUST_LOG`, or from `fallback` when that is unset or invalid.
pub fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Install the global subscriber, as JSON lines when `json` is set.
///
/// Returns `false` if a subscriber was already installed.
pub fn init_tracing(fallback: &str, json: bool) -> bool {
    let plain = (!json).then(|| fmt::layer().with_writer(std::io::stderr));
    let structured = json.then(|| fmt::layer().json().with_writer(std::io::stderr));
    tracing_subscriber::registry()
        .with(env_filter(fallback))
        .with(plain)
        .with(structured)
        .try_init()
        .is_ok()
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn directives_cover_every_crate() {
        assert_eq!(
            crate_directives("debug"),
            "affiliate_core=debug,affiliate_cli=debug,affiliate_hub=debug"
        );
    }

    #[test]
    fn second_install_is_refused() {
        init_tracing(&crate_directives("warn"), false);
        assert!(!init_tracing(&crate_directives("warn"), true));
    }
}
