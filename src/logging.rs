//! Diagnostics on stderr. Stdout carries command and protocol output only.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the configured filter, e.g.
/// `GRIDLOCK_LOG=gridlock_core=debug`.
pub const LOG_ENV_VAR: &str = "GRIDLOCK_LOG";

/// Each `-v` raises the configured level by one step.
pub fn effective_level(configured: LevelFilter, verbose: u8) -> LevelFilter {
    const ORDER: [LevelFilter; 6] = [
        LevelFilter::OFF,
        LevelFilter::ERROR,
        LevelFilter::WARN,
        LevelFilter::INFO,
        LevelFilter::DEBUG,
        LevelFilter::TRACE,
    ];
    let start = ORDER.iter().position(|l| *l == configured).unwrap_or(2);
    ORDER[(start + verbose as usize).min(ORDER.len() - 1)]
}

pub fn init(configured: LevelFilter, verbose: u8) {
    let filter = EnvFilter::builder()
        .with_default_directive(effective_level(configured, verbose).into())
        .with_env_var(LOG_ENV_VAR)
        .from_env_lossy();

    // A subscriber may already be installed (tests); keep the existing one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
