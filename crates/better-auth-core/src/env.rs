// Environment detection and logger configuration.
//
// Maps to: packages/core/src/env/env-impl.ts

use std::sync::OnceLock;

/// Cached environment mode.
static ENV_MODE: OnceLock<EnvMode> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvMode {
    Production,
    Development,
    Test,
}

/// Parse an environment mode string. Anything unrecognized is development.
pub fn parse_env_mode(value: &str) -> EnvMode {
    match value.to_lowercase().as_str() {
        "production" | "prod" => EnvMode::Production,
        "test" | "testing" => EnvMode::Test,
        _ => EnvMode::Development,
    }
}

/// Detect the current environment mode from environment variables.
/// Checks `BETTER_AUTH_ENV`, `RUST_ENV` and `NODE_ENV` in order.
pub fn detect_env_mode() -> EnvMode {
    *ENV_MODE.get_or_init(|| {
        let env_val = std::env::var("BETTER_AUTH_ENV")
            .or_else(|_| std::env::var("RUST_ENV"))
            .or_else(|_| std::env::var("NODE_ENV"))
            .unwrap_or_default();
        parse_env_mode(&env_val)
    })
}

pub fn is_production() -> bool {
    detect_env_mode() == EnvMode::Production
}

/// Read a boolean flag from the environment (`1`, `true`, `yes`, `on`).
pub fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| parse_flag(&v))
        .unwrap_or(false)
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Initialize the `tracing` subscriber with appropriate defaults.
/// `RUST_LOG` wins when set; otherwise production logs at info and
/// everything else at debug.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_logger() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if is_production() {
            EnvFilter::new("better_auth=info,better_auth_payload=info")
        } else {
            EnvFilter::new("better_auth=debug,better_auth_payload=debug")
        }
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .try_init();
}
