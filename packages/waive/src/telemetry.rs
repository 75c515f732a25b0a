//! Tracing subscriber setup.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use waive_domain::TeachError;

/// Install a fmt subscriber filtered by `RUST_LOG`, falling back to `default_directive`.
///
/// Calling this more than once is harmless; only the first call installs a subscriber.
pub fn init_tracing(default_directive: &str) -> Result<(), TeachError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directive).map_err(|e| {
            TeachError::Configuration(format!(
                "invalid tracing directive {default_directive:?}: {e}"
            ))
        })?,
    };

    // Only fails if a global subscriber is already set
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_ok() {
        init_tracing("waive=debug").expect("first init");
        init_tracing("waive=info").expect("second init");
    }
}
