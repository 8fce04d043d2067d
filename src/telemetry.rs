use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

/// Install the global tracing subscriber
///
/// `RUST_LOG` takes precedence over the configured filter. Returns `false` when a subscriber
/// was already installed, in which case the existing one is kept.
pub fn init(config: &LogConfig) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    match result {
        Ok(()) => true,
        Err(err) => {
            tracing::debug!(error = %err, "tracing subscriber already installed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speculoos::prelude::*;

    #[test]
    fn test_init_twice() {
        // GIVEN a process where init already ran once
        init(&LogConfig::default());

        // WHEN initializing again
        let installed = init(&LogConfig {
            json: true,
            ..LogConfig::default()
        });

        // THEN the existing subscriber is kept
        assert_that!(installed).is_false();
    }
}
