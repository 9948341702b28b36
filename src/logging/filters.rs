use tracing_subscriber::EnvFilter;

use super::config::{LoggingConfig, LOG_ENV};

/// `STASHPACK_LOG` имеет приоритет над конфигурацией.
pub fn build_filter_from_config(config: &LoggingConfig) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
        return filter;
    }

    let directive = config.build_filter_directive();
    match EnvFilter::try_new(&directive) {
        Ok(filter) => filter,
        Err(e) => {
            eprintln!("Invalid log filter directive '{directive}': {e}; falling back to 'info'");
            EnvFilter::new("info")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[serial_test::serial]
    fn test_env_overrides_config() {
        std::env::set_var(LOG_ENV, "debug");
        let filter = build_filter_from_config(&LoggingConfig::default());
        std::env::remove_var(LOG_ENV);
        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    #[serial_test::serial]
    fn test_invalid_directive_falls_back() {
        std::env::remove_var(LOG_ENV);
        let config = LoggingConfig {
            level: "info".into(),
            directives: vec!["=[bad".into()],
            ..Default::default()
        };
        assert_eq!(build_filter_from_config(&config).to_string(), "info");
    }
}
