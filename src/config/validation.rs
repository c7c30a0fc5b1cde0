//! Configuration validation.

use crate::config::Config;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate the configuration.
///
/// Checks that the metrics path is absolute and the log level is one of
/// the known names. All problems are collected and reported together.
pub fn validate_config(config: &Config) -> Result<(), String> {
    let mut errors = Vec::new();

    if config.server.path.is_empty() {
        errors.push("server.path cannot be empty".to_string());
    } else if !config.server.path.starts_with('/') {
        errors.push(format!(
            "server.path must start with '/': '{}'",
            config.server.path
        ));
    }

    if !LOG_LEVELS.contains(&config.log.level.as_str()) {
        errors.push(format!(
            "log.level must be one of {}: '{}'",
            LOG_LEVELS.join(", "),
            config.log.level
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_relative_path_rejected() {
        let mut config = Config::default();
        config.server.path = "metrics".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.contains("must start with '/'"));
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        let mut config = Config::default();
        config.log.level = "verbose".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.contains("log.level"));
    }

    #[test]
    fn test_errors_are_collected() {
        let mut config = Config::default();
        config.server.path = String::new();
        config.log.level = "loud".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.contains("server.path"));
        assert!(err.contains("log.level"));
    }
}
