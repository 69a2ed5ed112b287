//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gateway.request_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "gateway.request_timeout_ms must be > 0".into(),
            ));
        }
        if self.poller.interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "poller.interval_ms must be > 0".into(),
            ));
        }
        if self.poller.timeout_ms < self.poller.interval_ms {
            return Err(ConfigError::ValidationError(
                "poller.timeout_ms must be >= poller.interval_ms".into(),
            ));
        }
        if self.poller.progress_cap >= 100 {
            return Err(ConfigError::ValidationError(
                "poller.progress_cap must be < 100".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.generation.strength) {
            return Err(ConfigError::ValidationError(
                "generation.strength must be between 0.0 and 1.0".into(),
            ));
        }
        if self.generation.steps == 0 {
            return Err(ConfigError::ValidationError(
                "generation.steps must be > 0".into(),
            ));
        }
        if self.generation.batch == 0 {
            return Err(ConfigError::ValidationError(
                "generation.batch must be > 0".into(),
            ));
        }
        if self.generation.jobs == 0 {
            return Err(ConfigError::ValidationError(
                "generation.jobs must be > 0".into(),
            ));
        }
        if self.image.target_size == 0 {
            return Err(ConfigError::ValidationError(
                "image.target_size must be > 0".into(),
            ));
        }
        if self.image.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "image.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.image.decode_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "image.decode_timeout_ms must be > 0".into(),
            ));
        }
        if self.image.accepted_formats.is_empty() {
            return Err(ConfigError::ValidationError(
                "image.accepted_formats must not be empty".into(),
            ));
        }
        if self.watermark.size == 0 {
            return Err(ConfigError::ValidationError(
                "watermark.size must be > 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut config = Config::default();
        config.poller.interval_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("interval_ms"));
    }

    #[test]
    fn test_validate_rejects_timeout_shorter_than_interval() {
        let mut config = Config::default();
        config.poller.interval_ms = 500;
        config.poller.timeout_ms = 100;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timeout_ms"));
    }

    #[test]
    fn test_validate_rejects_full_progress_cap() {
        let mut config = Config::default();
        config.poller.progress_cap = 100;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("progress_cap"));
    }

    #[test]
    fn test_validate_rejects_invalid_strength() {
        let mut config = Config::default();
        config.generation.strength = 1.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("strength"));

        config.generation.strength = -0.1;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("strength"));
    }

    #[test]
    fn test_validate_rejects_zero_target_size() {
        let mut config = Config::default();
        config.image.target_size = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("target_size"));
    }

    #[test]
    fn test_validate_rejects_zero_jobs() {
        let mut config = Config::default();
        config.generation.jobs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("jobs"));
    }
}
