use crate::config::types::{Config, CrawlerConfig, GovernorConfig, OutputConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_governor_config(&config.governor)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.seed_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed-url '{}': {}", config.seed_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "seed-url must use http or https, got '{}'",
            config.seed_url
        )));
    }

    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates rate governor configuration
fn validate_governor_config(config: &GovernorConfig) -> Result<(), ConfigError> {
    if config.start_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "start-delay-ms ({}) must not exceed max-delay-ms ({})",
            config.start_delay_ms, config.max_delay_ms
        )));
    }

    if !(config.target_concurrency > 0.0) {
        return Err(ConfigError::Validation(format!(
            "target-concurrency must be positive, got {}",
            config.target_concurrency
        )));
    }

    if config.max_in_flight < 1 || config.max_in_flight > 100 {
        return Err(ConfigError::Validation(format!(
            "max-in-flight must be between 1 and 100, got {}",
            config.max_in_flight
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    for (name, path) in [
        ("collections-path", &config.collections_path),
        ("repositories-path", &config.repositories_path),
        ("files-path", &config.files_path),
    ] {
        if path.is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_invalid_seed_url() {
        let mut config = Config::default();
        config.crawler.seed_url = "not a url".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_non_http_seed_url() {
        let mut config = Config::default();
        config.crawler.seed_url = "ftp://github.com/collections".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_delay_bounds_inverted() {
        let mut config = Config::default();
        config.governor.start_delay_ms = 20_000;
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_zero_target_concurrency() {
        let mut config = Config::default();
        config.governor.target_concurrency = 0.0;
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_max_in_flight_out_of_range() {
        let mut config = Config::default();
        config.governor.max_in_flight = 0;
        assert!(validate(&config).is_err());

        config.governor.max_in_flight = 500;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_output_path() {
        let mut config = Config::default();
        config.output.files_path = String::new();
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }
}
