use crate::config::types::Config;
use crate::ConfigError;

/// Validates a parsed configuration
///
/// Zero-sized pools or inverted token bounds would not fail until deep inside
/// a crawl, so they are rejected up front.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.crawler.thread_pool_size == 0 {
        return Err(ConfigError::Validation(
            "crawler.thread-pool-size must be at least 1".to_string(),
        ));
    }

    if config.crawler.max_pages == 0 {
        return Err(ConfigError::Validation(
            "crawler.max-pages must be at least 1".to_string(),
        ));
    }

    if config.crawler.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler.user-agent must not be empty".to_string(),
        ));
    }

    if config.database.connection_pool_size == 0 {
        return Err(ConfigError::Validation(
            "database.connection-pool-size must be at least 1".to_string(),
        ));
    }

    if config.indexer.min_word_length == 0 {
        return Err(ConfigError::Validation(
            "indexer.min-word-length must be at least 1".to_string(),
        ));
    }

    if config.indexer.min_word_length > config.indexer.max_word_length {
        return Err(ConfigError::Validation(format!(
            "indexer.min-word-length ({}) exceeds indexer.max-word-length ({})",
            config.indexer.min_word_length, config.indexer.max_word_length
        )));
    }

    if config.search.snippet_length == 0 {
        return Err(ConfigError::Validation(
            "search.snippet-length must be at least 1".to_string(),
        ));
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
    fn test_zero_pool_size_rejected() {
        let mut config = Config::default();
        config.crawler.thread_pool_size = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_user_agent_rejected() {
        let mut config = Config::default();
        config.crawler.user_agent = "  ".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_inverted_word_bounds_rejected() {
        let mut config = Config::default();
        config.indexer.min_word_length = 60;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_connection_pool_rejected() {
        let mut config = Config::default();
        config.database.connection_pool_size = 0;
        assert!(validate(&config).is_err());
    }
}
