use std::collections::HashSet;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Engine request timeout is not 0
/// - Engine result cap, when set, is at least 1
/// - Indexer names are non-empty and unique, URLs non-empty
/// - Indexer paging and rate limits are positive
/// - Profile ids are unique and every profile allows something
///
/// A cutoff outside the allowed set is not an error; profiles clamp it on load.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.engine.request_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "engine.request_timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.engine.max_results_per_search == Some(0) {
        return Err(ConfigError::ValidationError(
            "engine.max_results_per_search must be at least 1".to_string(),
        ));
    }

    let mut names = HashSet::new();
    for indexer in &config.indexers {
        if indexer.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "indexer name cannot be empty".to_string(),
            ));
        }
        if !names.insert(indexer.name.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate indexer name: {}",
                indexer.name
            )));
        }
        if indexer.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "indexer {}: url cannot be empty",
                indexer.name
            )));
        }
        if indexer.page_size == 0 {
            return Err(ConfigError::ValidationError(format!(
                "indexer {}: page_size cannot be 0",
                indexer.name
            )));
        }
        if indexer.max_pages == 0 {
            return Err(ConfigError::ValidationError(format!(
                "indexer {}: max_pages must be at least 1",
                indexer.name
            )));
        }
        if indexer.rate_limit_rpm == 0 {
            return Err(ConfigError::ValidationError(format!(
                "indexer {}: rate_limit_rpm cannot be 0",
                indexer.name
            )));
        }
    }

    let mut ids = HashSet::new();
    for profile in &config.profiles.quality {
        if !ids.insert(profile.id) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate quality profile id: {}",
                profile.id
            )));
        }
        if profile.allowed_qualities().next().is_none() {
            return Err(ConfigError::ValidationError(format!(
                "quality profile {} allows no qualities",
                profile.name
            )));
        }
    }

    let mut ids = HashSet::new();
    for profile in &config.profiles.language {
        if !ids.insert(profile.id) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate language profile id: {}",
                profile.id
            )));
        }
        if profile.allowed_languages().next().is_none() {
            return Err(ConfigError::ValidationError(format!(
                "language profile {} allows no languages",
                profile.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{IndexerConfig, IndexerKind};
    use crate::profile::QualityProfile;
    use crate::quality::Quality;

    fn indexer(name: &str) -> IndexerConfig {
        IndexerConfig::new(name, IndexerKind::Newznab, "https://api.example")
    }

    fn assert_invalid(config: &Config, needle: &str) {
        match validate_config(config) {
            Err(ConfigError::ValidationError(msg)) => {
                assert!(msg.contains(needle), "unexpected message: {}", msg)
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config {
            indexers: vec![indexer("a"), indexer("b")],
            ..Config::default()
        };
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_timeout_zero_fails() {
        let mut config = Config::default();
        config.engine.request_timeout_secs = 0;
        assert_invalid(&config, "request_timeout_secs");
    }

    #[test]
    fn test_validate_zero_result_cap_fails() {
        let mut config = Config::default();
        config.engine.max_results_per_search = Some(0);
        assert_invalid(&config, "max_results_per_search");

        config.engine.max_results_per_search = Some(1);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_duplicate_indexer_fails() {
        let config = Config {
            indexers: vec![indexer("a"), indexer("a")],
            ..Config::default()
        };
        assert_invalid(&config, "duplicate indexer name");
    }

    #[test]
    fn test_validate_indexer_limits() {
        let mut zero_page = indexer("a");
        zero_page.page_size = 0;
        assert_invalid(
            &Config {
                indexers: vec![zero_page],
                ..Config::default()
            },
            "page_size",
        );

        let mut zero_pages = indexer("a");
        zero_pages.max_pages = 0;
        assert_invalid(
            &Config {
                indexers: vec![zero_pages],
                ..Config::default()
            },
            "max_pages",
        );

        let mut zero_rate = indexer("a");
        zero_rate.rate_limit_rpm = 0;
        assert_invalid(
            &Config {
                indexers: vec![zero_rate],
                ..Config::default()
            },
            "rate_limit_rpm",
        );
    }

    #[test]
    fn test_validate_empty_profile_fails() {
        let mut config = Config::default();
        config
            .profiles
            .quality
            .push(QualityProfile::allowing(1, "Empty", &[], Quality::Unknown));
        assert_invalid(&config, "allows no qualities");
    }

    #[test]
    fn test_validate_duplicate_profile_id_fails() {
        let mut config = Config::default();
        let profile = QualityProfile::allowing(1, "HD", &[Quality::WebDl1080p], Quality::WebDl1080p);
        config.profiles.quality.push(profile.clone());
        config.profiles.quality.push(profile);
        assert_invalid(&config, "duplicate quality profile id");
    }
}
