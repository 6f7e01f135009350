//! Read-only access to profile snapshots.

use std::collections::HashMap;
use std::sync::Arc;

use super::types::{LanguageProfile, QualityProfile};
use super::ProfileError;

/// Supplies immutable profile snapshots by id.
pub trait ProfileStore: Send + Sync {
    fn quality_profile(&self, id: u32) -> Option<Arc<QualityProfile>>;

    fn language_profile(&self, id: u32) -> Option<Arc<LanguageProfile>>;

    /// Resolve both profiles for one decision pass.
    fn resolve(&self, quality_id: u32, language_id: u32) -> Result<ProfileSet, ProfileError> {
        let quality = self
            .quality_profile(quality_id)
            .ok_or(ProfileError::QualityProfileNotFound(quality_id))?;
        let language = self
            .language_profile(language_id)
            .ok_or(ProfileError::LanguageProfileNotFound(language_id))?;
        Ok(ProfileSet { quality, language })
    }
}

/// The pair of profiles a decision pass evaluates against.
#[derive(Debug, Clone)]
pub struct ProfileSet {
    pub quality: Arc<QualityProfile>,
    pub language: Arc<LanguageProfile>,
}

impl ProfileSet {
    pub fn new(quality: QualityProfile, language: LanguageProfile) -> Self {
        Self {
            quality: Arc::new(quality),
            language: Arc::new(language),
        }
    }
}

/// Profile store backed by maps built at startup.
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    quality: HashMap<u32, Arc<QualityProfile>>,
    language: HashMap<u32, Arc<LanguageProfile>>,
}

impl InMemoryProfileStore {
    pub fn new(quality: Vec<QualityProfile>, language: Vec<LanguageProfile>) -> Self {
        Self {
            quality: quality.into_iter().map(|p| (p.id, Arc::new(p))).collect(),
            language: language.into_iter().map(|p| (p.id, Arc::new(p))).collect(),
        }
    }
}

impl ProfileStore for InMemoryProfileStore {
    fn quality_profile(&self, id: u32) -> Option<Arc<QualityProfile>> {
        self.quality.get(&id).cloned()
    }

    fn language_profile(&self, id: u32) -> Option<Arc<LanguageProfile>> {
        self.language.get(&id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use crate::quality::Quality;

    fn store() -> InMemoryProfileStore {
        InMemoryProfileStore::new(
            vec![QualityProfile::allowing(
                1,
                "HD",
                &[Quality::WebDl1080p],
                Quality::WebDl1080p,
            )],
            vec![LanguageProfile::allowing(
                2,
                "English",
                &[Language::English],
                true,
            )],
        )
    }

    #[test]
    fn test_resolve() {
        let set = store().resolve(1, 2).unwrap();
        assert_eq!(set.quality.name, "HD");
        assert_eq!(set.language.name, "English");
    }

    #[test]
    fn test_resolve_missing() {
        let err = store().resolve(9, 2).unwrap_err();
        assert!(matches!(err, ProfileError::QualityProfileNotFound(9)));

        let err = store().resolve(1, 9).unwrap_err();
        assert!(matches!(err, ProfileError::LanguageProfileNotFound(9)));
    }
}
