//! Quality and language profiles, and matching parsed releases against them.

mod matcher;
mod store;
mod types;

pub use matcher::ProfileMatcher;
pub use store::{InMemoryProfileStore, ProfileSet, ProfileStore};
pub use types::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Quality profile not found: {0}")]
    QualityProfileNotFound(u32),

    #[error("Language profile not found: {0}")]
    LanguageProfileNotFound(u32),
}
