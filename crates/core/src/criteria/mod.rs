//! Search criteria: what to look for, built from a target and an intent.

mod builder;
mod types;

pub use builder::SearchCriteriaBuilder;
pub use types::*;
