//! Quality levels, their fixed order and upgrade rules.

mod model;
mod types;

pub use model::QualityModel;
pub use types::*;
