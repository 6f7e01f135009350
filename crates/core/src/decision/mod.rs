//! Tiered search execution and release decisions.

mod engine;
mod specs;
mod types;

pub use engine::{DecisionEngine, EngineSettings};
pub use specs::{check_target, check_upgrade};
pub use types::*;
