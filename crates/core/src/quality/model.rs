//! Total order and upgrade rules over quality signals.

use std::cmp::Ordering;

use super::types::{Quality, QualitySignal, QUALITY_ORDER};

/// Comparison rules over the fixed quality order.
#[derive(Debug, Clone, Copy, Default)]
pub struct QualityModel;

impl QualityModel {
    /// The global order, lowest first.
    pub fn order(&self) -> &'static [Quality] {
        QUALITY_ORDER
    }

    /// Compare two levels, ignoring revisions.
    pub fn compare_levels(&self, a: Quality, b: Quality) -> Ordering {
        a.cmp(&b)
    }

    /// Compare two signals: level first, revision on ties.
    pub fn compare(&self, a: &QualitySignal, b: &QualitySignal) -> Ordering {
        self.compare_levels(a.level, b.level)
            .then_with(|| a.revision.cmp(&b.revision))
    }

    /// Whether `candidate` would replace `current`.
    pub fn is_upgrade(&self, current: &QualitySignal, candidate: &QualitySignal) -> bool {
        self.compare(candidate, current) == Ordering::Greater
    }

    /// Whether a held quality is at or above `cutoff`, so automatic upgrades stop.
    pub fn cutoff_met(&self, cutoff: Quality, current: &QualitySignal) -> bool {
        !self.is_upgrade(
            &QualitySignal::new(current.level),
            &QualitySignal::new(cutoff),
        )
    }
}
