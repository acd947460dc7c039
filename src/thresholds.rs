//! Tuning thresholds
//!
//! The badge boundary, the single-store coverage floor and the multi-store
//! savings floor are policy knobs, not part of the algorithm's control
//! flow, so they live here as named values.

/// Named thresholds injected into the comparator and the optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    /// Percent-points delta vs a store's own average at which the latest
    /// price counts as materially cheap or dear.
    pub badge_delta_percent: i32,

    /// Coverage floor for single-store candidates, as a ratio numerator
    /// and denominator: a store must price at least
    /// `numerator / denominator` of the cart's priced items.
    pub coverage_ratio: (u32, u32),

    /// Minimum absolute saving, in minor units, before splitting the
    /// shop across several stores is worth recommending.
    pub multi_store_savings_floor: i64,
}

impl Thresholds {
    /// Whether a store pricing `found` of `priced` cart items clears the
    /// coverage floor. Evaluated in integers to avoid rounding drift.
    #[must_use]
    pub fn covers(&self, found: usize, priced: usize) -> bool {
        let (numerator, denominator) = self.coverage_ratio;
        let found = u64::try_from(found).unwrap_or(u64::MAX);
        let priced = u64::try_from(priced).unwrap_or(u64::MAX);

        found * u64::from(denominator) >= priced * u64::from(numerator)
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            badge_delta_percent: 5,
            coverage_ratio: (1, 2),
            multi_store_savings_floor: 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_coverage_is_half() {
        let thresholds = Thresholds::default();

        assert!(thresholds.covers(1, 2));
        assert!(thresholds.covers(2, 3));
        assert!(!thresholds.covers(1, 3));
        assert!(thresholds.covers(0, 0));
    }

    #[test]
    fn coverage_can_be_tuned() {
        let thresholds = Thresholds {
            coverage_ratio: (1, 1),
            ..Thresholds::default()
        };

        assert!(thresholds.covers(3, 3));
        assert!(!thresholds.covers(2, 3));
    }
}
