//! Percent-point helpers
//!
//! All user-facing percentages in this crate are whole percent points,
//! rounded half away from zero.

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};

/// `part / whole` as rounded percent points; 0 when `whole` is zero.
pub(crate) fn percent_points(part: Decimal, whole: Decimal) -> i32 {
    if whole.is_zero() {
        return 0;
    }

    (part / whole * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i32()
        .unwrap_or(0)
}

/// [`percent_points`] over minor-unit amounts.
pub(crate) fn percent_points_minor(part: i64, whole: i64) -> i32 {
    percent_points(Decimal::from(part), Decimal::from(whole))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(percent_points_minor(1, 8), 13); // 12.5 -> 13
        assert_eq!(percent_points_minor(-1, 8), -13);
        assert_eq!(percent_points_minor(1, 3), 33);
    }

    #[test]
    fn zero_whole_is_zero_percent() {
        assert_eq!(percent_points_minor(10, 0), 0);
    }
}
