use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::weekly::WeeklyDecayCurve;
use crate::error::PricingError;
use crate::types::Multiple;
use crate::PricingResult;

/// A weekly curve viewed from a track's current age.
///
/// Element `j` is the base curve at week `weeks_since_release + j`. Weeks past
/// the end of the base curve hold its final multiplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftedDecayCurve {
    multipliers: Vec<Multiple>,
    weeks_since_release: usize,
    /// Elements that fell past the base curve and were held flat.
    held_weeks: usize,
}

impl ShiftedDecayCurve {
    /// Shift `curve` forward by `weeks_since_release`, producing `horizon`
    /// weeks. A shift of zero with `horizon == curve.len()` returns the base
    /// curve unchanged.
    pub fn new(
        curve: &WeeklyDecayCurve,
        weeks_since_release: i64,
        horizon: usize,
    ) -> PricingResult<Self> {
        if weeks_since_release < 0 {
            return Err(PricingError::invalid(
                "weeks_since_release",
                "Weeks since release cannot be negative",
            ));
        }
        if curve.is_empty() {
            return Err(PricingError::MalformedCurve("weekly curve is empty".into()));
        }
        let start = weeks_since_release as usize;
        let base = curve.multipliers();
        let last = curve.final_multiplier();

        let multipliers: Vec<Multiple> = (0..horizon)
            .map(|j| base.get(start + j).copied().unwrap_or(last))
            .collect();
        let available = base.len().saturating_sub(start);
        let held_weeks = horizon.saturating_sub(available);

        Ok(Self {
            multipliers,
            weeks_since_release: start,
            held_weeks,
        })
    }

    pub fn multipliers(&self) -> &[Multiple] {
        &self.multipliers
    }

    pub fn weeks_since_release(&self) -> usize {
        self.weeks_since_release
    }

    pub fn held_weeks(&self) -> usize {
        self.held_weeks
    }

    pub fn len(&self) -> usize {
        self.multipliers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.multipliers.is_empty()
    }

    /// Multiplier at the track's current age.
    pub fn current_level(&self) -> Multiple {
        self.multipliers.first().copied().unwrap_or(Decimal::ZERO)
    }

    /// Multipliers divided by the current level, so week 0 is 1.0.
    ///
    /// Scaling current weekly streams by this series projects them forward.
    /// A track whose current level is zero contributes nothing.
    pub fn rebased(&self) -> Vec<Multiple> {
        let level = self.current_level();
        if level.is_zero() {
            return vec![Decimal::ZERO; self.multipliers.len()];
        }
        self.multipliers.iter().map(|m| m / level).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn curve() -> WeeklyDecayCurve {
        WeeklyDecayCurve::build(&[dec!(1.0), dec!(0.8), dec!(0.6)], 3, dec!(0.005)).unwrap()
    }

    #[test]
    fn test_zero_shift_is_identity() {
        let base = curve();
        let shifted = ShiftedDecayCurve::new(&base, 0, base.len()).unwrap();
        assert_eq!(shifted.multipliers(), base.multipliers());
        assert_eq!(shifted.held_weeks(), 0);
    }

    #[test]
    fn test_shift_starts_at_offset() {
        let base = curve();
        let shifted = ShiftedDecayCurve::new(&base, 60, 10).unwrap();
        assert_eq!(shifted.multipliers(), &base.multipliers()[60..70]);
    }

    #[test]
    fn test_past_end_holds_final_value() {
        let base = curve();
        let shifted = ShiftedDecayCurve::new(&base, 150, 20).unwrap();
        assert_eq!(shifted.held_weeks(), 14);
        assert!(shifted.multipliers().iter().all(|m| *m == dec!(0.6)));
    }

    #[test]
    fn test_rebased_starts_at_one() {
        let base = curve();
        let shifted = ShiftedDecayCurve::new(&base, 103, 52).unwrap();
        let rebased = shifted.rebased();
        assert_eq!(rebased[0], Decimal::ONE);
        assert!(rebased.iter().all(|m| *m <= Decimal::ONE));
    }

    #[test]
    fn test_negative_age_rejected() {
        assert!(ShiftedDecayCurve::new(&curve(), -1, 10).is_err());
    }
}
