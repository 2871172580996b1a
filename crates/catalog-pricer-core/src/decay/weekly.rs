use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::PricingError;
use crate::types::{Multiple, Rate, WEEKS_PER_YEAR};
use crate::PricingResult;

/// Check annual anchors: at least one value, first value positive, no
/// negatives, never increasing year over year.
pub fn validate_anchors(anchors: &[Multiple]) -> PricingResult<()> {
    let first = anchors
        .first()
        .ok_or_else(|| PricingError::MalformedCurve("no annual anchors".into()))?;
    if let Some((i, a)) = anchors.iter().enumerate().find(|(_, a)| a.is_sign_negative()) {
        return Err(PricingError::MalformedCurve(format!(
            "year {} anchor {a} is negative",
            i + 1
        )));
    }
    if first.is_zero() {
        return Err(PricingError::MalformedCurve(
            "year 1 anchor must be positive".into(),
        ));
    }
    for (i, pair) in anchors.windows(2).enumerate() {
        if pair[1] > pair[0] {
            return Err(PricingError::MalformedCurve(format!(
                "anchor increases from year {} ({}) to year {} ({})",
                i + 1,
                pair[0],
                i + 2,
                pair[1]
            )));
        }
    }
    Ok(())
}

/// Weekly multipliers derived from annual anchors.
///
/// Week 1 is the peak (1.0). Year `y` occupies weeks `52(y-1)+1 ..= 52y`; its
/// last week carries the normalised anchor exactly. The step down from the
/// previous year's level is spread over a short linear ramp at the start of
/// the year, sized so the year's mean stays within half the build tolerance of
/// the anchor. The curve never increases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyDecayCurve {
    multipliers: Vec<Multiple>,
    anchors: Vec<Multiple>,
    /// Years past the supplied anchors that reuse the last anchor.
    held_years: usize,
}

/// One year of a curve-vs-anchor check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearFidelity {
    pub year: u32,
    pub anchor: Multiple,
    /// Mean weekly multiplier over the year.
    pub modelled: Multiple,
    pub relative_error: Rate,
}

/// Result of comparing a weekly curve's annual sums with its anchors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveValidation {
    pub valid: bool,
    pub tolerance: Rate,
    pub max_error: Rate,
    pub worst_year: Option<u32>,
    pub years: Vec<YearFidelity>,
}

impl WeeklyDecayCurve {
    /// Expand `anchors` (year 1 first) into `years * 52` weekly multipliers.
    ///
    /// Anchors are normalised so year 1 = 1.0. When `years` exceeds the
    /// anchors supplied, the final anchor is held flat.
    pub fn build(anchors: &[Multiple], years: usize, tolerance: Rate) -> PricingResult<Self> {
        validate_anchors(anchors)?;
        if years == 0 {
            return Err(PricingError::invalid("years", "Curve must cover at least one year"));
        }
        if tolerance <= Decimal::ZERO {
            return Err(PricingError::invalid("tolerance", "Curve tolerance must be positive"));
        }

        let base = anchors[0];
        let mut normalised: Vec<Multiple> = anchors.iter().take(years).map(|a| a / base).collect();
        let held_years = years.saturating_sub(normalised.len());
        if let Some(last) = normalised.last().copied() {
            normalised.resize(years, last);
        }

        let weeks = Decimal::from(WEEKS_PER_YEAR as i64);
        let ramp_budget_share = tolerance / dec!(2);
        let mut multipliers = Vec::with_capacity(years * WEEKS_PER_YEAR);
        let mut prev = Decimal::ONE;

        for &current in &normalised {
            let drop = prev - current;
            let ramp_weeks = if drop.is_zero() {
                1
            } else {
                let budget = ramp_budget_share * weeks * current;
                let extra = (dec!(2) * budget / drop)
                    .floor()
                    .min(Decimal::from((WEEKS_PER_YEAR - 1) as i64));
                extra.to_usize().unwrap_or(0) + 1
            };
            let ramp = Decimal::from(ramp_weeks as i64);

            for k in 1..=WEEKS_PER_YEAR {
                let value = if k < ramp_weeks {
                    current + drop * Decimal::from((ramp_weeks - k) as i64) / ramp
                } else {
                    current
                };
                multipliers.push(value);
            }
            prev = current;
        }

        Ok(Self {
            multipliers,
            anchors: normalised,
            held_years,
        })
    }

    pub fn multipliers(&self) -> &[Multiple] {
        &self.multipliers
    }

    /// Normalised anchors, one per modelled year.
    pub fn anchors(&self) -> &[Multiple] {
        &self.anchors
    }

    pub fn held_years(&self) -> usize {
        self.held_years
    }

    pub fn len(&self) -> usize {
        self.multipliers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.multipliers.is_empty()
    }

    pub fn years(&self) -> usize {
        self.anchors.len()
    }

    /// Multiplier at 0-based week index.
    pub fn at(&self, week: usize) -> Option<Multiple> {
        self.multipliers.get(week).copied()
    }

    pub fn final_multiplier(&self) -> Multiple {
        self.multipliers.last().copied().unwrap_or(Decimal::ZERO)
    }

    /// Sum of weekly multipliers in each 52-week year.
    pub fn annual_sums(&self) -> Vec<Multiple> {
        crate::types::aggregate_blocks(&self.multipliers, WEEKS_PER_YEAR)
    }

    /// Compare each year's mean multiplier with its anchor.
    pub fn validate_against_anchors(&self, tolerance: Rate) -> CurveValidation {
        let weeks = Decimal::from(WEEKS_PER_YEAR as i64);
        let mut max_error = Decimal::ZERO;
        let mut worst_year = None;
        let mut years = Vec::with_capacity(self.anchors.len());

        for (i, (sum, anchor)) in self.annual_sums().iter().zip(&self.anchors).enumerate() {
            let modelled = sum / weeks;
            let relative_error = if anchor.is_zero() {
                modelled.abs()
            } else {
                ((modelled - anchor) / anchor).abs()
            };
            if relative_error > max_error {
                max_error = relative_error;
                worst_year = Some((i + 1) as u32);
            }
            years.push(YearFidelity {
                year: (i + 1) as u32,
                anchor: *anchor,
                modelled,
                relative_error,
            });
        }

        CurveValidation {
            valid: max_error <= tolerance,
            tolerance,
            max_error,
            worst_year,
            years,
        }
    }
}
