//! Analyzer settings. Every field has a default so partial JSON/YAML files
//! deserialize cleanly.

use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::PricingError;
use crate::types::{Money, Rate};
use crate::PricingResult;

/// Bisection settings shared by the payback and IRR solvers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Stop when the investment bracket is narrower than this (dollars).
    pub tolerance: Money,
    /// Hard cap on bisection steps.
    pub max_iterations: u32,
    /// Accepted distance between realized and target IRR.
    pub irr_epsilon: Rate,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: dec!(1),
            max_iterations: 100,
            irr_epsilon: dec!(0.0001),
        }
    }
}

/// Which solver result becomes the recommended investment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationPolicy {
    /// Lower of the payback and primary-IRR investments.
    #[default]
    Minimum,
    Payback,
    Irr,
}

/// What to do when the requested genre has no decay anchors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenreFallback {
    #[default]
    Reject,
    /// Use the year-by-year mean of every genre in the table.
    Average,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Payback window in weeks (18 months).
    pub payback_horizon_weeks: u32,
    /// Projection length in years; weekly series cover `years * 52` weeks.
    pub projection_years: u32,
    /// Every IRR target to solve for.
    pub target_irrs: Vec<Rate>,
    /// Target whose solution feeds the recommendation policy.
    pub primary_target_irr: Rate,
    /// Discount rate for label NPV.
    pub discount_rate: Rate,
    pub recommendation: RecommendationPolicy,
    pub solver: SolverConfig,
    /// Allowed relative gap between a year's weekly sum and its anchor.
    pub curve_tolerance: Rate,
    pub genre_fallback: GenreFallback,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            payback_horizon_weeks: 78,
            projection_years: 10,
            target_irrs: vec![dec!(0.10), dec!(0.15)],
            primary_target_irr: dec!(0.15),
            discount_rate: dec!(0.10),
            recommendation: RecommendationPolicy::Minimum,
            solver: SolverConfig::default(),
            curve_tolerance: dec!(0.005),
            genre_fallback: GenreFallback::Reject,
        }
    }
}

impl AnalyzerConfig {
    pub fn validate(&self) -> PricingResult<()> {
        if self.payback_horizon_weeks == 0 {
            return Err(PricingError::invalid(
                "payback_horizon_weeks",
                "Payback horizon must be at least one week",
            ));
        }
        if self.projection_years == 0 {
            return Err(PricingError::invalid(
                "projection_years",
                "Projection must cover at least one year",
            ));
        }
        for target in self.target_irrs.iter().chain(std::iter::once(&self.primary_target_irr)) {
            if *target <= dec!(-0.99) {
                return Err(PricingError::invalid(
                    "target_irrs",
                    format!("Target IRR {target} must be above -99%"),
                ));
            }
        }
        if self.discount_rate <= dec!(-1) {
            return Err(PricingError::invalid(
                "discount_rate",
                "Discount rate must be greater than -100%",
            ));
        }
        if self.solver.tolerance <= Money::ZERO {
            return Err(PricingError::invalid(
                "solver.tolerance",
                "Solver tolerance must be positive",
            ));
        }
        if self.solver.max_iterations == 0 {
            return Err(PricingError::invalid(
                "solver.max_iterations",
                "Solver needs at least one iteration",
            ));
        }
        if self.curve_tolerance <= Rate::ZERO {
            return Err(PricingError::invalid(
                "curve_tolerance",
                "Curve tolerance must be positive",
            ));
        }
        Ok(())
    }

    /// Target list with the primary target included exactly once.
    pub fn all_targets(&self) -> Vec<Rate> {
        let mut targets = self.target_irrs.clone();
        if !targets.contains(&self.primary_target_irr) {
            targets.push(self.primary_target_irr);
        }
        targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let cfg: AnalyzerConfig =
            serde_json::from_str(r#"{"recommendation": "irr", "solver": {"max_iterations": 20}}"#)
                .unwrap();
        assert_eq!(cfg.recommendation, RecommendationPolicy::Irr);
        assert_eq!(cfg.solver.max_iterations, 20);
        assert_eq!(cfg.solver.tolerance, dec!(1));
        assert_eq!(cfg.payback_horizon_weeks, 78);
    }

    #[test]
    fn test_primary_target_added_once() {
        let cfg = AnalyzerConfig {
            target_irrs: vec![dec!(0.10)],
            primary_target_irr: dec!(0.20),
            ..AnalyzerConfig::default()
        };
        assert_eq!(cfg.all_targets(), vec![dec!(0.10), dec!(0.20)]);
        assert_eq!(AnalyzerConfig::default().all_targets().len(), 2);
    }

    #[test]
    fn test_validate_rejects_zero_horizon() {
        let cfg = AnalyzerConfig {
            payback_horizon_weeks: 0,
            ..AnalyzerConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
