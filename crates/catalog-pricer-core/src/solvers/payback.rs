use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, warn};

use super::SolverOutcome;
use crate::config::SolverConfig;
use crate::error::PricingError;
use crate::recoupment::{CashFlowEngine, DealTerms, InvestmentSplit};
use crate::types::Money;
use crate::PricingResult;

/// Largest investment that recoups within `horizon` periods.
///
/// Bisection on `[0, recoup_rate × Σ gross over the horizon / recoupable
/// fraction]`, simulating the full series at every step. Recoup period is
/// non-decreasing in the investment, so the feasible set is an interval
/// starting at zero. With nothing recoupable every investment "recoups" at
/// once; the answer is then capped at the gross earned inside the window.
pub fn solve_payback(
    gross: &[Money],
    terms: DealTerms,
    split: InvestmentSplit,
    horizon: u32,
    config: &SolverConfig,
) -> PricingResult<SolverOutcome> {
    if horizon == 0 {
        return Err(PricingError::invalid(
            "payback_horizon",
            "Payback horizon must be at least one period",
        ));
    }
    let engine = CashFlowEngine::new(gross, terms)?;
    let feasible = |total: Money| -> bool {
        matches!(engine.recoup_period(&split.investment(total)), Some(p) if p <= horizon)
    };

    let window = (horizon as usize).min(gross.len());
    let window_gross: Money = gross[..window].iter().copied().sum();
    let fraction = split.recoupable_fraction();
    if fraction.is_zero() {
        warn!(investment = %window_gross, "nothing recoupable, payback capped at window gross");
        return Ok(SolverOutcome {
            investment: window_gross,
            iterations: 0,
            converged: true,
        });
    }
    let mut hi = window_gross * terms.recoup_rate() / fraction;
    let mut lo = Decimal::ZERO;

    if hi <= Decimal::ZERO || feasible(hi) {
        debug!(investment = %hi, "payback bound is feasible");
        return Ok(SolverOutcome {
            investment: hi.max(Decimal::ZERO),
            iterations: 0,
            converged: true,
        });
    }

    let mut iterations = 0;
    while hi - lo > config.tolerance && iterations < config.max_iterations {
        let mid = (lo + hi) / dec!(2);
        if feasible(mid) {
            lo = mid;
        } else {
            hi = mid;
        }
        iterations += 1;
    }

    let converged = hi - lo <= config.tolerance;
    if converged {
        debug!(investment = %lo, iterations, "payback solver converged");
    } else {
        warn!(investment = %lo, gap = %(hi - lo), iterations, "payback solver hit iteration cap");
    }

    Ok(SolverOutcome {
        investment: lo,
        iterations,
        converged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recoupment::DealType;

    fn split() -> InvestmentSplit {
        InvestmentSplit::new(dec!(1), true).unwrap()
    }

    #[test]
    fn test_flat_distribution_recovers_horizon_gross() {
        let gross = vec![dec!(1000); 520];
        let terms = DealTerms::new(DealType::Distribution, dec!(0.3)).unwrap();
        let out = solve_payback(&gross, terms, split(), 78, &SolverConfig::default()).unwrap();
        assert_eq!(out.investment, dec!(78000));
        assert!(out.converged);
    }

    #[test]
    fn test_advance_only_recoupable_scales_bound() {
        let gross = vec![dec!(1000); 520];
        let terms = DealTerms::new(DealType::Distribution, dec!(0.3)).unwrap();
        let half = InvestmentSplit::new(dec!(0.5), false).unwrap();
        let out = solve_payback(&gross, terms, half, 78, &SolverConfig::default()).unwrap();
        assert_eq!(out.investment, dec!(156000));
    }

    #[test]
    fn test_nothing_recoupable_caps_at_window_gross() {
        let gross = vec![dec!(1000); 520];
        let terms = DealTerms::new(DealType::Distribution, dec!(0.3)).unwrap();
        let marketing_only = InvestmentSplit::new(Decimal::ZERO, false).unwrap();
        let out = solve_payback(&gross, terms, marketing_only, 78, &SolverConfig::default()).unwrap();
        assert_eq!(out.investment, dec!(78000));
        assert_eq!(out.iterations, 0);
    }

    #[test]
    fn test_iteration_cap_reports_not_converged() {
        let gross = vec![dec!(1000); 520];
        let terms = DealTerms::new(DealType::ProfitSplit, dec!(0.5)).unwrap();
        let cfg = SolverConfig {
            max_iterations: 3,
            ..SolverConfig::default()
        };
        let out = solve_payback(&gross, terms, split(), 78, &cfg).unwrap();
        assert!(!out.converged);
        assert_eq!(out.iterations, 3);
        assert!(out.investment > Decimal::ZERO);
    }

    #[test]
    fn test_zero_horizon_rejected() {
        let terms = DealTerms::new(DealType::Distribution, dec!(0.3)).unwrap();
        assert!(solve_payback(&[dec!(1)], terms, split(), 0, &SolverConfig::default()).is_err());
    }
}
