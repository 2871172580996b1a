use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, warn};

use super::SolverOutcome;
use crate::config::SolverConfig;
use crate::error::PricingError;
use crate::recoupment::{CashFlowEngine, CashFlowRun, DealTerms, InvestmentSplit};
use crate::time_value::{self, IRR_CEILING, IRR_FLOOR};
use crate::types::{Money, Rate};
use crate::PricingResult;

/// Doublings allowed while searching for an upper bracket.
const MAX_BRACKET_DOUBLINGS: u32 = 30;

/// IRR of the label cash flows `[-I, label_1, ..]` of a run.
///
/// `None` when the flows do not change sign exactly once (no unique root) or
/// the root lies outside [-99%, 1000%].
pub fn realized_irr(run: &CashFlowRun) -> Option<Rate> {
    let flows = run.label_cash_flows();
    if time_value::sign_changes(&flows) != 1 {
        return None;
    }
    time_value::irr(&flows, dec!(0.10)).ok()
}

/// Largest investment whose annual label cash flows reach `target` IRR.
///
/// The label NPV at `target` falls as the investment grows, so bisection on
/// its sign brackets the answer. The search stops once the realized IRR is
/// within `irr_epsilon` of the target or the bracket is narrower than the
/// dollar tolerance.
pub fn solve_irr(
    annual_gross: &[Money],
    terms: DealTerms,
    split: InvestmentSplit,
    target: Rate,
    config: &SolverConfig,
) -> PricingResult<SolverOutcome> {
    if target <= IRR_FLOOR || target >= IRR_CEILING {
        return Err(PricingError::invalid(
            "target_irr",
            format!("Target IRR {target} must lie between {IRR_FLOOR} and {IRR_CEILING}"),
        ));
    }
    let engine = CashFlowEngine::new(annual_gross, terms)?;

    let npv_at_target = |total: Money| -> PricingResult<Money> {
        let run = engine.run(&split.investment(total))?;
        time_value::npv(target, &run.label_cash_flows())
    };

    // Nothing to buy: no label cash at any price.
    if npv_at_target(Decimal::ZERO)? <= Decimal::ZERO {
        debug!(%target, "no label cash flow, IRR investment is zero");
        return Ok(SolverOutcome {
            investment: Decimal::ZERO,
            iterations: 0,
            converged: true,
        });
    }

    let mut lo = Decimal::ZERO;
    let mut hi = engine.total_gross().max(config.tolerance);
    let mut doublings = 0;
    while npv_at_target(hi)? > Decimal::ZERO {
        if doublings >= MAX_BRACKET_DOUBLINGS {
            return Err(PricingError::ConvergenceFailure {
                function: "IRR solver bracket".into(),
                iterations: doublings,
                last_delta: hi,
            });
        }
        lo = hi;
        hi *= dec!(2);
        doublings += 1;
    }

    let mut iterations = 0;
    let mut converged = false;
    while iterations < config.max_iterations {
        let mid = (lo + hi) / dec!(2);
        let run = engine.run(&split.investment(mid))?;
        iterations += 1;

        if let Some(irr) = realized_irr(&run) {
            if (irr - target).abs() < config.irr_epsilon {
                lo = mid;
                converged = true;
                break;
            }
        }
        if time_value::npv(target, &run.label_cash_flows())? > Decimal::ZERO {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo <= config.tolerance {
            converged = true;
            break;
        }
    }

    if converged {
        debug!(%target, investment = %lo, iterations, "IRR solver converged");
    } else {
        warn!(%target, investment = %lo, gap = %(hi - lo), iterations, "IRR solver hit iteration cap");
    }

    Ok(SolverOutcome {
        investment: lo,
        iterations,
        converged,
    })
}
