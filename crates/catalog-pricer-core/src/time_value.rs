use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::PricingError;
use crate::types::{Money, Multiple, Rate};
use crate::PricingResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const MAX_IRR_ITERATIONS: u32 = 100;
const MAX_BISECTION_ITERATIONS: u32 = 200;
const RATE_TOLERANCE: Decimal = dec!(0.0000000001);
const MAX_EDGE_SHRINKS: u32 = 64;

/// Lower edge of the IRR search domain (-99%).
pub const IRR_FLOOR: Rate = dec!(-0.99);
/// Upper edge of the IRR search domain (1000%).
pub const IRR_CEILING: Rate = dec!(10);

/// Net Present Value of a series of cash flows, period 0 undiscounted.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> PricingResult<Money> {
    if rate <= dec!(-1) {
        return Err(PricingError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }
    discounted(rate, cash_flows, false).map(|(value, _)| value)
}

/// NPV and, when asked, its derivative with respect to the rate.
///
/// Every step is checked. Once a growing discount factor leaves the Decimal
/// range the remaining terms are below Decimal precision and are dropped; a
/// shrinking factor that underflows or a term that overflows is an error.
fn discounted(rate: Rate, cash_flows: &[Money], slope: bool) -> PricingResult<(Money, Money)> {
    let one_plus_r = Decimal::ONE + rate;
    let mut value = Decimal::ZERO;
    let mut derivative = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            match discount.checked_mul(one_plus_r) {
                Some(next) => discount = next,
                None if one_plus_r > Decimal::ONE => break,
                None => return Err(overflow(format!("discount factor at period {t}"))),
            }
        }
        if discount.is_zero() {
            return Err(PricingError::DivisionByZero {
                context: format!("NPV discount factor at period {t}"),
            });
        }
        let pv = cf
            .checked_div(discount)
            .ok_or_else(|| overflow(format!("present value at period {t}")))?;
        value = value
            .checked_add(pv)
            .ok_or_else(|| overflow("NPV sum".into()))?;
        if slope && t > 0 {
            let term = pv
                .checked_mul(Decimal::from(t as i64))
                .and_then(|x| x.checked_div(one_plus_r))
                .ok_or_else(|| overflow(format!("NPV derivative at period {t}")))?;
            derivative = derivative
                .checked_sub(term)
                .ok_or_else(|| overflow("NPV derivative sum".into()))?;
        }
    }

    Ok((value, derivative))
}

fn overflow(context: String) -> PricingError {
    PricingError::Overflow { context }
}

/// Present value of inflows received at periods 1..=n.
pub fn pv_of_inflows(rate: Rate, inflows: &[Money]) -> PricingResult<Money> {
    let mut flows = Vec::with_capacity(inflows.len() + 1);
    flows.push(Decimal::ZERO);
    flows.extend_from_slice(inflows);
    npv(rate, &flows)
}

/// Number of sign changes in a cash-flow series, ignoring zero flows.
pub fn sign_changes(cash_flows: &[Money]) -> usize {
    let mut changes = 0;
    let mut last: Option<bool> = None;
    for cf in cash_flows.iter().filter(|cf| !cf.is_zero()) {
        let positive = cf.is_sign_positive();
        if let Some(prev) = last {
            if prev != positive {
                changes += 1;
            }
        }
        last = Some(positive);
    }
    changes
}

/// Internal Rate of Return.
///
/// Newton-Raphson from `guess`, kept inside [-99%, 1000%]. When Newton stalls
/// (flat derivative or no convergence) the root is bracketed and found by
/// bisection on the same domain.
pub fn irr(cash_flows: &[Money], guess: Rate) -> PricingResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(PricingError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }

    match irr_newton(cash_flows, guess) {
        Ok(rate) => Ok(rate),
        Err(_) => irr_bisection(cash_flows, IRR_FLOOR, IRR_CEILING),
    }
}

fn irr_newton(cash_flows: &[Money], guess: Rate) -> PricingResult<Rate> {
    let mut rate = guess.clamp(IRR_FLOOR, IRR_CEILING);

    for i in 0..MAX_IRR_ITERATIONS {
        let (npv_val, dnpv) = discounted(rate, cash_flows, true)?;

        if npv_val.abs() < CONVERGENCE_THRESHOLD {
            return Ok(rate);
        }

        if dnpv.is_zero() {
            return Err(PricingError::ConvergenceFailure {
                function: "IRR".into(),
                iterations: i,
                last_delta: npv_val,
            });
        }

        let step = npv_val
            .checked_div(dnpv)
            .ok_or_else(|| overflow("Newton step".into()))?;
        let next = rate
            .checked_sub(step)
            .unwrap_or(if step.is_sign_positive() { IRR_FLOOR } else { IRR_CEILING })
            .clamp(IRR_FLOOR, IRR_CEILING);
        // pinned to an edge of the domain without a root there
        if next == rate && (next == IRR_FLOOR || next == IRR_CEILING) {
            return Err(PricingError::ConvergenceFailure {
                function: "IRR".into(),
                iterations: i,
                last_delta: npv_val,
            });
        }
        if (next - rate).abs() < RATE_TOLERANCE {
            return Ok(next);
        }
        rate = next;
    }

    Err(PricingError::ConvergenceFailure {
        function: "IRR".into(),
        iterations: MAX_IRR_ITERATIONS,
        last_delta: npv(rate, cash_flows).unwrap_or(Decimal::MAX),
    })
}

/// IRR by bisection on `[lo, hi]`. The NPV must change sign across the bracket.
pub fn irr_bisection(cash_flows: &[Money], lo: Rate, hi: Rate) -> PricingResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(PricingError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }
    if lo <= dec!(-1) || hi <= lo {
        return Err(PricingError::InvalidInput {
            field: "irr_bracket".into(),
            reason: format!("Invalid bracket [{lo}, {hi}]"),
        });
    }

    let (mut lo, mut npv_lo) = representable_edge(cash_flows, lo, hi)?;
    let mut hi = hi;
    let npv_hi = npv(hi, cash_flows)?;

    if npv_lo.is_zero() {
        return Ok(lo);
    }
    if npv_hi.is_zero() {
        return Ok(hi);
    }
    if npv_lo.is_sign_positive() == npv_hi.is_sign_positive() {
        return Err(PricingError::ConvergenceFailure {
            function: "IRR bisection".into(),
            iterations: 0,
            last_delta: npv_lo.abs().min(npv_hi.abs()),
        });
    }

    for _ in 0..MAX_BISECTION_ITERATIONS {
        let mid = (lo + hi) / dec!(2);
        let npv_mid = npv(mid, cash_flows)?;

        if npv_mid.abs() < CONVERGENCE_THRESHOLD || (hi - lo) < RATE_TOLERANCE {
            return Ok(mid);
        }

        if npv_mid.is_sign_positive() == npv_lo.is_sign_positive() {
            lo = mid;
            npv_lo = npv_mid;
        } else {
            hi = mid;
        }
    }

    Ok((lo + hi) / dec!(2))
}

/// Move `lo` toward zero until the NPV there fits in a Decimal. Deeply
/// negative rates on long series blow the discount factors up.
fn representable_edge(cash_flows: &[Money], lo: Rate, hi: Rate) -> PricingResult<(Rate, Money)> {
    let mut edge = lo;
    let mut last_err = None;
    for _ in 0..MAX_EDGE_SHRINKS {
        if edge >= hi {
            break;
        }
        match npv(edge, cash_flows) {
            Ok(value) => return Ok((edge, value)),
            Err(e) => last_err = Some(e),
        }
        edge = if edge.is_sign_negative() {
            edge / dec!(2)
        } else {
            (edge + hi) / dec!(2)
        };
    }
    Err(last_err.unwrap_or(PricingError::InvalidInput {
        field: "irr_bracket".into(),
        reason: format!("No representable NPV in [{lo}, {hi}]"),
    }))
}

/// Multiple on invested capital: total inflows over the invested amount.
pub fn moic(total_inflows: Money, invested: Money) -> PricingResult<Multiple> {
    if invested.is_zero() {
        return Err(PricingError::DivisionByZero {
            context: "MOIC invested capital".into(),
        });
    }
    Ok(total_inflows / invested.abs())
}

/// First period t >= 1 at which the cumulative sum of `cash_flows` (period 0
/// included) turns non-negative.
pub fn payback_period(cash_flows: &[Money]) -> Option<u32> {
    let mut cumulative = Decimal::ZERO;
    for (t, cf) in cash_flows.iter().enumerate() {
        cumulative += cf;
        if t >= 1 && cumulative >= Decimal::ZERO {
            return Some(t as u32);
        }
    }
    None
}
