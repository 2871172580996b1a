use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::terms::{DealTerms, Investment, RecoupmentState};
use crate::error::PricingError;
use crate::types::Money;
use crate::PricingResult;

/// One simulated period.
///
/// `label_cash + artist_cash == pool` in every period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowPeriod {
    /// 1-based period index.
    pub period: u32,
    pub gross: Money,
    /// Investment expensed this period (profit split only).
    pub expenses: Money,
    pub pool: Money,
    pub label_cash: Money,
    pub artist_cash: Money,
    pub recoup_balance_remaining: Money,
    pub recouped_this_period: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CashFlowTotals {
    pub gross: Money,
    pub expenses: Money,
    pub label_cash: Money,
    pub artist_cash: Money,
}

/// Full simulation at one investment amount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowRun {
    pub investment: Investment,
    pub periods: Vec<CashFlowPeriod>,
    /// Period in which the balance cleared; 0 when nothing was recoupable.
    pub recoup_period: Option<u32>,
    pub final_state: RecoupmentState,
    pub totals: CashFlowTotals,
}

impl CashFlowRun {
    pub fn label_cash(&self) -> Vec<Money> {
        self.periods.iter().map(|p| p.label_cash).collect()
    }

    pub fn artist_cash(&self) -> Vec<Money> {
        self.periods.iter().map(|p| p.artist_cash).collect()
    }

    /// Label cash flows with the investment as a t0 outflow.
    pub fn label_cash_flows(&self) -> Vec<Money> {
        std::iter::once(-self.investment.total)
            .chain(self.periods.iter().map(|p| p.label_cash))
            .collect()
    }
}

/// Runs a gross revenue series through the recoupment rules of one deal.
///
/// The series may be weekly (payback solving) or annual (IRR solving); the
/// engine only sees periods.
#[derive(Debug, Clone)]
pub struct CashFlowEngine<'a> {
    gross: &'a [Money],
    terms: DealTerms,
    total_gross: Money,
}

impl<'a> CashFlowEngine<'a> {
    pub fn new(gross: &'a [Money], terms: DealTerms) -> PricingResult<Self> {
        if gross.is_empty() {
            return Err(PricingError::InsufficientData(
                "Cash-flow simulation needs at least one period".into(),
            ));
        }
        if let Some(i) = gross.iter().position(|g| g.is_sign_negative() && !g.is_zero()) {
            return Err(PricingError::invalid(
                format!("gross[{i}]"),
                "Gross revenue cannot be negative",
            ));
        }
        Ok(Self {
            gross,
            terms,
            total_gross: gross.iter().copied().sum(),
        })
    }

    pub fn terms(&self) -> &DealTerms {
        &self.terms
    }

    pub fn periods(&self) -> usize {
        self.gross.len()
    }

    pub fn total_gross(&self) -> Money {
        self.total_gross
    }

    /// Simulate every period at `investment`.
    pub fn run(&self, investment: &Investment) -> PricingResult<CashFlowRun> {
        if investment.total.is_sign_negative() && !investment.total.is_zero() {
            return Err(PricingError::invalid(
                "investment",
                "Investment cannot be negative",
            ));
        }

        let mut state = RecoupmentState::new(investment.recoupable());
        let mut periods = Vec::with_capacity(self.gross.len());
        let mut totals = CashFlowTotals::default();

        for (i, gross) in self.gross.iter().enumerate() {
            let period = (i + 1) as u32;
            let expenses = self.expenses(investment.total, *gross);
            let pool = (gross - expenses).max(Decimal::ZERO);
            let split = state.apply(period, pool, &self.terms);

            totals.gross += gross;
            totals.expenses += expenses;
            totals.label_cash += split.label;
            totals.artist_cash += split.artist;

            periods.push(CashFlowPeriod {
                period,
                gross: *gross,
                expenses,
                pool,
                label_cash: split.label,
                artist_cash: split.artist,
                recoup_balance_remaining: state.remaining(),
                recouped_this_period: split.recouped_now,
            });
        }

        Ok(CashFlowRun {
            investment: *investment,
            recoup_period: state.recouped_in_period,
            final_state: state,
            periods,
            totals,
        })
    }

    /// Period in which `investment` recoups, without keeping the periods.
    pub fn recoup_period(&self, investment: &Investment) -> Option<u32> {
        let mut state = RecoupmentState::new(investment.recoupable());
        for (i, gross) in self.gross.iter().enumerate() {
            if state.is_recouped {
                break;
            }
            let pool = (gross - self.expenses(investment.total, *gross)).max(Decimal::ZERO);
            state.apply((i + 1) as u32, pool, &self.terms);
        }
        state.recouped_in_period
    }

    /// Investment expensed against `gross`, in proportion to the period's
    /// share of total gross.
    fn expenses(&self, total_investment: Money, gross: Money) -> Money {
        if !self.terms.deal_type.deducts_expenses() || self.total_gross.is_zero() {
            return Decimal::ZERO;
        }
        total_investment * gross / self.total_gross
    }
}
