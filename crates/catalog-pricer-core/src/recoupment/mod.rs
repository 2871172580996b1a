//! Label/artist split of each period's revenue under the three deal
//! structures, with the unrecouped balance carried across periods.

pub mod engine;
pub mod terms;

pub use engine::{CashFlowEngine, CashFlowPeriod, CashFlowRun, CashFlowTotals};
pub use terms::{DealTerms, DealType, Investment, InvestmentSplit, PeriodSplit, RecoupmentState};
