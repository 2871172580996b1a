//! Inverse problems over the cash-flow engine: the largest investment that
//! still meets a payback window or a target IRR.

pub mod irr;
pub mod payback;

use serde::{Deserialize, Serialize};

pub use crate::config::SolverConfig;
pub use irr::{realized_irr, solve_irr};
pub use payback::solve_payback;

use crate::types::Money;

/// Result of one bisection solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverOutcome {
    /// Largest investment known to satisfy the constraint.
    pub investment: Money,
    pub iterations: u32,
    /// False when the iteration cap was hit first.
    pub converged: bool,
}
