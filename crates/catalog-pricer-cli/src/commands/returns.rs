use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Instant;

use catalog_pricer_core::analysis::comparison;
use catalog_pricer_core::time_value;
use catalog_pricer_core::types::{with_metadata, Money, Multiple, Rate};

use crate::input;

/// Cash flows with t0 first (investment negative).
#[derive(Debug, Deserialize)]
pub struct CashFlowInput {
    pub cash_flows: Vec<Money>,
    #[serde(default)]
    pub rates: Vec<Rate>,
}

/// Arguments for NPV across discount rates
#[derive(Args)]
pub struct NpvArgs {
    /// Path to JSON input `{cash_flows, rates}` (overrides flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Cash flows, t0 first (comma-separated, e.g. "-100,30,40,50")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,

    /// Discount rates (comma-separated)
    #[arg(long, value_delimiter = ',', default_values_t = vec![dec!(0.05), dec!(0.10), dec!(0.15)])]
    pub rates: Vec<Decimal>,
}

pub fn run_npv(args: NpvArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut data = read_cash_flows(args.input.as_deref(), args.cash_flows)?;
    if data.rates.is_empty() {
        data.rates = args.rates;
    }
    let result = comparison::npv_sensitivity(&data.cash_flows, &data.rates)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for IRR and MOIC of a cash-flow series
#[derive(Args)]
pub struct IrrArgs {
    /// Path to JSON input `{cash_flows}` (overrides flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Cash flows, t0 first (comma-separated, e.g. "-100,30,40,50")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,

    /// Starting guess for the Newton iteration
    #[arg(long, default_value_t = dec!(0.10))]
    pub guess: Decimal,
}

#[derive(Serialize)]
struct ReturnMetrics {
    irr: Option<Rate>,
    moic: Option<Multiple>,
    payback_period: Option<u32>,
    sign_changes: usize,
}

pub fn run_irr(args: IrrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let data = read_cash_flows(args.input.as_deref(), args.cash_flows)?;
    let flows = &data.cash_flows;
    let mut warnings = Vec::new();

    let sign_changes = time_value::sign_changes(flows);
    let irr = if sign_changes == 1 {
        Some(time_value::irr(flows, args.guess)?)
    } else {
        warnings.push(format!(
            "IRR undefined: cash flows change sign {sign_changes} time(s)"
        ));
        None
    };

    let invested: Money = flows.iter().filter(|c| c.is_sign_negative()).map(|c| -*c).sum();
    let inflows: Money = flows.iter().filter(|c| c.is_sign_positive()).sum();
    let moic = if invested.is_zero() {
        None
    } else {
        Some(time_value::moic(inflows, invested)?)
    };

    let metrics = ReturnMetrics {
        irr,
        moic,
        payback_period: time_value::payback_period(flows),
        sign_changes,
    };
    let assumptions = json!({ "periods": flows.len(), "guess": args.guess.to_string() });
    let elapsed = start.elapsed().as_micros() as u64;
    let output = with_metadata("IRR and MOIC of periodic cash flows", &assumptions, warnings, elapsed, metrics);
    Ok(serde_json::to_value(output)?)
}

fn read_cash_flows(
    path: Option<&str>,
    flags: Option<Vec<Decimal>>,
) -> Result<CashFlowInput, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        input::file::read_json(path)
    } else if let Some(data) = input::stdin::read_stdin()? {
        Ok(data)
    } else {
        let cash_flows = flags.ok_or("--cash-flows is required (or provide --input)")?;
        Ok(CashFlowInput {
            cash_flows,
            rates: Vec::new(),
        })
    }
}
