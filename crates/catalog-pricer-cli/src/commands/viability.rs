use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use catalog_pricer_core::analysis::viability::{self, ViabilityInput};

use super::analyze::{read_deal, DealFlags};
use super::{ConfigArgs, TableArgs};
use crate::input;

/// Arguments for evaluating a deal at a chosen advance and marketing spend
#[derive(Args)]
pub struct ViabilityArgs {
    /// Path to JSON input `{deal, advance, marketing}` (overrides flags)
    #[arg(long)]
    pub input: Option<String>,

    /// JSON deal inputs, used with --advance/--marketing
    #[arg(long)]
    pub deal: Option<String>,

    /// Advance paid to the artist
    #[arg(long)]
    pub advance: Option<Decimal>,

    /// Marketing spend
    #[arg(long)]
    pub marketing: Option<Decimal>,

    #[command(flatten)]
    pub tables: TableArgs,

    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(flatten)]
    pub flags: DealFlags,
}

pub fn run_viability(args: ViabilityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let viability_input: ViabilityInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else {
        ViabilityInput {
            deal: read_deal(args.deal.as_deref(), &args.flags)?,
            advance: args
                .advance
                .ok_or("--advance is required (or provide --input)")?,
            marketing: args.marketing.unwrap_or(Decimal::ZERO),
        }
    };
    let tables = args.tables.load()?;
    let config = args.config.resolve()?;

    let result = viability::evaluate_viability(&viability_input, &tables, &config)?;
    Ok(serde_json::to_value(result)?)
}
