use clap::Args;
use serde_json::Value;

use catalog_pricer_core::analysis::comparison::{self, ComparisonInput};

use super::analyze::{read_deal, DealFlags};
use super::{parse_shares, ConfigArgs, TableArgs};
use crate::input;

/// Arguments for pricing one deal under every deal type
#[derive(Args)]
pub struct CompareArgs {
    /// Path to JSON input `{deal, label_shares}` (overrides flags)
    #[arg(long)]
    pub input: Option<String>,

    /// JSON deal inputs, used with --label-shares
    #[arg(long)]
    pub deal: Option<String>,

    /// Label share per deal type (e.g. "royalty=0.2,distribution=0.3")
    #[arg(long, value_delimiter = ',')]
    pub label_shares: Option<Vec<String>>,

    #[command(flatten)]
    pub tables: TableArgs,

    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(flatten)]
    pub flags: DealFlags,
}

pub fn run_compare(args: CompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let comparison_input: ComparisonInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else {
        ComparisonInput {
            deal: read_deal(args.deal.as_deref(), &args.flags)?,
            label_shares: parse_shares(args.label_shares.as_deref().unwrap_or_default())?,
        }
    };
    let tables = args.tables.load()?;
    let config = args.config.resolve()?;

    let result = comparison::compare_deal_types(&comparison_input, &tables, &config)?;
    Ok(serde_json::to_value(result)?)
}
