use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Instant;

use catalog_pricer_core::decay::{CurveValidation, ShiftedDecayCurve, WeeklyDecayCurve};
use catalog_pricer_core::types::{with_metadata, Multiple};

use crate::input;

/// Arguments for inspecting a weekly decay curve
#[derive(Args)]
pub struct CurveArgs {
    /// Genre to look up in --decay-table
    #[arg(long)]
    pub genre: Option<String>,

    /// Decay anchor table (JSON or CSV)
    #[arg(long)]
    pub decay_table: Option<String>,

    /// Annual anchors given directly (comma-separated, year 1 first)
    #[arg(long, value_delimiter = ',')]
    pub anchors: Option<Vec<Decimal>>,

    /// Years to model
    #[arg(long, default_value_t = 10)]
    pub years: usize,

    /// Allowed relative gap between a year's mean and its anchor
    #[arg(long, default_value_t = dec!(0.005))]
    pub tolerance: Decimal,

    /// Shift the curve to a track this many weeks after release
    #[arg(long)]
    pub weeks_since_release: Option<i64>,
}

#[derive(Serialize)]
struct CurveReport {
    genre: Option<String>,
    weeks: usize,
    held_years: usize,
    final_multiplier: Multiple,
    annual_sums: Vec<Multiple>,
    validation: CurveValidation,
    #[serde(skip_serializing_if = "Option::is_none")]
    current_level: Option<Multiple>,
    multipliers: Vec<Multiple>,
}

pub fn run_curve(args: CurveArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let anchors: Vec<Decimal> = match (&args.anchors, &args.genre) {
        (Some(anchors), _) => anchors.clone(),
        (None, Some(genre)) => {
            let path = args
                .decay_table
                .as_deref()
                .ok_or("--decay-table is required with --genre")?;
            let table = input::tables::load_decay_table(path)?;
            table.anchors(genre)?.to_vec()
        }
        (None, None) => return Err("--anchors or --genre is required".into()),
    };

    let curve = WeeklyDecayCurve::build(&anchors, args.years, args.tolerance)?;
    let validation = curve.validate_against_anchors(args.tolerance);

    let mut warnings = Vec::new();
    if curve.held_years() > 0 {
        warnings.push(format!(
            "Final anchor held flat for {} year(s) past the table",
            curve.held_years()
        ));
    }
    if !validation.valid {
        warnings.push(format!(
            "Curve misses its anchors by up to {} (year {:?})",
            validation.max_error, validation.worst_year
        ));
    }

    let (multipliers, current_level) = match args.weeks_since_release {
        Some(weeks) => {
            let shifted = ShiftedDecayCurve::new(&curve, weeks, curve.len())?;
            if shifted.held_weeks() > 0 {
                warnings.push(format!(
                    "{} week(s) run past the curve and hold its final value",
                    shifted.held_weeks()
                ));
            }
            (shifted.multipliers().to_vec(), Some(shifted.current_level()))
        }
        None => (curve.multipliers().to_vec(), None),
    };

    let report = CurveReport {
        genre: args.genre.clone(),
        weeks: curve.len(),
        held_years: curve.held_years(),
        final_multiplier: curve.final_multiplier(),
        annual_sums: curve.annual_sums(),
        validation,
        current_level,
        multipliers,
    };
    let assumptions = json!({
        "years": args.years,
        "tolerance": args.tolerance.to_string(),
        "weeks_since_release": args.weeks_since_release,
    });
    let elapsed = start.elapsed().as_micros() as u64;
    let output = with_metadata(
        "Weekly decay curve from annual anchors",
        &assumptions,
        warnings,
        elapsed,
        report,
    );
    Ok(serde_json::to_value(output)?)
}
