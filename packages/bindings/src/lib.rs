use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::RwLock;

use catalog_pricer_core::analysis::comparison::{self, ComparisonInput};
use catalog_pricer_core::analysis::viability::{self, ViabilityInput};
use catalog_pricer_core::analysis::{self, DealInputs};
use catalog_pricer_core::decay::WeeklyDecayCurve;
use catalog_pricer_core::tables::{DecayAnchorTable, MarketData, PpuRateTable};
use catalog_pricer_core::AnalyzerConfig;

/// Tables shared by every call until the host reloads them.
static TABLES: RwLock<Option<MarketData>> = RwLock::new(None);

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_config(config_json: Option<String>) -> NapiResult<AnalyzerConfig> {
    let config: AnalyzerConfig = match config_json {
        Some(json) => serde_json::from_str(&json).map_err(to_napi_error)?,
        None => AnalyzerConfig::default(),
    };
    config.validate().map_err(to_napi_error)?;
    Ok(config)
}

/// Run `f` against the cached tables.
fn with_tables<T>(f: impl FnOnce(&MarketData) -> NapiResult<T>) -> NapiResult<T> {
    let guard = TABLES.read().map_err(to_napi_error)?;
    let tables = guard
        .as_ref()
        .ok_or_else(|| napi::Error::from_reason("Lookup tables not loaded; call loadTables first"))?;
    f(tables)
}

// ---------------------------------------------------------------------------
// Table cache
// ---------------------------------------------------------------------------

/// Load (or reload) the decay and PPU tables. Returns a summary of what was
/// cached.
#[napi]
pub fn load_tables(decay_json: String, ppu_json: String) -> NapiResult<String> {
    let decay: DecayAnchorTable = serde_json::from_str(&decay_json).map_err(to_napi_error)?;
    let ppu: PpuRateTable = serde_json::from_str(&ppu_json).map_err(to_napi_error)?;
    let summary = serde_json::json!({
        "genres": decay.genres().collect::<Vec<_>>(),
        "countries": ppu.countries().collect::<Vec<_>>(),
    });
    let mut guard = TABLES.write().map_err(to_napi_error)?;
    *guard = Some(MarketData::new(decay, ppu));
    serde_json::to_string(&summary).map_err(to_napi_error)
}

#[napi]
pub fn tables_loaded() -> NapiResult<bool> {
    Ok(TABLES.read().map_err(to_napi_error)?.is_some())
}

#[napi]
pub fn clear_tables() -> NapiResult<()> {
    *TABLES.write().map_err(to_napi_error)? = None;
    Ok(())
}

// ---------------------------------------------------------------------------
// Pricing
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_deal(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let input: DealInputs = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let config = parse_config(config_json)?;
    let output = with_tables(|tables| {
        analysis::analyze_deal(&input, tables, &config).map_err(to_napi_error)
    })?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn evaluate_viability(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let input: ViabilityInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let config = parse_config(config_json)?;
    let output = with_tables(|tables| {
        viability::evaluate_viability(&input, tables, &config).map_err(to_napi_error)
    })?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn compare_deal_types(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let input: ComparisonInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let config = parse_config(config_json)?;
    let output = with_tables(|tables| {
        comparison::compare_deal_types(&input, tables, &config).map_err(to_napi_error)
    })?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Curves and returns
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct CurveRequest {
    #[serde(default)]
    genre: Option<String>,
    #[serde(default)]
    anchors: Option<Vec<Decimal>>,
    #[serde(default = "default_years")]
    years: usize,
    #[serde(default = "default_tolerance")]
    tolerance: Decimal,
}

fn default_years() -> usize {
    10
}

fn default_tolerance() -> Decimal {
    Decimal::new(5, 3)
}

/// Weekly multipliers and the anchor check for a genre (from the cached
/// table) or explicit anchors.
#[napi]
pub fn decay_curve(input_json: String) -> NapiResult<String> {
    let req: CurveRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let anchors = match (req.anchors, req.genre.as_deref()) {
        (Some(anchors), _) => anchors,
        (None, Some(genre)) => with_tables(|tables| {
            tables
                .decay
                .anchors(genre)
                .map(|a| a.to_vec())
                .map_err(to_napi_error)
        })?,
        (None, None) => return Err(napi::Error::from_reason("genre or anchors is required")),
    };
    let curve = WeeklyDecayCurve::build(&anchors, req.years, req.tolerance).map_err(to_napi_error)?;
    let output = serde_json::json!({
        "multipliers": curve.multipliers(),
        "annual_sums": curve.annual_sums(),
        "held_years": curve.held_years(),
        "validation": curve.validate_against_anchors(req.tolerance),
    });
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct SensitivityRequest {
    cash_flows: Vec<Decimal>,
    rates: Vec<Decimal>,
}

#[napi]
pub fn npv_sensitivity(input_json: String) -> NapiResult<String> {
    let req: SensitivityRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = comparison::npv_sensitivity(&req.cash_flows, &req.rates).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
