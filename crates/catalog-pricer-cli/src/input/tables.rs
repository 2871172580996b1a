//! Lookup-table and config loading. Tables come from JSON (the serde shape of
//! the core tables) or CSV; the format is picked by file extension.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;

use catalog_pricer_core::tables::{CountryRate, DecayAnchorTable, MarketData, PpuRateTable};
use catalog_pricer_core::AnalyzerConfig;
use tracing::debug;

use super::file;

type LoadResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Load both tables.
pub fn load_market_data(decay_path: &str, ppu_path: &str) -> LoadResult<MarketData> {
    let decay = load_decay_table(decay_path)?;
    let ppu = load_ppu_table(ppu_path)?;
    debug!(genres = decay.len(), countries = ppu.len(), "tables loaded");
    Ok(MarketData::new(decay, ppu))
}

/// Decay anchors: JSON `{"Pop": ["1.0", "0.85", ...]}` or CSV
/// `genre,y1,y2,...` with one row per genre.
pub fn load_decay_table(path: &str) -> LoadResult<DecayAnchorTable> {
    if !file::has_extension(path, "csv") {
        return file::read_json(path);
    }
    let (_, contents) = file::read_text(path)?;
    parse_decay_csv(contents.as_bytes())
        .map_err(|e| format!("Failed to parse decay table '{path}': {e}").into())
}

/// PPU rates: JSON `{"USA": {"audio_rate": "0.004", "video_rate": "0.002"}}`
/// or CSV `country,audio_rate,video_rate`.
pub fn load_ppu_table(path: &str) -> LoadResult<PpuRateTable> {
    if !file::has_extension(path, "csv") {
        return file::read_json(path);
    }
    let (_, contents) = file::read_text(path)?;
    parse_ppu_csv(contents.as_bytes())
        .map_err(|e| format!("Failed to parse PPU table '{path}': {e}").into())
}

/// Analyzer settings from JSON or YAML; defaults when no file is given.
pub fn load_config(path: Option<&str>) -> LoadResult<AnalyzerConfig> {
    match path {
        Some(p) => file::read_structured(p),
        None => Ok(AnalyzerConfig::default()),
    }
}

fn parse_decay_csv<R: Read>(reader: R) -> LoadResult<DecayAnchorTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let mut curves = BTreeMap::new();

    for (line, record) in rdr.records().enumerate() {
        let record = record?;
        let mut fields = record.iter();
        let genre = match fields.next() {
            Some(g) if !g.is_empty() => g.to_string(),
            _ => return Err(format!("row {}: missing genre", line + 2).into()),
        };
        // short rows leave trailing cells empty
        let anchors = fields
            .filter(|f| !f.is_empty())
            .map(|f| {
                f.parse::<Decimal>()
                    .map_err(|e| format!("row {} ({genre}): '{f}': {e}", line + 2))
            })
            .collect::<Result<Vec<_>, _>>()?;
        curves.insert(genre, anchors);
    }

    Ok(DecayAnchorTable::new(curves)?)
}

#[derive(Deserialize)]
struct PpuRow {
    country: String,
    audio_rate: Decimal,
    video_rate: Decimal,
}

fn parse_ppu_csv<R: Read>(reader: R) -> LoadResult<PpuRateTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rates = BTreeMap::new();

    for row in rdr.deserialize() {
        let row: PpuRow = row?;
        rates.insert(
            row.country,
            CountryRate {
                audio_rate: row.audio_rate,
                video_rate: row.video_rate,
            },
        );
    }

    Ok(PpuRateTable::new(rates)?)
}
