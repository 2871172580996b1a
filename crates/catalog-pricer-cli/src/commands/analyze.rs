use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use catalog_pricer_core::analysis::{self, DealInputs};
use catalog_pricer_core::recoupment::DealType;

use super::{parse_shares, ConfigArgs, TableArgs};
use crate::input;

/// Deal description given on the command line instead of a JSON file.
#[derive(Args)]
pub struct DealFlags {
    /// Artist identifier
    #[arg(long)]
    pub artist_id: Option<String>,

    /// Current weekly audio streams across the catalog
    #[arg(long)]
    pub weekly_audio: Option<Decimal>,

    /// Current weekly video streams across the catalog
    #[arg(long)]
    pub weekly_video: Option<Decimal>,

    /// Tracks in the catalog
    #[arg(long)]
    pub track_count: Option<u32>,

    /// New songs owed under the deal
    #[arg(long, default_value_t = 0)]
    pub extra_tracks: u32,

    /// Genre (decay table key or alias)
    #[arg(long)]
    pub genre: Option<String>,

    /// royalty, distribution or profit_split
    #[arg(long)]
    pub deal_type: Option<DealType>,

    /// Label's nominal share (0-1)
    #[arg(long)]
    pub deal_percent: Option<Decimal>,

    /// Stream share per country (e.g. "USA=0.6,UK=0.4")
    #[arg(long, value_delimiter = ',')]
    pub markets: Option<Vec<String>>,

    /// Fraction of the investment paid as advance
    #[arg(long)]
    pub advance_share: Option<Decimal>,

    /// Marketing spend recoups alongside the advance
    #[arg(long)]
    pub marketing_recoupable: bool,

    /// Weeks the catalog already sits past its peak
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub weeks_post_peak: i64,
}

impl DealFlags {
    pub fn to_inputs(&self) -> Result<DealInputs, Box<dyn std::error::Error>> {
        let markets = self
            .markets
            .as_ref()
            .ok_or("--markets is required (or provide --input)")?;
        Ok(DealInputs {
            artist_id: self
                .artist_id
                .clone()
                .ok_or("--artist-id is required (or provide --input)")?,
            artist_name: None,
            weekly_audio_streams: self
                .weekly_audio
                .ok_or("--weekly-audio is required (or provide --input)")?,
            weekly_video_streams: self.weekly_video.unwrap_or(Decimal::ZERO),
            catalog_track_count: self
                .track_count
                .ok_or("--track-count is required (or provide --input)")?,
            extra_tracks: self.extra_tracks,
            genre: self
                .genre
                .clone()
                .ok_or("--genre is required (or provide --input)")?,
            deal_type: self
                .deal_type
                .ok_or("--deal-type is required (or provide --input)")?,
            deal_percent: self
                .deal_percent
                .ok_or("--deal-percent is required (or provide --input)")?,
            market_shares: parse_shares(markets)?,
            advance_share: self.advance_share.unwrap_or(dec!(0.70)),
            marketing_recoupable: self.marketing_recoupable,
            weeks_post_peak: self.weeks_post_peak,
            tracks: None,
        })
    }
}

/// Arguments for a full deal analysis
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Path to JSON deal inputs (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub tables: TableArgs,

    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(flatten)]
    pub deal: DealFlags,
}

/// Deal inputs from `--input`, piped stdin, or flags, in that order.
pub fn read_deal(
    path: Option<&str>,
    flags: &DealFlags,
) -> Result<DealInputs, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        input::file::read_json(path)
    } else if let Some(deal) = input::stdin::read_stdin()? {
        Ok(deal)
    } else {
        flags.to_inputs()
    }
}

pub fn run_analyze(args: AnalyzeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let inputs = read_deal(args.input.as_deref(), &args.deal)?;
    let tables = args.tables.load()?;
    let config = args.config.resolve()?;

    let result = analysis::analyze_deal(&inputs, &tables, &config)?;
    Ok(serde_json::to_value(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags() -> DealFlags {
        DealFlags {
            artist_id: Some("a-1".into()),
            weekly_audio: Some(dec!(250000)),
            weekly_video: None,
            track_count: Some(12),
            extra_tracks: 2,
            genre: Some("Pop".into()),
            deal_type: Some(DealType::Royalty),
            deal_percent: Some(dec!(0.5)),
            markets: Some(vec!["USA=1".into()]),
            advance_share: None,
            marketing_recoupable: false,
            weeks_post_peak: 0,
        }
    }

    #[test]
    fn test_flags_build_inputs() {
        let inputs = flags().to_inputs().unwrap();
        assert_eq!(inputs.artist_id, "a-1");
        assert_eq!(inputs.weekly_video_streams, Decimal::ZERO);
        assert_eq!(inputs.advance_share, dec!(0.70));
        assert_eq!(inputs.extra_tracks, 2);
        assert_eq!(inputs.market_shares["USA"], Decimal::ONE);
    }

    #[test]
    fn test_missing_flag_is_named() {
        let mut f = flags();
        f.genre = None;
        let err = f.to_inputs().unwrap_err();
        assert!(err.to_string().contains("--genre"));
    }
}
