pub mod analyze;
pub mod compare;
pub mod curve;
pub mod returns;
pub mod viability;

use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use catalog_pricer_core::tables::MarketData;
use catalog_pricer_core::{AnalyzerConfig, GenreFallback, RecommendationPolicy};

use crate::input;

/// Lookup tables every pricing command needs.
#[derive(Args)]
pub struct TableArgs {
    /// Decay anchor table (JSON, or CSV `genre,y1,...,yN`)
    #[arg(long)]
    pub decay_table: String,

    /// Per-stream payout table (JSON, or CSV `country,audio_rate,video_rate`)
    #[arg(long)]
    pub ppu_table: String,
}

impl TableArgs {
    pub fn load(&self) -> Result<MarketData, Box<dyn std::error::Error>> {
        input::tables::load_market_data(&self.decay_table, &self.ppu_table)
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PolicyArg {
    Minimum,
    Payback,
    Irr,
}

impl From<PolicyArg> for RecommendationPolicy {
    fn from(p: PolicyArg) -> Self {
        match p {
            PolicyArg::Minimum => RecommendationPolicy::Minimum,
            PolicyArg::Payback => RecommendationPolicy::Payback,
            PolicyArg::Irr => RecommendationPolicy::Irr,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FallbackArg {
    Reject,
    Average,
}

impl From<FallbackArg> for GenreFallback {
    fn from(f: FallbackArg) -> Self {
        match f {
            FallbackArg::Reject => GenreFallback::Reject,
            FallbackArg::Average => GenreFallback::Average,
        }
    }
}

/// Analyzer settings: a config file plus per-run overrides.
#[derive(Args)]
pub struct ConfigArgs {
    /// Analyzer config (JSON or YAML)
    #[arg(long)]
    pub config: Option<String>,

    /// Payback window in weeks
    #[arg(long)]
    pub horizon_weeks: Option<u32>,

    /// Primary target IRR (e.g. 0.15)
    #[arg(long)]
    pub target_irr: Option<Decimal>,

    /// Discount rate for label NPV
    #[arg(long)]
    pub discount_rate: Option<Decimal>,

    /// Projection length in years
    #[arg(long)]
    pub years: Option<u32>,

    /// Which solver result becomes the recommendation
    #[arg(long)]
    pub policy: Option<PolicyArg>,

    /// Behaviour for genres missing from the decay table
    #[arg(long)]
    pub genre_fallback: Option<FallbackArg>,
}

impl ConfigArgs {
    pub fn resolve(&self) -> Result<AnalyzerConfig, Box<dyn std::error::Error>> {
        let mut cfg = input::tables::load_config(self.config.as_deref())?;
        if let Some(weeks) = self.horizon_weeks {
            cfg.payback_horizon_weeks = weeks;
        }
        if let Some(target) = self.target_irr {
            cfg.primary_target_irr = target;
        }
        if let Some(rate) = self.discount_rate {
            cfg.discount_rate = rate;
        }
        if let Some(years) = self.years {
            cfg.projection_years = years;
        }
        if let Some(policy) = self.policy {
            cfg.recommendation = policy.into();
        }
        if let Some(fallback) = self.genre_fallback {
            cfg.genre_fallback = fallback.into();
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

/// Parse `USA=0.6,UK=0.4` style pairs.
pub fn parse_shares(pairs: &[String]) -> Result<BTreeMap<String, Decimal>, Box<dyn std::error::Error>> {
    let mut shares = BTreeMap::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| format!("Expected KEY=VALUE, got '{pair}'"))?;
        let value: Decimal = value
            .trim()
            .parse()
            .map_err(|e| format!("Invalid share in '{pair}': {e}"))?;
        shares.insert(key.trim().to_string(), value);
    }
    Ok(shares)
}
