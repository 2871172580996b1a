//! Check a deal the user has already sized: given an advance and a marketing
//! budget, report what the label and the artist each get out of it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::analyzer::{compute_label_metrics, prepare_deal, sensitivity, DealInputs, LabelMetrics, NpvPoint, SENSITIVITY_RATES};
use crate::config::AnalyzerConfig;
use crate::error::PricingError;
use crate::recoupment::{CashFlowEngine, CashFlowPeriod, Investment};
use crate::revenue::YearOneRevenue;
use crate::tables::MarketData;
use crate::time_value;
use crate::types::*;
use crate::PricingResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViabilityInput {
    pub deal: DealInputs,
    pub advance: Money,
    pub marketing: Money,
}

/// Artist side of the deal: advance at t0 plus royalties after recoupment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistMetrics {
    pub advance: Money,
    /// Undiscounted post-recoupment cash
    pub total_royalties: Money,
    pub royalties_npv: Money,
    pub npv_including_advance: Money,
    pub total_including_advance: Money,
    /// First year with positive cumulative royalties
    pub breakeven_year: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViabilityResult {
    pub total_investment: Money,
    pub advance: Money,
    pub marketing: Money,
    pub year_one: YearOneRevenue,
    pub label_metrics: LabelMetrics,
    pub artist_metrics: ArtistMetrics,
    /// Recoups inside the payback window
    pub meets_payback: bool,
    /// Label IRR at or above the primary target
    pub meets_target_irr: bool,
    pub cash_flows: Vec<CashFlowPeriod>,
    pub npv_sensitivity: Vec<NpvPoint>,
}

/// Evaluate a user-sized deal. The given advance and marketing replace
/// `deal.advance_share`.
pub fn evaluate_viability(
    input: &ViabilityInput,
    tables: &MarketData,
    config: &AnalyzerConfig,
) -> PricingResult<ComputationOutput<ViabilityResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.advance.is_sign_negative() && !input.advance.is_zero() {
        return Err(PricingError::invalid("advance", "Advance cannot be negative"));
    }
    if input.marketing.is_sign_negative() && !input.marketing.is_zero() {
        return Err(PricingError::invalid("marketing", "Marketing cannot be negative"));
    }
    let total = input.advance + input.marketing;
    if total.is_zero() {
        return Err(PricingError::invalid(
            "advance",
            "Advance plus marketing must be positive",
        ));
    }

    let deal = prepare_deal(&input.deal, tables, config, &mut warnings)?;
    let terms = input.deal.terms()?;
    let investment = Investment::new(input.advance, input.marketing, input.deal.marketing_recoupable)?;

    let weekly = CashFlowEngine::new(&deal.weekly_gross, terms)?;
    let annual = CashFlowEngine::new(&deal.annual_gross, terms)?;
    let recoup_week = weekly.recoup_period(&investment);
    let run = annual.run(&investment)?;
    let label_metrics = compute_label_metrics(&run, config.discount_rate, recoup_week)?;

    let royalties = run.artist_cash();
    let royalties_npv = time_value::pv_of_inflows(config.discount_rate, &royalties)?;
    let mut cumulative = Decimal::ZERO;
    let breakeven_year = royalties.iter().enumerate().find_map(|(i, cash)| {
        cumulative += cash;
        (cumulative > Decimal::ZERO).then_some((i + 1) as u32)
    });
    let total_royalties = run.totals.artist_cash;
    let artist_metrics = ArtistMetrics {
        advance: input.advance,
        total_royalties,
        royalties_npv,
        npv_including_advance: input.advance + royalties_npv,
        total_including_advance: input.advance + total_royalties,
        breakeven_year,
    };

    let meets_payback = matches!(recoup_week, Some(w) if w <= config.payback_horizon_weeks);
    let meets_target_irr = label_metrics
        .irr
        .is_some_and(|irr| irr >= config.primary_target_irr);
    if !meets_payback {
        warnings.push(format!(
            "Deal does not recoup within {} weeks",
            config.payback_horizon_weeks
        ));
    }

    let npv_sensitivity = sensitivity(&run.label_cash_flows(), &SENSITIVITY_RATES)?;
    let result = ViabilityResult {
        total_investment: total,
        advance: input.advance,
        marketing: input.marketing,
        year_one: deal.projection.year_one(),
        label_metrics,
        artist_metrics,
        meets_payback,
        meets_target_irr,
        cash_flows: run.periods,
        npv_sensitivity,
    };

    let assumptions = serde_json::json!({
        "discount_rate": config.discount_rate.to_string(),
        "payback_horizon_weeks": config.payback_horizon_weeks,
        "primary_target_irr": config.primary_target_irr.to_string(),
        "marketing_recoupable": input.deal.marketing_recoupable,
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Deal viability: label returns and artist value at a fixed advance and marketing budget",
        &assumptions,
        warnings,
        elapsed,
        result,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recoupment::DealType;
    use crate::tables::{CountryRate, DecayAnchorTable, PpuRateTable};
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    fn tables() -> MarketData {
        let mut curves = BTreeMap::new();
        curves.insert("Rock".to_string(), vec![dec!(1.0), dec!(0.8), dec!(0.6)]);
        let mut rates = BTreeMap::new();
        rates.insert(
            "UK".to_string(),
            CountryRate {
                audio_rate: dec!(0.005),
                video_rate: dec!(0),
            },
        );
        MarketData::new(
            DecayAnchorTable::new(curves).unwrap(),
            PpuRateTable::new(rates).unwrap(),
        )
    }

    fn input(advance: Money, marketing: Money) -> ViabilityInput {
        let mut shares = BTreeMap::new();
        shares.insert("uk".to_string(), dec!(1));
        ViabilityInput {
            deal: DealInputs {
                artist_id: "a".into(),
                artist_name: Some("Artist".into()),
                weekly_audio_streams: dec!(200000),
                weekly_video_streams: Decimal::ZERO,
                catalog_track_count: 12,
                extra_tracks: 0,
                genre: "rock".into(),
                deal_type: DealType::Distribution,
                deal_percent: dec!(0.25),
                market_shares: shares,
                advance_share: dec!(0.7),
                marketing_recoupable: false,
                weeks_post_peak: 0,
                tracks: None,
            },
            advance,
            marketing,
        }
    }

    fn config() -> AnalyzerConfig {
        AnalyzerConfig {
            projection_years: 3,
            ..AnalyzerConfig::default()
        }
    }

    #[test]
    fn test_small_deal_is_viable() {
        // 1000/week at peak; a 10k advance recoups in 10 weeks
        let out = evaluate_viability(&input(dec!(10000), dec!(5000)), &tables(), &config()).unwrap();
        let r = &out.result;
        assert_eq!(r.total_investment, dec!(15000));
        assert_eq!(r.label_metrics.recoup_week, Some(10));
        assert!(r.meets_payback);
        assert!(r.meets_target_irr);
        assert_eq!(r.artist_metrics.breakeven_year, Some(1));
        assert_eq!(
            r.artist_metrics.total_including_advance,
            dec!(10000) + r.artist_metrics.total_royalties
        );
    }

    #[test]
    fn test_oversized_deal_warns() {
        let out =
            evaluate_viability(&input(dec!(5000000), dec!(0)), &tables(), &config()).unwrap();
        assert!(!out.result.meets_payback);
        assert!(!out.result.meets_target_irr);
        assert_eq!(out.result.artist_metrics.breakeven_year, None);
        assert!(!out.warnings.is_empty());
    }

    #[test]
    fn test_rejects_empty_deal() {
        assert!(evaluate_viability(&input(dec!(0), dec!(0)), &tables(), &config()).is_err());
        assert!(evaluate_viability(&input(dec!(-1), dec!(5)), &tables(), &config()).is_err());
    }
}
