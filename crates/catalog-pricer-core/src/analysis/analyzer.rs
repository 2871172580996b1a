use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, warn};

use crate::config::{AnalyzerConfig, RecommendationPolicy};
use crate::decay::{ShiftedDecayCurve, WeeklyDecayCurve};
use crate::error::PricingError;
use crate::recoupment::{CashFlowEngine, CashFlowPeriod, CashFlowRun, DealTerms, DealType, InvestmentSplit};
use crate::revenue::{project_tracks, BlendedRates, RevenueModel, RevenueProjection, TrackInput, YearOneRevenue};
use crate::solvers::{realized_irr, solve_irr, solve_payback, SolverOutcome};
use crate::tables::MarketData;
use crate::time_value;
use crate::types::*;
use crate::PricingResult;

/// Discount rates reported in the NPV sensitivity of every analysis.
pub(crate) const SENSITIVITY_RATES: [Rate; 6] = [
    dec!(0.05),
    dec!(0.075),
    dec!(0.10),
    dec!(0.125),
    dec!(0.15),
    dec!(0.20),
];

fn default_advance_share() -> Rate {
    dec!(0.70)
}

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Everything needed to price one artist deal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealInputs {
    pub artist_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist_name: Option<String>,
    /// Current weekly audio streams across the catalog
    pub weekly_audio_streams: Decimal,
    /// Current weekly video streams across the catalog
    #[serde(default)]
    pub weekly_video_streams: Decimal,
    pub catalog_track_count: u32,
    /// New songs owed under the deal, modelled from peak
    #[serde(default)]
    pub extra_tracks: u32,
    pub genre: String,
    pub deal_type: DealType,
    /// Label's nominal share (0-1)
    pub deal_percent: Rate,
    /// Country → fraction of streams; must sum to 1
    pub market_shares: BTreeMap<String, Rate>,
    /// Fraction of the investment paid as artist advance
    #[serde(default = "default_advance_share")]
    pub advance_share: Rate,
    #[serde(default)]
    pub marketing_recoupable: bool,
    /// Aggregate mode: weeks the catalog already sits past its peak
    #[serde(default)]
    pub weeks_post_peak: i64,
    /// Per-track data; when present the projection is built track by track
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracks: Option<Vec<TrackInput>>,
}

impl DealInputs {
    pub fn validate(&self) -> PricingResult<()> {
        if self.artist_id.trim().is_empty() {
            return Err(PricingError::invalid("artist_id", "Artist id is required"));
        }
        if self.weekly_audio_streams.is_sign_negative() && !self.weekly_audio_streams.is_zero() {
            return Err(PricingError::invalid(
                "weekly_audio_streams",
                "Stream counts cannot be negative",
            ));
        }
        if self.weekly_video_streams.is_sign_negative() && !self.weekly_video_streams.is_zero() {
            return Err(PricingError::invalid(
                "weekly_video_streams",
                "Stream counts cannot be negative",
            ));
        }
        if !self.track_level()
            && self.weekly_audio_streams.is_zero()
            && self.weekly_video_streams.is_zero()
        {
            return Err(PricingError::invalid(
                "weekly_audio_streams",
                "At least one of audio or video streams must be positive",
            ));
        }
        if self.catalog_track_count == 0 {
            return Err(PricingError::invalid(
                "catalog_track_count",
                "Catalog must contain at least one track",
            ));
        }
        if self.weeks_post_peak < 0 {
            return Err(PricingError::invalid(
                "weeks_post_peak",
                "Weeks post peak cannot be negative",
            ));
        }
        DealTerms::new(self.deal_type, self.deal_percent)?;
        InvestmentSplit::new(self.advance_share, self.marketing_recoupable)?;
        Ok(())
    }

    /// Track-level mode applies when per-track data is supplied.
    pub fn track_level(&self) -> bool {
        self.tracks.as_ref().is_some_and(|t| !t.is_empty())
    }

    pub fn terms(&self) -> PricingResult<DealTerms> {
        DealTerms::new(self.deal_type, self.deal_percent)
    }

    pub fn split(&self) -> PricingResult<InvestmentSplit> {
        InvestmentSplit::new(self.advance_share, self.marketing_recoupable)
    }
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecayMode {
    Aggregate,
    TrackLevel,
}

/// Largest investment recouped within the payback window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaybackRecommendation {
    pub horizon_weeks: u32,
    pub max_investment: Money,
    pub suggested_advance: Money,
    pub suggested_marketing: Money,
    /// Annual label IRR at this investment
    pub implied_irr: Option<Rate>,
    pub recoup_week: Option<u32>,
    pub iterations: u32,
    pub converged: bool,
}

/// Largest investment meeting one IRR target; payback is not constrained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrRecommendation {
    pub target_irr: Rate,
    pub max_investment: Money,
    pub suggested_advance: Money,
    pub suggested_marketing: Money,
    /// Informational: week the balance clears at this investment
    pub recoup_week: Option<u32>,
    /// Label NPV at the configured discount rate
    pub npv: Money,
    pub iterations: u32,
    pub converged: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingRecommendation {
    pub payback: PaybackRecommendation,
    pub irr: Vec<IrrRecommendation>,
    pub policy: RecommendationPolicy,
    pub recommended_investment: Money,
    pub recommended_advance: Money,
    pub recommended_marketing: Money,
}

/// Label returns on the final cash flows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelMetrics {
    pub investment: Money,
    pub discount_rate: Rate,
    pub npv: Money,
    pub irr: Option<Rate>,
    pub moic: Option<Multiple>,
    /// Years until cumulative label cash covers the investment
    pub payback_period: Option<u32>,
    pub total_label_cash: Money,
    pub recoup_week: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpvPoint {
    pub discount_rate: Rate,
    pub npv: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealAnalysisResult {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub inputs: DealInputs,
    /// Decay table key actually used ("average" under fallback)
    pub genre_used: String,
    pub decay_mode: DecayMode,
    pub effective_weekly_audio: Decimal,
    pub effective_weekly_video: Decimal,
    pub year_one: YearOneRevenue,
    pub blended_rates: BlendedRates,
    pub recommendation: PricingRecommendation,
    /// Annual cash flows at the recommended investment
    pub cash_flows: Vec<CashFlowPeriod>,
    pub label_metrics: LabelMetrics,
    pub npv_sensitivity: Vec<NpvPoint>,
}

// ---------------------------------------------------------------------------
// Shared preparation
// ---------------------------------------------------------------------------

/// Revenue side of a deal, independent of the investment.
#[derive(Debug, Clone)]
pub(crate) struct PreparedDeal {
    pub genre_used: String,
    pub decay_mode: DecayMode,
    pub rates: BlendedRates,
    pub projection: RevenueProjection,
    pub effective_weekly_audio: Decimal,
    pub effective_weekly_video: Decimal,
    pub weekly_gross: Vec<Money>,
    pub annual_gross: Vec<Money>,
}

/// Select the curve, blend rates and project weekly revenue.
pub(crate) fn prepare_deal(
    inputs: &DealInputs,
    tables: &MarketData,
    config: &AnalyzerConfig,
    warnings: &mut Vec<String>,
) -> PricingResult<PreparedDeal> {
    config.validate()?;
    inputs.validate()?;

    let resolved = tables.decay.resolve(&inputs.genre, config.genre_fallback)?;
    if resolved.fallback_used {
        warn!(genre = %inputs.genre, "unknown genre, using average decay curve");
        warnings.push(format!(
            "Genre '{}' not in decay table; using the average of all genres",
            inputs.genre
        ));
    }

    let years = config.projection_years as usize;
    let horizon = years * WEEKS_PER_YEAR;
    let curve = WeeklyDecayCurve::build(&resolved.anchors, years, config.curve_tolerance)?;
    if curve.held_years() > 0 {
        warnings.push(format!(
            "Decay anchors cover {} years; final anchor held for the last {}",
            years - curve.held_years(),
            curve.held_years()
        ));
    }
    let fidelity = curve.validate_against_anchors(config.curve_tolerance);
    if !fidelity.valid {
        warnings.push(format!(
            "Weekly curve deviates {} from anchor in year {}",
            fidelity.max_error,
            fidelity.worst_year.unwrap_or(0)
        ));
    }

    let model = RevenueModel::from_shares(&tables.ppu, &inputs.market_shares)?;

    let (decay_mode, projection, audio, video) = match inputs.tracks.as_deref() {
        Some(tracks) if !tracks.is_empty() => {
            let out = project_tracks(&model, &curve, tracks, inputs.extra_tracks, horizon)?;
            if out.tracks_on_tail > 0 {
                warnings.push(format!(
                    "{} track(s) project past the end of the decay curve; final multiplier held",
                    out.tracks_on_tail
                ));
            }
            (
                DecayMode::TrackLevel,
                out.projection,
                out.total_weekly_audio,
                out.total_weekly_video,
            )
        }
        _ => {
            let (projection, audio, video) =
                aggregate_projection(inputs, &model, &curve, horizon, warnings)?;
            (DecayMode::Aggregate, projection, audio, video)
        }
    };

    let weekly_gross = projection.weekly_gross();
    let annual_gross = projection.annual_totals();
    debug!(
        genre = %resolved.genre,
        mode = ?decay_mode,
        year_one = %projection.year_one().total,
        "revenue projected"
    );

    Ok(PreparedDeal {
        genre_used: resolved.genre,
        decay_mode,
        rates: model.rates().clone(),
        projection,
        effective_weekly_audio: audio,
        effective_weekly_video: video,
        weekly_gross,
        annual_gross,
    })
}

/// Whole-catalog projection from the current level at `weeks_post_peak`,
/// plus extra tracks at peak.
fn aggregate_projection(
    inputs: &DealInputs,
    model: &RevenueModel,
    curve: &WeeklyDecayCurve,
    horizon: usize,
    warnings: &mut Vec<String>,
) -> PricingResult<(RevenueProjection, Decimal, Decimal)> {
    let shifted = ShiftedDecayCurve::new(curve, inputs.weeks_post_peak, horizon)?;
    if shifted.held_weeks() > 0 {
        warnings.push(format!(
            "Catalog is {} weeks past peak; final multiplier held for the last {} weeks",
            inputs.weeks_post_peak,
            shifted.held_weeks()
        ));
    }
    if shifted.current_level().is_zero() {
        warnings.push("Decay curve is zero at the catalog's current age".into());
    }

    let mut projection = model.project(
        inputs.weekly_audio_streams,
        inputs.weekly_video_streams,
        &shifted.rebased(),
    );
    let mut audio = inputs.weekly_audio_streams;
    let mut video = inputs.weekly_video_streams;

    if inputs.extra_tracks > 0 {
        let per_track = Decimal::from(inputs.extra_tracks) / Decimal::from(inputs.catalog_track_count);
        let extra_audio = inputs.weekly_audio_streams * per_track;
        let extra_video = inputs.weekly_video_streams * per_track;
        let peak = ShiftedDecayCurve::new(curve, 0, horizon)?;
        projection.combine(&model.project(extra_audio, extra_video, &peak.rebased()))?;
        audio += extra_audio;
        video += extra_video;
    }

    Ok((projection, audio, video))
}

// ---------------------------------------------------------------------------
// Pricing
// ---------------------------------------------------------------------------

/// Solver results and the final run for one set of deal terms.
#[derive(Debug, Clone)]
pub(crate) struct PricedDeal {
    pub recommendation: PricingRecommendation,
    pub final_run: CashFlowRun,
    pub metrics: LabelMetrics,
}

pub(crate) fn price_deal(
    deal: &PreparedDeal,
    terms: DealTerms,
    split: InvestmentSplit,
    config: &AnalyzerConfig,
    warnings: &mut Vec<String>,
) -> PricingResult<PricedDeal> {
    let weekly = CashFlowEngine::new(&deal.weekly_gross, terms)?;
    let annual = CashFlowEngine::new(&deal.annual_gross, terms)?;

    let payback_outcome = solve_payback(
        &deal.weekly_gross,
        terms,
        split,
        config.payback_horizon_weeks,
        &config.solver,
    )?;
    note_convergence("payback", &payback_outcome, warnings);
    if split.recoupable_fraction().is_zero() {
        warnings.push(format!(
            "Nothing is recoupable (advance share 0, marketing not recoupable); payback \
             investment capped at the {}-week gross",
            config.payback_horizon_weeks
        ));
    }
    let payback_investment = split.investment(payback_outcome.investment);
    let payback_run = annual.run(&payback_investment)?;
    let payback = PaybackRecommendation {
        horizon_weeks: config.payback_horizon_weeks,
        max_investment: payback_outcome.investment,
        suggested_advance: payback_investment.advance,
        suggested_marketing: payback_investment.marketing(),
        implied_irr: realized_irr(&payback_run),
        recoup_week: weekly.recoup_period(&payback_investment),
        iterations: payback_outcome.iterations,
        converged: payback_outcome.converged,
    };

    let mut irr = Vec::new();
    for target in config.all_targets() {
        let outcome = solve_irr(&deal.annual_gross, terms, split, target, &config.solver)?;
        note_convergence(&format!("IRR {target}"), &outcome, warnings);
        let investment = split.investment(outcome.investment);
        let run = annual.run(&investment)?;
        irr.push(IrrRecommendation {
            target_irr: target,
            max_investment: outcome.investment,
            suggested_advance: investment.advance,
            suggested_marketing: investment.marketing(),
            recoup_week: weekly.recoup_period(&investment),
            npv: time_value::npv(config.discount_rate, &run.label_cash_flows())?,
            iterations: outcome.iterations,
            converged: outcome.converged,
        });
    }

    let primary = irr
        .iter()
        .find(|r| r.target_irr == config.primary_target_irr)
        .map(|r| r.max_investment)
        .ok_or_else(|| {
            PricingError::invalid("primary_target_irr", "Primary IRR target was not solved")
        })?;
    let recommended = match config.recommendation {
        RecommendationPolicy::Minimum => payback.max_investment.min(primary),
        RecommendationPolicy::Payback => payback.max_investment,
        RecommendationPolicy::Irr => primary,
    };
    let recommended_investment = split.investment(recommended);

    let final_run = annual.run(&recommended_investment)?;
    let metrics = compute_label_metrics(
        &final_run,
        config.discount_rate,
        weekly.recoup_period(&recommended_investment),
    )?;

    debug!(
        deal_type = %terms.deal_type,
        payback = %payback.max_investment,
        primary_irr = %primary,
        recommended = %recommended,
        "deal priced"
    );

    Ok(PricedDeal {
        recommendation: PricingRecommendation {
            payback,
            irr,
            policy: config.recommendation,
            recommended_investment: recommended,
            recommended_advance: recommended_investment.advance,
            recommended_marketing: recommended_investment.marketing(),
        },
        final_run,
        metrics,
    })
}

fn note_convergence(solver: &str, outcome: &SolverOutcome, warnings: &mut Vec<String>) {
    if !outcome.converged {
        warnings.push(format!(
            "{solver} solver stopped after {} iterations without converging; best estimate {}",
            outcome.iterations, outcome.investment
        ));
    }
}

/// NPV, IRR, MOIC and payback for the label on an annual run.
pub fn compute_label_metrics(
    run: &CashFlowRun,
    discount_rate: Rate,
    recoup_week: Option<u32>,
) -> PricingResult<LabelMetrics> {
    let flows = run.label_cash_flows();
    let invested = run.investment.total;
    let moic = if invested.is_zero() {
        None
    } else {
        Some(time_value::moic(run.totals.label_cash, invested)?)
    };

    Ok(LabelMetrics {
        investment: invested,
        discount_rate,
        npv: time_value::npv(discount_rate, &flows)?,
        irr: realized_irr(run),
        moic,
        payback_period: if invested.is_zero() {
            Some(0)
        } else {
            time_value::payback_period(&flows)
        },
        total_label_cash: run.totals.label_cash,
        recoup_week,
    })
}

pub(crate) fn sensitivity(flows: &[Money], rates: &[Rate]) -> PricingResult<Vec<NpvPoint>> {
    rates
        .iter()
        .map(|r| {
            Ok(NpvPoint {
                discount_rate: *r,
                npv: time_value::npv(*r, flows)?,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Facade
// ---------------------------------------------------------------------------

/// Price a deal: project revenue, solve the payback and IRR investments,
/// apply the recommendation policy and report label metrics at the chosen
/// investment.
pub fn analyze_deal(
    inputs: &DealInputs,
    tables: &MarketData,
    config: &AnalyzerConfig,
) -> PricingResult<ComputationOutput<DealAnalysisResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let deal = prepare_deal(inputs, tables, config, &mut warnings)?;
    let priced = price_deal(&deal, inputs.terms()?, inputs.split()?, config, &mut warnings)?;
    let npv_sensitivity = sensitivity(&priced.final_run.label_cash_flows(), &SENSITIVITY_RATES)?;

    let timestamp = Utc::now();
    let result = DealAnalysisResult {
        id: format!("{}-{}", inputs.artist_id, timestamp.timestamp_millis()),
        timestamp,
        inputs: inputs.clone(),
        genre_used: deal.genre_used,
        decay_mode: deal.decay_mode,
        effective_weekly_audio: deal.effective_weekly_audio,
        effective_weekly_video: deal.effective_weekly_video,
        year_one: deal.projection.year_one(),
        blended_rates: deal.rates,
        recommendation: priced.recommendation,
        cash_flows: priced.final_run.periods,
        label_metrics: priced.metrics,
        npv_sensitivity,
    };

    let assumptions = serde_json::json!({
        "payback_horizon_weeks": config.payback_horizon_weeks,
        "projection_years": config.projection_years,
        "target_irrs": config.all_targets().iter().map(|t| t.to_string()).collect::<Vec<_>>(),
        "primary_target_irr": config.primary_target_irr.to_string(),
        "discount_rate": config.discount_rate.to_string(),
        "recommendation": config.recommendation,
        "solver_tolerance": config.solver.tolerance.to_string(),
        "irr_epsilon": config.solver.irr_epsilon.to_string(),
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Weekly decay projection, deal-type recoupment, payback and IRR bisection",
        &assumptions,
        warnings,
        elapsed,
        result,
    ))
}
