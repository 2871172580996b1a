use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use super::analyzer::{prepare_deal, price_deal, sensitivity, DealInputs, NpvPoint};
use crate::config::AnalyzerConfig;
use crate::error::PricingError;
use crate::recoupment::{DealTerms, DealType};
use crate::tables::MarketData;
use crate::types::*;
use crate::PricingResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonInput {
    pub deal: DealInputs,
    /// Label share per deal type; types left out use `deal.deal_percent`
    #[serde(default)]
    pub label_shares: BTreeMap<String, Rate>,
}

/// One deal type priced on the shared revenue projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealTypeQuote {
    pub deal_type: DealType,
    pub deal_percent: Rate,
    pub payback_investment: Money,
    /// Investment at the primary IRR target
    pub irr_investment: Money,
    pub recommended_investment: Money,
    pub label_npv: Money,
    pub label_irr: Option<Rate>,
    pub label_moic: Option<Multiple>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealTypeComparison {
    pub quotes: Vec<DealTypeQuote>,
    /// Deal types by IRR-target investment, highest first
    pub ranking: Vec<DealType>,
}

/// Price the same revenue under royalty, distribution and profit split.
pub fn compare_deal_types(
    input: &ComparisonInput,
    tables: &MarketData,
    config: &AnalyzerConfig,
) -> PricingResult<ComputationOutput<DealTypeComparison>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let mut shares: BTreeMap<DealType, Rate> = BTreeMap::new();
    for (name, share) in &input.label_shares {
        shares.insert(name.parse()?, *share);
    }

    let deal = prepare_deal(&input.deal, tables, config, &mut warnings)?;
    let split = input.deal.split()?;

    let mut quotes = Vec::with_capacity(DealType::ALL.len());
    for deal_type in DealType::ALL {
        let deal_percent = shares.get(&deal_type).copied().unwrap_or(input.deal.deal_percent);
        let terms = DealTerms::new(deal_type, deal_percent)?;
        let priced = price_deal(&deal, terms, split, config, &mut warnings)?;
        let irr_investment = priced
            .recommendation
            .irr
            .iter()
            .find(|r| r.target_irr == config.primary_target_irr)
            .map(|r| r.max_investment)
            .unwrap_or(priced.recommendation.recommended_investment);
        quotes.push(DealTypeQuote {
            deal_type,
            deal_percent,
            payback_investment: priced.recommendation.payback.max_investment,
            irr_investment,
            recommended_investment: priced.recommendation.recommended_investment,
            label_npv: priced.metrics.npv,
            label_irr: priced.metrics.irr,
            label_moic: priced.metrics.moic,
        });
    }

    let mut ranked: Vec<&DealTypeQuote> = quotes.iter().collect();
    ranked.sort_by(|a, b| b.irr_investment.cmp(&a.irr_investment));
    let ranking = ranked.iter().map(|q| q.deal_type).collect();

    let assumptions = serde_json::json!({
        "primary_target_irr": config.primary_target_irr.to_string(),
        "payback_horizon_weeks": config.payback_horizon_weeks,
        "advance_share": input.deal.advance_share.to_string(),
        "marketing_recoupable": input.deal.marketing_recoupable,
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Deal-type comparison on a shared revenue projection",
        &assumptions,
        warnings,
        elapsed,
        DealTypeComparison { quotes, ranking },
    ))
}

/// Label NPV of `cash_flows` (t0 first) at each discount rate.
pub fn npv_sensitivity(
    cash_flows: &[Money],
    rates: &[Rate],
) -> PricingResult<ComputationOutput<Vec<NpvPoint>>> {
    let start = Instant::now();
    if rates.is_empty() {
        return Err(PricingError::invalid(
            "rates",
            "At least one discount rate is required",
        ));
    }
    if cash_flows.is_empty() {
        return Err(PricingError::InsufficientData(
            "NPV sensitivity needs at least one cash flow".into(),
        ));
    }
    let points = sensitivity(cash_flows, rates)?;
    let assumptions = serde_json::json!({ "periods": cash_flows.len() });
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "NPV across discount rates",
        &assumptions,
        Vec::new(),
        elapsed,
        points,
    ))
}
