pub mod analyzer;
#[cfg(feature = "comparison")]
pub mod comparison;
#[cfg(feature = "viability")]
pub mod viability;

pub use analyzer::{
    analyze_deal, compute_label_metrics, DealAnalysisResult, DealInputs, DecayMode,
    IrrRecommendation, LabelMetrics, NpvPoint, PaybackRecommendation, PricingRecommendation,
};
