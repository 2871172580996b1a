pub mod config;
pub mod decay;
pub mod error;
pub mod recoupment;
pub mod revenue;
pub mod solvers;
pub mod tables;
pub mod time_value;
pub mod types;

#[cfg(feature = "analysis")]
pub mod analysis;

pub use config::{AnalyzerConfig, GenreFallback, RecommendationPolicy, SolverConfig};
pub use error::PricingError;
pub use types::*;

#[cfg(feature = "analysis")]
pub use analysis::{analyze_deal, DealAnalysisResult, DealInputs};

/// Standard result type for all pricing computations
pub type PricingResult<T> = Result<T, PricingError>;
