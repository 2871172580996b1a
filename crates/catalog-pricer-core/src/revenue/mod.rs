pub mod model;
pub mod tracks;

pub use model::{BlendedRates, MarketRate, RevenueModel, RevenueProjection, YearOneRevenue};
pub use tracks::{project_tracks, TrackInput, TrackLevelProjection};
