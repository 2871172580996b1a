use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::PricingError;
use crate::tables::PpuRateTable;
use crate::types::{aggregate_blocks, Money, Multiple, Rate, WEEKS_PER_YEAR};
use crate::PricingResult;

/// Market shares may miss 1.0 by this much (rounding in user input).
const SHARE_SUM_TOLERANCE: Decimal = dec!(0.001);

// ---------------------------------------------------------------------------
// Blended rates
// ---------------------------------------------------------------------------

/// One country's contribution to the blended rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketRate {
    pub country: String,
    pub share: Rate,
    pub audio_rate: Rate,
    pub video_rate: Rate,
}

/// Share-weighted per-stream rates across the artist's markets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlendedRates {
    pub audio: Rate,
    pub video: Rate,
    pub breakdown: Vec<MarketRate>,
}

impl BlendedRates {
    /// Blend `Σ share × rate` for audio and video independently.
    ///
    /// Shares must be non-negative and sum to 1 (within 0.001). Every country
    /// must be present in the PPU table.
    pub fn from_shares(ppu: &PpuRateTable, shares: &BTreeMap<String, Rate>) -> PricingResult<Self> {
        if shares.is_empty() {
            return Err(PricingError::invalid(
                "market_shares",
                "At least one market share is required",
            ));
        }

        let mut total_share = Decimal::ZERO;
        let mut audio = Decimal::ZERO;
        let mut video = Decimal::ZERO;
        let mut breakdown = Vec::with_capacity(shares.len());

        for (country, share) in shares {
            if share.is_sign_negative() {
                return Err(PricingError::invalid(
                    format!("market_shares.{country}"),
                    "Market share cannot be negative",
                ));
            }
            let rate = ppu.rate(country)?;
            total_share += share;
            audio += share * rate.audio_rate;
            video += share * rate.video_rate;
            breakdown.push(MarketRate {
                country: country.clone(),
                share: *share,
                audio_rate: rate.audio_rate,
                video_rate: rate.video_rate,
            });
        }

        if (total_share - Decimal::ONE).abs() > SHARE_SUM_TOLERANCE {
            return Err(PricingError::invalid(
                "market_shares",
                format!("Market shares sum to {total_share}, expected 1"),
            ));
        }

        Ok(Self {
            audio,
            video,
            breakdown,
        })
    }
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// First projected year's gross revenue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearOneRevenue {
    pub audio: Money,
    pub video: Money,
    pub total: Money,
}

/// Weekly gross revenue split by audio and video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueProjection {
    weekly_audio: Vec<Money>,
    weekly_video: Vec<Money>,
    /// Year-1 figures computed upstream; reported as-is when present.
    year_one_override: Option<YearOneRevenue>,
}

impl RevenueProjection {
    pub fn new(weekly_audio: Vec<Money>, weekly_video: Vec<Money>) -> PricingResult<Self> {
        if weekly_audio.len() != weekly_video.len() {
            return Err(PricingError::invalid(
                "weekly_video",
                format!(
                    "Audio and video series differ in length ({} vs {})",
                    weekly_audio.len(),
                    weekly_video.len()
                ),
            ));
        }
        Ok(Self {
            weekly_audio,
            weekly_video,
            year_one_override: None,
        })
    }

    /// Projection from a single gross series, booked as audio.
    pub fn from_gross(weekly_gross: Vec<Money>) -> Self {
        let weekly_video = vec![Decimal::ZERO; weekly_gross.len()];
        Self {
            weekly_audio: weekly_gross,
            weekly_video,
            year_one_override: None,
        }
    }

    /// Empty projection of `weeks` zero weeks.
    pub fn zeros(weeks: usize) -> Self {
        Self::from_gross(vec![Decimal::ZERO; weeks])
    }

    pub fn with_year_one_override(mut self, year_one: YearOneRevenue) -> Self {
        self.year_one_override = Some(year_one);
        self
    }

    pub fn year_one_override(&self) -> Option<&YearOneRevenue> {
        self.year_one_override.as_ref()
    }

    pub fn weeks(&self) -> usize {
        self.weekly_audio.len()
    }

    pub fn weekly_audio(&self) -> &[Money] {
        &self.weekly_audio
    }

    pub fn weekly_video(&self) -> &[Money] {
        &self.weekly_video
    }

    pub fn weekly_gross(&self) -> Vec<Money> {
        self.weekly_audio
            .iter()
            .zip(&self.weekly_video)
            .map(|(a, v)| a + v)
            .collect()
    }

    pub fn annual_audio(&self) -> Vec<Money> {
        aggregate_blocks(&self.weekly_audio, WEEKS_PER_YEAR)
    }

    pub fn annual_video(&self) -> Vec<Money> {
        aggregate_blocks(&self.weekly_video, WEEKS_PER_YEAR)
    }

    pub fn annual_totals(&self) -> Vec<Money> {
        aggregate_blocks(&self.weekly_gross(), WEEKS_PER_YEAR)
    }

    /// Year-1 revenue: the override when present, otherwise the sum of the
    /// first 52 projected weeks.
    pub fn year_one(&self) -> YearOneRevenue {
        if let Some(year_one) = self.year_one_override {
            return year_one;
        }
        let weeks = WEEKS_PER_YEAR.min(self.weeks());
        let audio: Money = self.weekly_audio[..weeks].iter().copied().sum();
        let video: Money = self.weekly_video[..weeks].iter().copied().sum();
        YearOneRevenue {
            audio,
            video,
            total: audio + video,
        }
    }

    /// Add `other` week by week. Both projections must cover the same weeks.
    /// Any year-1 override is dropped.
    pub fn combine(&mut self, other: &RevenueProjection) -> PricingResult<()> {
        if other.weeks() != self.weeks() {
            return Err(PricingError::invalid(
                "projection",
                format!(
                    "Cannot combine projections of {} and {} weeks",
                    self.weeks(),
                    other.weeks()
                ),
            ));
        }
        for (a, b) in self.weekly_audio.iter_mut().zip(&other.weekly_audio) {
            *a += b;
        }
        for (v, b) in self.weekly_video.iter_mut().zip(&other.weekly_video) {
            *v += b;
        }
        self.year_one_override = None;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Revenue model
// ---------------------------------------------------------------------------

/// Streams to gross revenue at blended rates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueModel {
    rates: BlendedRates,
}

impl RevenueModel {
    pub fn new(rates: BlendedRates) -> Self {
        Self { rates }
    }

    pub fn from_shares(ppu: &PpuRateTable, shares: &BTreeMap<String, Rate>) -> PricingResult<Self> {
        Ok(Self::new(BlendedRates::from_shares(ppu, shares)?))
    }

    pub fn rates(&self) -> &BlendedRates {
        &self.rates
    }

    /// Gross revenue for one week at the given stream counts.
    pub fn weekly_gross(&self, audio_streams: Decimal, video_streams: Decimal) -> Money {
        audio_streams * self.rates.audio + video_streams * self.rates.video
    }

    /// Weekly revenue for current streams scaled by `multipliers`
    /// (week 0 = the level the stream counts were measured at).
    pub fn project(
        &self,
        audio_streams: Decimal,
        video_streams: Decimal,
        multipliers: &[Multiple],
    ) -> RevenueProjection {
        let audio_base = audio_streams * self.rates.audio;
        let video_base = video_streams * self.rates.video;
        RevenueProjection {
            weekly_audio: multipliers.iter().map(|m| audio_base * m).collect(),
            weekly_video: multipliers.iter().map(|m| video_base * m).collect(),
            year_one_override: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::CountryRate;

    fn ppu() -> PpuRateTable {
        let mut rates = BTreeMap::new();
        rates.insert(
            "USA".to_string(),
            CountryRate {
                audio_rate: dec!(0.004),
                video_rate: dec!(0.001),
            },
        );
        rates.insert(
            "UK".to_string(),
            CountryRate {
                audio_rate: dec!(0.002),
                video_rate: dec!(0.0005),
            },
        );
        PpuRateTable::new(rates).unwrap()
    }

    fn shares(us: Rate, uk: Rate) -> BTreeMap<String, Rate> {
        let mut s = BTreeMap::new();
        s.insert("USA".to_string(), us);
        s.insert("UK".to_string(), uk);
        s
    }

    #[test]
    fn test_blended_rate_is_share_weighted() {
        let rates = BlendedRates::from_shares(&ppu(), &shares(dec!(0.75), dec!(0.25))).unwrap();
        assert_eq!(rates.audio, dec!(0.0035));
        assert_eq!(rates.video, dec!(0.000875));
        assert_eq!(rates.breakdown.len(), 2);
    }

    #[test]
    fn test_shares_must_sum_to_one() {
        let err = BlendedRates::from_shares(&ppu(), &shares(dec!(0.5), dec!(0.25))).unwrap_err();
        assert!(matches!(err, PricingError::InvalidInput { .. }));
        // inside the rounding allowance
        assert!(BlendedRates::from_shares(&ppu(), &shares(dec!(0.7), dec!(0.3005))).is_ok());
    }

    #[test]
    fn test_unknown_country_in_shares() {
        let mut s = shares(dec!(0.5), dec!(0.25));
        s.insert("Atlantis".to_string(), dec!(0.25));
        let err = BlendedRates::from_shares(&ppu(), &s).unwrap_err();
        assert!(matches!(err, PricingError::UnknownCountry(_)));
    }

    #[test]
    fn test_project_scales_by_multipliers() {
        let model = RevenueModel::from_shares(&ppu(), &shares(dec!(1), dec!(0))).unwrap();
        let projection = model.project(dec!(1000), dec!(2000), &[dec!(1), dec!(0.5)]);
        assert_eq!(projection.weekly_audio(), &[dec!(4), dec!(2)]);
        assert_eq!(projection.weekly_video(), &[dec!(2), dec!(1)]);
        assert_eq!(projection.weekly_gross(), vec![dec!(6), dec!(3)]);
    }

    #[test]
    fn test_year_one_sums_first_52_weeks() {
        let mut weekly = vec![dec!(10); 52];
        weekly.extend(vec![dec!(5); 52]);
        let projection = RevenueProjection::from_gross(weekly);
        assert_eq!(projection.year_one().total, dec!(520));
        assert_eq!(projection.annual_totals(), vec![dec!(520), dec!(260)]);
    }

    #[test]
    fn test_year_one_override_wins() {
        let projection = RevenueProjection::from_gross(vec![dec!(10); 104]).with_year_one_override(
            YearOneRevenue {
                audio: dec!(400),
                video: dec!(100),
                total: dec!(500),
            },
        );
        assert_eq!(projection.year_one().total, dec!(500));
    }

    #[test]
    fn test_combine_adds_weekly() {
        let mut a = RevenueProjection::from_gross(vec![dec!(1); 3]);
        let b = RevenueProjection::from_gross(vec![dec!(2); 3]);
        a.combine(&b).unwrap();
        assert_eq!(a.weekly_gross(), vec![dec!(3); 3]);
        assert!(a.combine(&RevenueProjection::zeros(2)).is_err());
    }
}
