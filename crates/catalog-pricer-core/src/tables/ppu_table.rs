use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::PricingError;
use crate::types::Rate;
use crate::PricingResult;

/// Common country spellings mapped to the workbook's upper-case names.
const COUNTRY_ALIASES: &[(&str, &str)] = &[
    ("united states", "USA"),
    ("us", "USA"),
    ("america", "USA"),
    ("united kingdom", "UK"),
    ("great britain", "UK"),
    ("britain", "UK"),
    ("england", "UK"),
    ("south korea", "KOREA"),
    ("republic of korea", "KOREA"),
    ("hong kong sar", "HONG KONG"),
    ("uae", "UNITED ARAB EMIRATES"),
    ("holland", "NETHERLANDS"),
    ("russia", "RUSSIAN FEDERATION"),
    ("czech", "CZECH REPUBLIC"),
    ("czechia", "CZECH REPUBLIC"),
];

/// Per-stream payout for one country.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CountryRate {
    pub audio_rate: Rate,
    pub video_rate: Rate,
}

/// Country → per-stream audio and video rates. Keys are stored upper-case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, CountryRate>",
    into = "BTreeMap<String, CountryRate>"
)]
pub struct PpuRateTable {
    rates: BTreeMap<String, CountryRate>,
}

impl PpuRateTable {
    pub fn new(rates: BTreeMap<String, CountryRate>) -> PricingResult<Self> {
        if rates.is_empty() {
            return Err(PricingError::InsufficientData(
                "PPU table must contain at least one country".into(),
            ));
        }
        let mut normalized = BTreeMap::new();
        for (country, rate) in rates {
            if rate.audio_rate.is_sign_negative() || rate.video_rate.is_sign_negative() {
                return Err(PricingError::invalid(
                    format!("ppu_rates.{country}"),
                    "Per-stream rates cannot be negative",
                ));
            }
            normalized.insert(country.trim().to_uppercase(), rate);
        }
        Ok(Self { rates: normalized })
    }

    pub fn countries(&self) -> impl Iterator<Item = &str> {
        self.rates.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Rates for `country`, matched case-insensitively or through an alias.
    pub fn rate(&self, country: &str) -> PricingResult<&CountryRate> {
        let upper = country.trim().to_uppercase();
        if let Some(rate) = self.rates.get(&upper) {
            return Ok(rate);
        }
        let lower = country.trim().to_lowercase();
        COUNTRY_ALIASES
            .iter()
            .find(|(alias, _)| *alias == lower)
            .and_then(|(_, canonical)| self.rates.get(*canonical))
            .ok_or_else(|| PricingError::UnknownCountry(country.to_string()))
    }
}

impl TryFrom<BTreeMap<String, CountryRate>> for PpuRateTable {
    type Error = PricingError;

    fn try_from(rates: BTreeMap<String, CountryRate>) -> Result<Self, Self::Error> {
        PpuRateTable::new(rates)
    }
}

impl From<PpuRateTable> for BTreeMap<String, CountryRate> {
    fn from(table: PpuRateTable) -> Self {
        table.rates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn table() -> PpuRateTable {
        let mut rates = BTreeMap::new();
        rates.insert(
            "usa".to_string(),
            CountryRate {
                audio_rate: dec!(0.004),
                video_rate: dec!(0.001),
            },
        );
        rates.insert(
            "UK".to_string(),
            CountryRate {
                audio_rate: dec!(0.003),
                video_rate: dec!(0.0008),
            },
        );
        PpuRateTable::new(rates).unwrap()
    }

    #[test]
    fn test_keys_are_upper_cased() {
        let t = table();
        assert_eq!(t.countries().collect::<Vec<_>>(), vec!["UK", "USA"]);
        assert_eq!(t.rate("usa").unwrap().audio_rate, dec!(0.004));
    }

    #[test]
    fn test_alias_lookup() {
        let t = table();
        assert_eq!(t.rate("United States").unwrap().audio_rate, dec!(0.004));
        assert_eq!(t.rate("england").unwrap().audio_rate, dec!(0.003));
    }

    #[test]
    fn test_unknown_country() {
        let err = table().rate("Atlantis").unwrap_err();
        assert!(matches!(err, PricingError::UnknownCountry(_)));
    }

    #[test]
    fn test_negative_rate_rejected() {
        let mut rates = BTreeMap::new();
        rates.insert(
            "USA".to_string(),
            CountryRate {
                audio_rate: dec!(-0.1),
                video_rate: dec!(0),
            },
        );
        assert!(PpuRateTable::new(rates).is_err());
    }
}
