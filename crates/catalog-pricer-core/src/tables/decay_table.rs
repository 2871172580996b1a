use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::GenreFallback;
use crate::decay::validate_anchors;
use crate::error::PricingError;
use crate::types::Multiple;
use crate::PricingResult;

/// Loose genre spellings mapped to the canonical column names used by the
/// decay workbook.
const GENRE_ALIASES: &[(&str, &str)] = &[
    ("dance", "Dance, Electronic, Electronica"),
    ("electronic", "Dance, Electronic, Electronica"),
    ("electronica", "Dance, Electronic, Electronica"),
    ("edm", "Dance, Electronic, Electronica"),
    ("jpop", "J-Pop & K-Pop"),
    ("kpop", "J-Pop & K-Pop"),
    ("j-pop", "J-Pop & K-Pop"),
    ("k-pop", "J-Pop & K-Pop"),
    ("pop", "Pop"),
    ("rock", "Rock"),
    ("singer", "Singer/Songwriter"),
    ("songwriter", "Singer/Songwriter"),
    ("singer/songwriter", "Singer/Songwriter"),
    ("urban", "Urban"),
    ("hip-hop", "Urban"),
    ("hiphop", "Urban"),
    ("hip hop", "Urban"),
    ("r&b", "Urban"),
    ("rnb", "Urban"),
    ("rap", "Urban"),
];

/// Genre → annual decay anchors (index 0 = year 1).
///
/// Built once by the loader; every curve is checked on construction so the
/// rest of the engine can assume positive, non-increasing anchors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, Vec<Multiple>>",
    into = "BTreeMap<String, Vec<Multiple>>"
)]
pub struct DecayAnchorTable {
    curves: BTreeMap<String, Vec<Multiple>>,
}

/// Anchors selected for one analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedAnchors {
    /// Table key that supplied the anchors (or "average").
    pub genre: String,
    pub anchors: Vec<Multiple>,
    pub fallback_used: bool,
}

impl DecayAnchorTable {
    pub fn new(curves: BTreeMap<String, Vec<Multiple>>) -> PricingResult<Self> {
        if curves.is_empty() {
            return Err(PricingError::InsufficientData(
                "Decay table must contain at least one genre".into(),
            ));
        }
        for (genre, anchors) in &curves {
            validate_anchors(anchors)
                .map_err(|e| PricingError::MalformedCurve(format!("genre '{genre}': {e}")))?;
        }
        Ok(Self { curves })
    }

    pub fn genres(&self) -> impl Iterator<Item = &str> {
        self.curves.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    /// Anchors for `genre`: exact key, then case-insensitive key, then alias.
    pub fn anchors(&self, genre: &str) -> PricingResult<&[Multiple]> {
        self.find_key(genre)
            .and_then(|key| self.curves.get(key))
            .map(|v| v.as_slice())
            .ok_or_else(|| PricingError::UnknownGenre(genre.to_string()))
    }

    /// Anchors for `genre`, applying the fallback policy when it is missing.
    pub fn resolve(&self, genre: &str, fallback: GenreFallback) -> PricingResult<ResolvedAnchors> {
        if let Some(key) = self.find_key(genre) {
            return Ok(ResolvedAnchors {
                genre: key.to_string(),
                anchors: self.curves[key].clone(),
                fallback_used: false,
            });
        }
        match fallback {
            GenreFallback::Reject => Err(PricingError::UnknownGenre(genre.to_string())),
            GenreFallback::Average => Ok(ResolvedAnchors {
                genre: "average".into(),
                anchors: self.average_anchors(),
                fallback_used: true,
            }),
        }
    }

    /// Year-by-year mean over every genre, truncated to the shortest curve.
    pub fn average_anchors(&self) -> Vec<Multiple> {
        let years = self.curves.values().map(|c| c.len()).min().unwrap_or(0);
        let count = Decimal::from(self.curves.len() as i64);
        (0..years)
            .map(|y| self.curves.values().map(|c| c[y]).sum::<Decimal>() / count)
            .collect()
    }

    fn find_key(&self, genre: &str) -> Option<&str> {
        let wanted = genre.trim();
        if let Some((key, _)) = self.curves.get_key_value(wanted) {
            return Some(key.as_str());
        }
        if let Some(key) = self.curves.keys().find(|k| k.eq_ignore_ascii_case(wanted)) {
            return Some(key.as_str());
        }
        let lower = wanted.to_lowercase();
        let canonical = GENRE_ALIASES
            .iter()
            .find(|(alias, _)| *alias == lower)
            .map(|(_, canonical)| *canonical)?;
        self.curves
            .keys()
            .find(|k| k.eq_ignore_ascii_case(canonical))
            .map(|k| k.as_str())
    }
}

impl TryFrom<BTreeMap<String, Vec<Multiple>>> for DecayAnchorTable {
    type Error = PricingError;

    fn try_from(curves: BTreeMap<String, Vec<Multiple>>) -> Result<Self, Self::Error> {
        DecayAnchorTable::new(curves)
    }
}

impl From<DecayAnchorTable> for BTreeMap<String, Vec<Multiple>> {
    fn from(table: DecayAnchorTable) -> Self {
        table.curves
    }
}
