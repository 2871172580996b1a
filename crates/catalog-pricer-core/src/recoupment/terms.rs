use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PricingError;
use crate::types::{Money, Rate};
use crate::PricingResult;

// ---------------------------------------------------------------------------
// Deal type
// ---------------------------------------------------------------------------

/// Deal structure offered to the artist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealType {
    /// Label keeps `deal_percent` of gross; the artist's royalty recoups the advance.
    Royalty,
    /// Label keeps all gross until recouped, then `deal_percent`.
    Distribution,
    /// Investment is expensed against gross; net recoups, then splits at `deal_percent`.
    ProfitSplit,
}

impl DealType {
    pub const ALL: [DealType; 3] = [DealType::Royalty, DealType::Distribution, DealType::ProfitSplit];

    /// Share of the pool applied to the balance while unrecouped.
    pub fn recoup_rate(self, deal_percent: Rate) -> Rate {
        match self {
            DealType::Royalty => Decimal::ONE - deal_percent,
            DealType::Distribution => Decimal::ONE,
            DealType::ProfitSplit => Decimal::ONE,
        }
    }

    /// Label share of the pool once recouped.
    pub fn post_recoup_share(self, deal_percent: Rate) -> Rate {
        match self {
            DealType::Royalty => deal_percent,
            DealType::Distribution => deal_percent,
            DealType::ProfitSplit => deal_percent,
        }
    }

    /// Whether the investment is deducted from gross before the split.
    pub fn deducts_expenses(self) -> bool {
        match self {
            DealType::Royalty | DealType::Distribution => false,
            DealType::ProfitSplit => true,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DealType::Royalty => "royalty",
            DealType::Distribution => "distribution",
            DealType::ProfitSplit => "profit_split",
        }
    }
}

impl fmt::Display for DealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DealType {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "royalty" => Ok(DealType::Royalty),
            "distribution" | "funded_distribution" => Ok(DealType::Distribution),
            "profit_split" | "profitsplit" => Ok(DealType::ProfitSplit),
            other => Err(PricingError::invalid(
                "deal_type",
                format!("Unknown deal type '{other}' (expected royalty, distribution or profit_split)"),
            )),
        }
    }
}

/// Deal type with the label's nominal share.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DealTerms {
    pub deal_type: DealType,
    pub deal_percent: Rate,
}

impl DealTerms {
    pub fn new(deal_type: DealType, deal_percent: Rate) -> PricingResult<Self> {
        if deal_percent < Decimal::ZERO || deal_percent > Decimal::ONE {
            return Err(PricingError::invalid(
                "deal_percent",
                format!("Deal percent {deal_percent} must be between 0 and 1"),
            ));
        }
        Ok(Self {
            deal_type,
            deal_percent,
        })
    }

    pub fn recoup_rate(&self) -> Rate {
        self.deal_type.recoup_rate(self.deal_percent)
    }

    pub fn post_recoup_share(&self) -> Rate {
        self.deal_type.post_recoup_share(self.deal_percent)
    }
}

// ---------------------------------------------------------------------------
// Investment
// ---------------------------------------------------------------------------

/// How a total investment divides into advance and marketing, and which part
/// the label recoups.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InvestmentSplit {
    /// Fraction of the total paid to the artist as advance.
    pub advance_share: Rate,
    /// When true the whole investment recoups, otherwise only the advance.
    pub marketing_recoupable: bool,
}

impl InvestmentSplit {
    pub fn new(advance_share: Rate, marketing_recoupable: bool) -> PricingResult<Self> {
        if advance_share < Decimal::ZERO || advance_share > Decimal::ONE {
            return Err(PricingError::invalid(
                "advance_share",
                format!("Advance share {advance_share} must be between 0 and 1"),
            ));
        }
        Ok(Self {
            advance_share,
            marketing_recoupable,
        })
    }

    /// Share of the total investment that enters the recoupable balance.
    pub fn recoupable_fraction(&self) -> Rate {
        if self.marketing_recoupable {
            Decimal::ONE
        } else {
            self.advance_share
        }
    }

    pub fn investment(&self, total: Money) -> Investment {
        Investment {
            total,
            advance: total * self.advance_share,
            marketing_recoupable: self.marketing_recoupable,
        }
    }
}

/// Total label outlay at t0: artist advance plus marketing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Investment {
    pub total: Money,
    pub advance: Money,
    pub marketing_recoupable: bool,
}

impl Investment {
    pub fn new(advance: Money, marketing: Money, marketing_recoupable: bool) -> PricingResult<Self> {
        if advance < Decimal::ZERO || marketing < Decimal::ZERO {
            return Err(PricingError::invalid(
                "investment",
                "Advance and marketing cannot be negative",
            ));
        }
        Ok(Self {
            total: advance + marketing,
            advance,
            marketing_recoupable,
        })
    }

    pub fn marketing(&self) -> Money {
        self.total - self.advance
    }

    /// Balance the label recoups from revenue.
    pub fn recoupable(&self) -> Money {
        if self.marketing_recoupable {
            self.total
        } else {
            self.advance
        }
    }
}

// ---------------------------------------------------------------------------
// Recoupment state
// ---------------------------------------------------------------------------

/// One period's pool split.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodSplit {
    pub label: Money,
    pub artist: Money,
    pub recouped_now: bool,
}

/// Running recoupment balance for one engine run.
///
/// `cumulative_recouped` never decreases and never exceeds
/// `total_investment`; `is_recouped` flips to true at most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoupmentState {
    pub cumulative_recouped: Money,
    /// Recoupable amount.
    pub total_investment: Money,
    pub is_recouped: bool,
    /// Period in which the balance cleared (0 when nothing was recoupable).
    pub recouped_in_period: Option<u32>,
}

impl RecoupmentState {
    pub fn new(recoupable: Money) -> Self {
        let nothing_owed = recoupable <= Decimal::ZERO;
        Self {
            cumulative_recouped: Decimal::ZERO,
            total_investment: recoupable.max(Decimal::ZERO),
            is_recouped: nothing_owed,
            recouped_in_period: if nothing_owed { Some(0) } else { None },
        }
    }

    pub fn remaining(&self) -> Money {
        (self.total_investment - self.cumulative_recouped).max(Decimal::ZERO)
    }

    /// Split `pool` for `period`, advancing the balance.
    ///
    /// While unrecouped the label keeps the whole pool and `pool ×
    /// recoup_rate` counts toward the balance. In the period that clears the
    /// balance only the fraction needed to clear it is taken at 100%; the rest
    /// of the pool is split at the post-recoup share.
    pub fn apply(&mut self, period: u32, pool: Money, terms: &DealTerms) -> PeriodSplit {
        let post = terms.post_recoup_share();
        let remaining = self.remaining();

        if self.is_recouped || remaining <= Decimal::ZERO {
            let label = pool * post;
            return PeriodSplit {
                label,
                artist: pool - label,
                recouped_now: false,
            };
        }

        let recoupable_now = pool * terms.recoup_rate();
        if recoupable_now <= remaining {
            self.cumulative_recouped += recoupable_now;
            let recouped_now = self.remaining().is_zero() && !recoupable_now.is_zero();
            if recouped_now {
                self.mark_recouped(period);
            }
            return PeriodSplit {
                label: pool,
                artist: Decimal::ZERO,
                recouped_now,
            };
        }

        // Part of the pool that clears the balance: remaining / recoup_rate,
        // i.e. pool × remaining / recoupable_now.
        let consumed = (remaining / terms.recoup_rate()).min(pool);
        let label = consumed + (pool - consumed) * post;
        self.cumulative_recouped = self.total_investment;
        self.mark_recouped(period);
        PeriodSplit {
            label,
            artist: pool - label,
            recouped_now: true,
        }
    }

    fn mark_recouped(&mut self, period: u32) {
        if !self.is_recouped {
            self.is_recouped = true;
            self.recouped_in_period = Some(period);
        }
    }
}
