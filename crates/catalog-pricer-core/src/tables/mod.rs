pub mod decay_table;
pub mod ppu_table;

pub use decay_table::{DecayAnchorTable, ResolvedAnchors};
pub use ppu_table::{CountryRate, PpuRateTable};

use serde::{Deserialize, Serialize};

/// Both lookup tables, as handed over by the loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketData {
    pub decay: DecayAnchorTable,
    pub ppu: PpuRateTable,
}

impl MarketData {
    pub fn new(decay: DecayAnchorTable, ppu: PpuRateTable) -> Self {
        Self { decay, ppu }
    }
}
