use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterKey {
    Changes,
    MarketCap,
    SupplyPercent,
    SupplyNormal,
    Volumes,
}

impl FilterKey {
    pub const ALL: [FilterKey; 5] = [
        FilterKey::Changes,
        FilterKey::MarketCap,
        FilterKey::SupplyPercent,
        FilterKey::SupplyNormal,
        FilterKey::Volumes,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FilterKey::Changes => "changes",
            FilterKey::MarketCap => "marketCap",
            FilterKey::SupplyPercent => "supplyPercent",
            FilterKey::SupplyNormal => "supplyNormal",
            FilterKey::Volumes => "volumes",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FilterKey::Changes => "Changes in 24 Hours",
            FilterKey::MarketCap => "Market Cap",
            FilterKey::SupplyPercent => "Supply Number in Percent",
            FilterKey::SupplyNormal => "Supply Number",
            FilterKey::Volumes => "Volume Traded in 24 Hours",
        }
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();

        FilterKey::ALL
            .iter()
            .copied()
            .find(|key| key.name().to_ascii_lowercase() == normalized)
            .ok_or_else(|| format!("unknown filter '{}'", s.trim()))
    }
}

/// Column visibility toggles. Each one is independent of the others.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Filters {
    pub changes: bool,
    pub market_cap: bool,
    pub supply_percent: bool,
    pub supply_normal: bool,
    pub volumes: bool,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            changes: true,
            market_cap: true,
            supply_percent: true,
            supply_normal: false,
            volumes: false,
        }
    }
}

impl Filters {
    pub fn get(&self, key: FilterKey) -> bool {
        match key {
            FilterKey::Changes => self.changes,
            FilterKey::MarketCap => self.market_cap,
            FilterKey::SupplyPercent => self.supply_percent,
            FilterKey::SupplyNormal => self.supply_normal,
            FilterKey::Volumes => self.volumes,
        }
    }

    pub fn toggle(&mut self, key: FilterKey, value: bool) {
        let slot = match key {
            FilterKey::Changes => &mut self.changes,
            FilterKey::MarketCap => &mut self.market_cap,
            FilterKey::SupplyPercent => &mut self.supply_percent,
            FilterKey::SupplyNormal => &mut self.supply_normal,
            FilterKey::Volumes => &mut self.volumes,
        };
        *slot = value;
    }
}
