//! Static index universe, region mapping and currency lists.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Sentinel currency meaning "keep each index in its own currency".
pub const LOCAL: &str = "LOCAL";

/// Currencies always included in the FX map.
pub const HARD_CURRENCIES: [&str; 5] = ["USD", "EUR", "GBP", "JPY", "CHF"];

pub const DEFAULT_CURRENCY: &str = "USD";

/// Default selection for the comparison chart.
pub const DEFAULT_COMPARISON: [&str; 3] = ["S&P 500", "Euro Stoxx 50", "DAX (Germany)"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexDefinition {
    pub name: &'static str,
    pub ticker: &'static str,
    pub currency: &'static str,
}

const fn index(
    name: &'static str,
    ticker: &'static str,
    currency: &'static str,
) -> IndexDefinition {
    IndexDefinition {
        name,
        ticker,
        currency,
    }
}

pub const INDICES: [IndexDefinition; 26] = [
    index("S&P 500", "^GSPC", "USD"),
    index("Dow Jones", "^DJI", "USD"),
    index("Nasdaq 100", "^NDX", "USD"),
    index("Russell 2000", "^RUT", "USD"),
    index("S&P/TSX Composite (Canada)", "^GSPTSE", "CAD"),
    index("STOXX Europe 600", "^STOXX", "EUR"),
    index("Euro Stoxx 50", "^STOXX50E", "EUR"),
    index("DAX (Germany)", "^GDAXI", "EUR"),
    index("CAC 40 (France)", "^FCHI", "EUR"),
    index("FTSE 100 (UK)", "^FTSE", "GBP"),
    index("FTSE MIB (Italy)", "FTSEMIB.MI", "EUR"),
    index("IBEX 35 (Spain)", "^IBEX", "EUR"),
    index("AEX (Netherlands)", "^AEX", "EUR"),
    index("SMI (Switzerland)", "^SSMI", "CHF"),
    index("OMX Stockholm 30", "^OMX", "SEK"),
    index("OMX Copenhagen 25", "^OMXC25", "DKK"),
    index("Nikkei 225 (Japan)", "^N225", "JPY"),
    index("Shenzhen (China)", "399001.SZ", "CNY"),
    index("Hang Seng (Hong Kong)", "^HSI", "HKD"),
    index("TAIEX (Taiwan)", "^TWII", "TWD"),
    index("KOSPI (Korea)", "^KS11", "KRW"),
    index("S&P/ASX 200 (Australia)", "^AXJO", "AUD"),
    index("Ibovespa (Brazil)", "^BVSP", "BRL"),
    index("IPC Mexico", "^MXX", "MXN"),
    index("MSCI World (USD)", "URTH", "USD"),
    index("MSCI Emerging Markets (USD)", "EEM", "USD"),
];

/// Looks up an index definition by its display name.
pub fn find_index(name: &str) -> Option<&'static IndexDefinition> {
    INDICES.iter().find(|def| def.name == name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Region {
    Americas,
    Europe,
    AsiaPac,
    LatAm,
    Global,
    Other,
}

impl Region {
    pub const ALL: [Region; 6] = [
        Region::Americas,
        Region::Europe,
        Region::AsiaPac,
        Region::LatAm,
        Region::Global,
        Region::Other,
    ];

    /// Region an index belongs to. Names absent from the mapping are `Other`.
    pub fn of(name: &str) -> Region {
        match name {
            "S&P 500"
            | "Dow Jones"
            | "Nasdaq 100"
            | "Russell 2000"
            | "S&P/TSX Composite (Canada)" => Region::Americas,
            "STOXX Europe 600"
            | "Euro Stoxx 50"
            | "DAX (Germany)"
            | "CAC 40 (France)"
            | "FTSE 100 (UK)"
            | "FTSE MIB (Italy)"
            | "IBEX 35 (Spain)"
            | "AEX (Netherlands)"
            | "SMI (Switzerland)" => Region::Europe,
            "Nikkei 225 (Japan)"
            | "Shenzhen (China)"
            | "Hang Seng (Hong Kong)"
            | "TAIEX (Taiwan)"
            | "KOSPI (Korea)"
            | "S&P/ASX 200 (Australia)" => Region::AsiaPac,
            "Ibovespa (Brazil)" | "IPC Mexico" => Region::LatAm,
            "MSCI World (USD)" | "MSCI Emerging Markets (USD)" => Region::Global,
            _ => Region::Other,
        }
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Region::Americas => "Americas",
                Region::Europe => "Europe",
                Region::AsiaPac => "AsiaPac",
                Region::LatAm => "LatAm",
                Region::Global => "Global",
                Region::Other => "Other",
            }
        )
    }
}

impl FromStr for Region {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "americas" => Ok(Region::Americas),
            "europe" => Ok(Region::Europe),
            "asiapac" => Ok(Region::AsiaPac),
            "latam" => Ok(Region::LatAm),
            "global" => Ok(Region::Global),
            "other" => Ok(Region::Other),
            _ => Err(anyhow::anyhow!("Invalid region: {}", s)),
        }
    }
}

/// Display currency requested by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TargetCurrency {
    Local,
    Code(String),
}

impl TargetCurrency {
    pub fn code(&self) -> Option<&str> {
        match self {
            TargetCurrency::Local => None,
            TargetCurrency::Code(code) => Some(code),
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, TargetCurrency::Local)
    }
}

impl Display for TargetCurrency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetCurrency::Local => write!(f, "{LOCAL}"),
            TargetCurrency::Code(code) => write!(f, "{code}"),
        }
    }
}

impl FromStr for TargetCurrency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_uppercase();
        if code == LOCAL {
            return Ok(TargetCurrency::Local);
        }
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(anyhow::anyhow!("Invalid currency code: {}", s));
        }
        Ok(TargetCurrency::Code(code))
    }
}
