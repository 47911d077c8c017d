//! Named lookback horizons.

use crate::core::calendar::{days_before, first_of_month, first_of_year, months_before};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Horizon {
    #[serde(rename = "1D")]
    OneDay,
    #[serde(rename = "1W")]
    OneWeek,
    #[serde(rename = "MTD")]
    MonthToDate,
    #[serde(rename = "YTD")]
    YearToDate,
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "3Y")]
    ThreeYears,
    #[serde(rename = "5Y")]
    FiveYears,
}

impl Display for Horizon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Horizon::OneDay => "1D",
                Horizon::OneWeek => "1W",
                Horizon::MonthToDate => "MTD",
                Horizon::YearToDate => "YTD",
                Horizon::OneYear => "1Y",
                Horizon::ThreeYears => "3Y",
                Horizon::FiveYears => "5Y",
            }
        )
    }
}

impl FromStr for Horizon {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "1D" => Ok(Horizon::OneDay),
            "1W" => Ok(Horizon::OneWeek),
            "MTD" => Ok(Horizon::MonthToDate),
            "YTD" => Ok(Horizon::YearToDate),
            "1Y" => Ok(Horizon::OneYear),
            "3Y" => Ok(Horizon::ThreeYears),
            "5Y" => Ok(Horizon::FiveYears),
            _ => Err(anyhow::anyhow!("Invalid horizon: {}", s)),
        }
    }
}

impl Horizon {
    /// Fixed horizons in display order.
    pub const ALL: [Horizon; 7] = [
        Horizon::OneDay,
        Horizon::OneWeek,
        Horizon::MonthToDate,
        Horizon::YearToDate,
        Horizon::OneYear,
        Horizon::ThreeYears,
        Horizon::FiveYears,
    ];

    /// Start of the trailing window ending at `end`, for horizons measured as
    /// a fixed calendar offset. Returns `None` for 1D, MTD and YTD.
    pub fn offset_start(&self, end: NaiveDate) -> Option<NaiveDate> {
        match self {
            Horizon::OneWeek => Some(days_before(end, 7)),
            Horizon::OneYear => Some(months_before(end, 12)),
            Horizon::ThreeYears => Some(months_before(end, 36)),
            Horizon::FiveYears => Some(months_before(end, 60)),
            Horizon::OneDay | Horizon::MonthToDate | Horizon::YearToDate => None,
        }
    }

    /// Start of the observation window for a chart ending `today`.
    ///
    /// 1D has no window of its own and returns `None`.
    pub fn window_start(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            Horizon::OneDay => None,
            Horizon::MonthToDate => Some(first_of_month(today)),
            Horizon::YearToDate => Some(first_of_year(today)),
            _ => self.offset_start(today),
        }
    }
}
