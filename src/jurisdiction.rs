//! Provinces, territories and the municipalities with their own transfer tax

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AnalysisError;

/// Canadian province or territory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Province {
    #[serde(rename = "AB")]
    Alberta,
    #[serde(rename = "BC")]
    BritishColumbia,
    #[serde(rename = "MB")]
    Manitoba,
    #[serde(rename = "NB")]
    NewBrunswick,
    #[serde(rename = "NL")]
    NewfoundlandAndLabrador,
    #[serde(rename = "NS")]
    NovaScotia,
    #[serde(rename = "NT")]
    NorthwestTerritories,
    #[serde(rename = "NU")]
    Nunavut,
    #[serde(rename = "ON")]
    Ontario,
    #[serde(rename = "PE")]
    PrinceEdwardIsland,
    #[serde(rename = "QC")]
    Quebec,
    #[serde(rename = "SK")]
    Saskatchewan,
    #[serde(rename = "YT")]
    Yukon,
}

impl Province {
    pub const ALL: [Province; 13] = [
        Province::Alberta,
        Province::BritishColumbia,
        Province::Manitoba,
        Province::NewBrunswick,
        Province::NewfoundlandAndLabrador,
        Province::NovaScotia,
        Province::NorthwestTerritories,
        Province::Nunavut,
        Province::Ontario,
        Province::PrinceEdwardIsland,
        Province::Quebec,
        Province::Saskatchewan,
        Province::Yukon,
    ];

    /// Two-letter postal abbreviation
    pub fn code(&self) -> &'static str {
        match self {
            Province::Alberta => "AB",
            Province::BritishColumbia => "BC",
            Province::Manitoba => "MB",
            Province::NewBrunswick => "NB",
            Province::NewfoundlandAndLabrador => "NL",
            Province::NovaScotia => "NS",
            Province::NorthwestTerritories => "NT",
            Province::Nunavut => "NU",
            Province::Ontario => "ON",
            Province::PrinceEdwardIsland => "PE",
            Province::Quebec => "QC",
            Province::Saskatchewan => "SK",
            Province::Yukon => "YT",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Province::Alberta => "Alberta",
            Province::BritishColumbia => "British Columbia",
            Province::Manitoba => "Manitoba",
            Province::NewBrunswick => "New Brunswick",
            Province::NewfoundlandAndLabrador => "Newfoundland and Labrador",
            Province::NovaScotia => "Nova Scotia",
            Province::NorthwestTerritories => "Northwest Territories",
            Province::Nunavut => "Nunavut",
            Province::Ontario => "Ontario",
            Province::PrinceEdwardIsland => "Prince Edward Island",
            Province::Quebec => "Quebec",
            Province::Saskatchewan => "Saskatchewan",
            Province::Yukon => "Yukon",
        }
    }
}

impl fmt::Display for Province {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Province {
    type Err = AnalysisError;

    /// Accepts postal codes ("ON") or full names ("Ontario"), case-insensitive
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Province::ALL
            .iter()
            .find(|p| p.code().eq_ignore_ascii_case(needle) || p.name().eq_ignore_ascii_case(needle))
            .copied()
            .ok_or_else(|| AnalysisError::UnknownJurisdiction(s.to_string()))
    }
}

/// Municipality levying its own land transfer tax
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Municipality {
    Toronto,
    Montreal,
}

impl Municipality {
    pub fn name(&self) -> &'static str {
        match self {
            Municipality::Toronto => "Toronto",
            Municipality::Montreal => "Montreal",
        }
    }

    /// Province the municipality belongs to
    pub fn province(&self) -> Province {
        match self {
            Municipality::Toronto => Province::Ontario,
            Municipality::Montreal => Province::Quebec,
        }
    }
}

impl FromStr for Municipality {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "toronto" => Ok(Municipality::Toronto),
            "montreal" | "montréal" => Ok(Municipality::Montreal),
            _ => Err(AnalysisError::UnknownJurisdiction(s.to_string())),
        }
    }
}
