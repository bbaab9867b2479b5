use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A tracked broadcaster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Station {
    CidadeFm,
    Comercial,
    MegaFm,
    Rfm,
}

impl Station {
    /// Every station, in report order.
    pub const ALL: [Station; 4] = [
        Station::CidadeFm,
        Station::Comercial,
        Station::MegaFm,
        Station::Rfm,
    ];

    /// Order in which station logs are collected into a dataset.
    pub const COLLECTION_ORDER: [Station; 4] = [
        Station::Rfm,
        Station::Comercial,
        Station::MegaFm,
        Station::CidadeFm,
    ];

    /// Short tag used in file names and in the dataset's `radio` column.
    pub fn tag(&self) -> &'static str {
        match self {
            Station::CidadeFm => "cidadefm",
            Station::Comercial => "comercial",
            Station::MegaFm => "megafm",
            Station::Rfm => "rfm",
        }
    }

    /// Human-readable station name for report headings.
    pub fn display_name(&self) -> &'static str {
        match self {
            Station::CidadeFm => "CidadeFM",
            Station::Comercial => "Comercial",
            Station::MegaFm => "MegaFM",
            Station::Rfm => "RFM",
        }
    }

    /// Parse a station tag (case-insensitive, surrounding whitespace ignored).
    pub fn from_str_loose(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "cidadefm" => Ok(Station::CidadeFm),
            "comercial" => Ok(Station::Comercial),
            "megafm" => Ok(Station::MegaFm),
            "rfm" => Ok(Station::Rfm),
            _ => Err(Error::UnknownStation(s.to_string())),
        }
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}
