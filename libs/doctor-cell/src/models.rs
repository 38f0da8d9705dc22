use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_models::scheduling::Slot;

// ==============================================================================
// DIRECTORY FILTERS
// ==============================================================================

/// Price bands offered by the doctor list filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceBand {
    #[serde(rename = "under_100")]
    Under100,
    #[serde(rename = "under_300")]
    Under300,
    #[serde(rename = "under_500")]
    Under500,
    #[serde(rename = "from_500")]
    From500,
}

impl PriceBand {
    pub fn contains(&self, price: f64) -> bool {
        match self {
            PriceBand::Under100 => price < 100.0,
            PriceBand::Under300 => price < 300.0,
            PriceBand::Under500 => price < 500.0,
            PriceBand::From500 => price >= 500.0,
        }
    }
}

/// All fields optional; empty strings count as "no filter".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoctorSearchFilters {
    pub specialty: Option<String>,
    pub governorate: Option<String>,
    pub min_rating: Option<f64>,
    pub price: Option<PriceBand>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DoctorFacets {
    pub specialties: Vec<String>,
    pub governorates: Vec<String>,
}

// ==============================================================================
// SLOTS
// ==============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct AvailableSlotsResponse {
    pub doctor_id: String,
    pub slots: Vec<Slot>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum DoctorError {
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Document store error: {0}")]
    Store(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_bands_match_list_screen() {
        assert!(PriceBand::Under100.contains(99.0));
        assert!(!PriceBand::Under100.contains(100.0));
        assert!(PriceBand::Under500.contains(250.0));
        assert!(PriceBand::From500.contains(500.0));
        assert!(!PriceBand::From500.contains(499.99));
    }

    #[test]
    fn price_band_wire_names() {
        let band: PriceBand = serde_json::from_str("\"under_300\"").unwrap();
        assert_eq!(band, PriceBand::Under300);
    }
}
