use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DwellingType {
    #[default]
    House,
    Apartment,
    Office,
}

impl std::fmt::Display for DwellingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DwellingType::House => write!(f, "house"),
            DwellingType::Apartment => write!(f, "apartment"),
            DwellingType::Office => write!(f, "office"),
        }
    }
}

impl std::str::FromStr for DwellingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "house" | "casa" => Ok(DwellingType::House),
            "apartment" | "departamento" => Ok(DwellingType::Apartment),
            "office" | "oficina" => Ok(DwellingType::Office),
            other => Err(format!("unknown dwelling type '{other}'")),
        }
    }
}

/// Delivery destination captured at checkout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub region: Option<String>,
    /// Chilean administrative subdivision below the region.
    pub comuna: Option<String>,
    pub street: String,
    /// Apartment number, office, or other unit detail.
    pub unit: Option<String>,
    pub dwelling_type: DwellingType,
    /// Coordinates from the selected address suggestion, when one was picked.
    pub location: Option<GeoPoint>,
}

impl ShippingAddress {
    /// An address is complete once region, comuna and a non-blank street are all present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.region) && present(&self.comuna) && !self.street.trim().is_empty()
    }

    /// Fills street and coordinates from a geocoding suggestion, keeping the
    /// region/comuna the user already chose.
    pub fn apply_suggestion(&mut self, suggestion: &AddressSuggestion) {
        self.street = suggestion.street_line();
        self.location = Some(GeoPoint::new(suggestion.lat, suggestion.lon));
    }

    /// Single-line rendering for confirmations and logs.
    #[must_use]
    pub fn one_line(&self) -> String {
        let mut parts = vec![self.street.trim().to_string()];
        if let Some(unit) = self.unit.as_deref().filter(|u| !u.trim().is_empty()) {
            parts.push(unit.trim().to_string());
        }
        parts.extend(self.comuna.iter().cloned());
        parts.extend(self.region.iter().cloned());
        parts.join(", ")
    }
}

/// One result from the address suggestion service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressSuggestion {
    pub display: String,
    pub lat: f64,
    pub lon: f64,
    pub street: Option<String>,
    pub house_number: Option<String>,
}

impl AddressSuggestion {
    /// Street and house number joined, falling back to the display text.
    #[must_use]
    pub fn street_line(&self) -> String {
        match (self.street.as_deref(), self.house_number.as_deref()) {
            (Some(street), Some(number)) => format!("{street} {number}"),
            (Some(street), None) => street.to_string(),
            _ => self.display.clone(),
        }
    }
}
