use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A field the external provider is asked to extract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionField {
    pub name: &'static str,
    pub description: &'static str,
}

/// Contextual readings for one (district, date), consumed by a single call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalReading {
    /// Price proxy in currency per unit
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,
    /// Observed load in MW, only available for past dates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_demand: Option<f64>,
    /// Observed blackout risk in percent, only available for past dates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blackout_risk: Option<f64>,
}

impl ExternalReading {
    pub const FIELDS: &'static [ExtractionField] = &[
        ExtractionField {
            name: "price",
            description: "Electricity price (currency per unit)",
        },
        ExtractionField {
            name: "temperature",
            description: "Temperature (degrees Celsius)",
        },
        ExtractionField {
            name: "humidity",
            description: "Humidity (%)",
        },
        ExtractionField {
            name: "wind_speed",
            description: "Wind speed (km/h)",
        },
        ExtractionField {
            name: "load_demand",
            description: "Observed load demand (MW)",
        },
        ExtractionField {
            name: "blackout_risk",
            description: "Observed blackout risk (%)",
        },
    ];

    pub fn new(price: f64) -> Self {
        Self {
            price,
            temperature: None,
            humidity: None,
            wind_speed: None,
            load_demand: None,
            blackout_risk: None,
        }
    }

    pub fn with_weather(mut self, temperature: f64, humidity: f64, wind_speed: f64) -> Self {
        self.temperature = Some(temperature);
        self.humidity = Some(humidity);
        self.wind_speed = Some(wind_speed);
        self
    }

    pub fn with_observed(mut self, load_demand: f64, blackout_risk: f64) -> Self {
        self.load_demand = Some(load_demand);
        self.blackout_risk = Some(blackout_risk);
        self
    }

    /// Build a reading from extracted values. A finite price is required.
    pub fn from_values(values: &HashMap<String, f64>) -> Option<Self> {
        let field = |name: &str| values.get(name).copied().filter(|v| v.is_finite());

        Some(Self {
            price: field("price")?,
            temperature: field("temperature"),
            humidity: field("humidity"),
            wind_speed: field("wind_speed"),
            load_demand: field("load_demand"),
            blackout_risk: field("blackout_risk"),
        })
    }

    /// Observed `(load, blackout_risk)` when both are present
    pub fn observed(&self) -> Option<(f64, f64)> {
        Some((self.load_demand?, self.blackout_risk?))
    }
}
