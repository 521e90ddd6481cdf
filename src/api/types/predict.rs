use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::ForecastResult;

/// Body of `POST /predict`. Fields are optional so absence maps to a 400
/// with a fixed message instead of a deserialization error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub district: String,
    pub date: NaiveDate,
    pub load: f64,
    pub price: f64,
    pub blackout_chance: f64,
}

impl From<ForecastResult> for PredictResponse {
    fn from(result: ForecastResult) -> Self {
        Self {
            district: result.district().to_string(),
            date: result.date(),
            load: result.load(),
            price: result.price(),
            blackout_chance: result.blackout_chance(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::District;

    #[test]
    fn test_request_fields_are_optional() {
        let request: PredictRequest = serde_json::from_str(r#"{"district": "Kolkata"}"#).unwrap();
        assert_eq!(request.district.as_deref(), Some("Kolkata"));
        assert!(request.date.is_none());
    }

    #[test]
    fn test_response_shape() {
        let result = ForecastResult::new(
            District::new("Kolkata").unwrap(),
            NaiveDate::from_ymd_opt(2025, 4, 15).unwrap(),
            1800.456,
            8.0,
            12.5,
        );

        let json = serde_json::to_value(PredictResponse::from(result)).unwrap();
        assert_eq!(json["district"], "Kolkata");
        assert_eq!(json["date"], "2025-04-15");
        assert_eq!(json["load"], 1800.46);
        assert_eq!(json["blackout_chance"], 12.5);
    }
}
