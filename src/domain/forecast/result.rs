use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::District;

/// Round to two decimal places, the precision every forecast is reported at
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// The three cascade predictions for one district and date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    district: District,
    date: NaiveDate,
    load: f64,
    price: f64,
    blackout_chance: f64,
}

impl ForecastResult {
    /// Build a result; all estimates are rounded to two decimals
    pub fn new(district: District, date: NaiveDate, load: f64, price: f64, blackout: f64) -> Self {
        Self {
            district,
            date,
            load: round2(load),
            price: round2(price),
            blackout_chance: round2(blackout),
        }
    }

    pub fn district(&self) -> &District {
        &self.district
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn load(&self) -> f64 {
        self.load
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn blackout_chance(&self) -> f64 {
        self.blackout_chance
    }
}
