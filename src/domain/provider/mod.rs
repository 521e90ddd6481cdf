//! External data provider contracts
//!
//! A provider turns a (district, date) pair into an [`ExternalReading`]. The
//! shipped implementation composes a [`PageSource`] with a [`FieldExtractor`],
//! and either half can be swapped without touching the cascade.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;

#[cfg(test)]
use mockall::automock;

use crate::domain::forecast::{ExternalReading, ExtractionField};
use crate::domain::District;

/// Source of contextual readings.
///
/// `None` is terminal for the call: no retry and no backoff.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DataProvider: Send + Sync {
    async fn fetch(&self, district: &District, date: NaiveDate) -> Option<ExternalReading>;

    /// Short backend name for logs and metrics
    fn name(&self) -> &'static str;
}

/// Raw text about a district on a date
#[async_trait]
pub trait PageSource: Send + Sync + std::fmt::Debug {
    async fn fetch_text(&self, district: &District, date: NaiveDate) -> Option<String>;
}

/// Best-effort extraction of numeric fields from unstructured text
#[async_trait]
pub trait FieldExtractor: Send + Sync + std::fmt::Debug {
    async fn extract(
        &self,
        raw_text: &str,
        context: &str,
        fields: &[ExtractionField],
    ) -> Option<HashMap<String, f64>>;
}
