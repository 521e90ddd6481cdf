use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{info, warn};

use crate::domain::forecast::ExternalReading;
use crate::domain::provider::{DataProvider, FieldExtractor, PageSource};
use crate::domain::District;
use crate::infrastructure::observability::{record_provider_fetch, FetchOutcome};

/// Page source plus field extractor, bounded by a per-call timeout
#[derive(Debug, Clone)]
pub struct ScrapingDataProvider {
    source: Arc<dyn PageSource>,
    extractor: Arc<dyn FieldExtractor>,
    timeout: Duration,
}

impl ScrapingDataProvider {
    pub fn new(
        source: Arc<dyn PageSource>,
        extractor: Arc<dyn FieldExtractor>,
        timeout: Duration,
    ) -> Self {
        Self {
            source,
            extractor,
            timeout,
        }
    }

    async fn fetch_inner(&self, district: &District, date: NaiveDate) -> Result<ExternalReading, FetchOutcome> {
        let text = self
            .source
            .fetch_text(district, date)
            .await
            .ok_or(FetchOutcome::NoPage)?;

        let context = format!("electricity and weather in {} on {}", district, date);
        let values = self
            .extractor
            .extract(&text, &context, ExternalReading::FIELDS)
            .await
            .ok_or(FetchOutcome::NoFields)?;

        ExternalReading::from_values(&values).ok_or(FetchOutcome::NoFields)
    }
}

#[async_trait]
impl DataProvider for ScrapingDataProvider {
    async fn fetch(&self, district: &District, date: NaiveDate) -> Option<ExternalReading> {
        let started = Instant::now();

        let outcome = match tokio::time::timeout(self.timeout, self.fetch_inner(district, date)).await {
            Ok(result) => result,
            Err(_) => Err(FetchOutcome::Timeout),
        };

        match outcome {
            Ok(reading) => {
                record_provider_fetch(self.name(), FetchOutcome::Success, started.elapsed());
                info!(district = %district, %date, price = reading.price, "Reading fetched");
                Some(reading)
            }
            Err(reason) => {
                record_provider_fetch(self.name(), reason, started.elapsed());
                warn!(district = %district, %date, reason = reason.as_str(), "No reading available");
                None
            }
        }
    }

    fn name(&self) -> &'static str {
        "scraping"
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::domain::forecast::ExtractionField;

    #[derive(Debug)]
    struct FixedSource {
        text: Option<String>,
        delay: Duration,
    }

    #[async_trait]
    impl PageSource for FixedSource {
        async fn fetch_text(&self, _district: &District, _date: NaiveDate) -> Option<String> {
            tokio::time::sleep(self.delay).await;
            self.text.clone()
        }
    }

    #[derive(Debug)]
    struct FixedExtractor(Option<HashMap<String, f64>>);

    #[async_trait]
    impl FieldExtractor for FixedExtractor {
        async fn extract(
            &self,
            _raw_text: &str,
            _context: &str,
            _fields: &[ExtractionField],
        ) -> Option<HashMap<String, f64>> {
            self.0.clone()
        }
    }

    fn provider(
        text: Option<&str>,
        values: Option<&[(&str, f64)]>,
        delay: Duration,
    ) -> ScrapingDataProvider {
        let values = values.map(|v| v.iter().map(|(k, x)| (k.to_string(), *x)).collect());
        ScrapingDataProvider::new(
            Arc::new(FixedSource {
                text: text.map(String::from),
                delay,
            }),
            Arc::new(FixedExtractor(values)),
            Duration::from_millis(200),
        )
    }

    fn key() -> (District, NaiveDate) {
        (
            District::new("Kolkata").unwrap(),
            NaiveDate::from_ymd_opt(2025, 4, 15).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_successful_fetch() {
        let provider = provider(
            Some("page"),
            Some(&[("price", 9.0), ("temperature", 31.0), ("load_demand", 1900.0)]),
            Duration::ZERO,
        );
        let (district, date) = key();

        let reading = provider.fetch(&district, date).await.unwrap();

        assert_eq!(reading.price, 9.0);
        assert_eq!(reading.temperature, Some(31.0));
        assert_eq!(reading.load_demand, Some(1900.0));
    }

    #[tokio::test]
    async fn test_missing_page_is_none() {
        let provider = provider(None, Some(&[("price", 9.0)]), Duration::ZERO);
        let (district, date) = key();

        assert!(provider.fetch(&district, date).await.is_none());
    }

    #[tokio::test]
    async fn test_missing_price_is_none() {
        let provider = provider(Some("page"), Some(&[("temperature", 31.0)]), Duration::ZERO);
        let (district, date) = key();

        assert!(provider.fetch(&district, date).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_none() {
        let provider = provider(Some("page"), Some(&[("price", 9.0)]), Duration::from_secs(5));
        let (district, date) = key();

        assert!(provider.fetch(&district, date).await.is_none());
    }
}
