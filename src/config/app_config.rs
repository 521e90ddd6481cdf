use std::collections::HashSet;
use std::path::PathBuf;

use chrono::{Duration, NaiveDate};
use serde::Deserialize;

use crate::domain::training::TrainingPlan;
use crate::domain::{District, DomainError};
use crate::infrastructure::observability::ObservabilityConfig;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub training: TrainingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Where the trained artifact pair lives
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub dir: PathBuf,
}

/// External data provider settings
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Gemini API key; falls back to `GEMINI_API_KEY`
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    /// Override for the Gemini endpoint
    #[serde(default)]
    pub base_url: Option<String>,
    /// Page URL with `{district}` and `{date}` placeholders
    #[serde(default = "default_url_template")]
    pub url_template: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DistrictCapacity {
    pub name: String,
    pub capacity: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrainingConfig {
    #[serde(default = "default_districts")]
    pub districts: Vec<DistrictCapacity>,
    /// Window length when no explicit start is given
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,
    #[serde(default = "default_true")]
    pub weekly_seasonality: bool,
    #[serde(default = "default_true")]
    pub yearly_seasonality: bool,
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_url_template() -> String {
    "https://www.example.com/weather/{district}/{date}".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_districts() -> Vec<DistrictCapacity> {
    [
        ("Kolkata", 2000.0),
        ("Mumbai", 5000.0),
        ("Delhi", 7000.0),
        ("Chennai", 3000.0),
        ("Bangalore", 4000.0),
    ]
    .into_iter()
    .map(|(name, capacity)| DistrictCapacity {
        name: name.to_string(),
        capacity,
    })
    .collect()
}

fn default_lookback_days() -> u32 {
    30
}

fn default_workers() -> usize {
    4
}

fn default_fetch_concurrency() -> usize {
    4
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("artifacts"),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: None,
            url_template: default_url_template(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            districts: default_districts(),
            lookback_days: default_lookback_days(),
            start: None,
            end: None,
            workers: default_workers(),
            fetch_concurrency: default_fetch_concurrency(),
            weekly_seasonality: true,
            yearly_seasonality: true,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("GRIDCAST")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut app: Self = config.try_deserialize()?;
        app.provider.resolve_api_key(std::env::var("GEMINI_API_KEY").ok());

        Ok(app)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.store.dir.as_os_str().is_empty() {
            return Err(DomainError::configuration("store.dir must not be empty"));
        }

        if self.provider.timeout_secs == 0 {
            return Err(DomainError::configuration("provider.timeout_secs must be at least 1"));
        }

        if !self.provider.url_template.contains("{district}") {
            return Err(DomainError::configuration(
                "provider.url_template must contain a {district} placeholder",
            ));
        }

        self.training.validate()
    }
}

impl ProviderConfig {
    /// Blank keys count as missing
    pub fn resolve_api_key(&mut self, fallback: Option<String>) {
        let configured = self.api_key.take().filter(|k| !k.trim().is_empty());
        self.api_key = configured.or_else(|| fallback.filter(|k| !k.trim().is_empty()));
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.districts.is_empty() {
            return Err(DomainError::configuration("training.districts must not be empty"));
        }

        if self.lookback_days == 0 {
            return Err(DomainError::configuration("training.lookback_days must be at least 1"));
        }

        if self.workers == 0 || self.fetch_concurrency == 0 {
            return Err(DomainError::configuration(
                "training.workers and training.fetch_concurrency must be at least 1",
            ));
        }

        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(DomainError::configuration(format!(
                    "training.start {} is after training.end {}",
                    start, end
                )));
            }
        }

        let mut seen = HashSet::new();
        for entry in &self.districts {
            let district = District::new(entry.name.as_str())?;
            if !seen.insert(district) {
                return Err(DomainError::configuration(format!(
                    "district '{}' is configured twice",
                    entry.name
                )));
            }
            if !entry.capacity.is_finite() || entry.capacity <= 0.0 {
                return Err(DomainError::configuration(format!(
                    "installed capacity for '{}' must be positive",
                    entry.name
                )));
            }
        }

        Ok(())
    }

    /// Resolve the run window and district subset into a plan.
    ///
    /// Explicit overrides beat configured dates; without either the window is
    /// the `lookback_days` days ending `today`.
    pub fn plan(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        only: &[String],
        today: NaiveDate,
    ) -> Result<TrainingPlan, DomainError> {
        self.validate()?;

        let end = end.or(self.end).unwrap_or(today);
        let start = start
            .or(self.start)
            .unwrap_or_else(|| end - Duration::days(i64::from(self.lookback_days)));

        let mut districts = Vec::with_capacity(self.districts.len());
        for entry in &self.districts {
            let district = District::new(entry.name.as_str())?;
            if only.is_empty() || only.iter().any(|name| name.trim() == district.as_str()) {
                districts.push((district, entry.capacity));
            }
        }

        for name in only {
            if !self.districts.iter().any(|d| d.name == name.trim()) {
                return Err(DomainError::configuration(format!(
                    "district '{}' is not configured for training",
                    name
                )));
            }
        }

        let plan = TrainingPlan {
            districts,
            start,
            end,
            workers: self.workers,
            fetch_concurrency: self.fetch_concurrency,
        };
        plan.validate()?;

        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.store.dir, PathBuf::from("artifacts"));
        assert_eq!(config.provider.model, "gemini-1.5-flash");
        assert_eq!(config.training.districts.len(), 5);
        assert_eq!(config.training.lookback_days, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_capacities() {
        let config = TrainingConfig::default();
        let kolkata = config.districts.iter().find(|d| d.name == "Kolkata").unwrap();
        let delhi = config.districts.iter().find(|d| d.name == "Delhi").unwrap();

        assert_eq!(kolkata.capacity, 2000.0);
        assert_eq!(delhi.capacity, 7000.0);
    }

    #[test]
    fn test_api_key_fallback() {
        let mut provider = ProviderConfig::default();
        provider.resolve_api_key(Some("from-env".into()));
        assert_eq!(provider.api_key.as_deref(), Some("from-env"));

        let mut provider = ProviderConfig {
            api_key: Some("configured".into()),
            ..ProviderConfig::default()
        };
        provider.resolve_api_key(Some("from-env".into()));
        assert_eq!(provider.api_key.as_deref(), Some("configured"));

        let mut provider = ProviderConfig {
            api_key: Some("   ".into()),
            ..ProviderConfig::default()
        };
        provider.resolve_api_key(None);
        assert!(provider.api_key.is_none());
    }

    #[test]
    fn test_plan_defaults_to_lookback_window() {
        let plan = TrainingConfig::default()
            .plan(None, None, &[], date("2025-04-30"))
            .unwrap();

        assert_eq!(plan.end, date("2025-04-30"));
        assert_eq!(plan.start, date("2025-03-31"));
        assert_eq!(plan.districts.len(), 5);
        assert_eq!(plan.dates().len(), 31);
    }

    #[test]
    fn test_plan_overrides_and_filter() {
        let plan = TrainingConfig::default()
            .plan(
                Some(date("2025-01-01")),
                Some(date("2025-01-10")),
                &["Mumbai".to_string()],
                date("2025-04-30"),
            )
            .unwrap();

        assert_eq!(plan.start, date("2025-01-01"));
        assert_eq!(plan.end, date("2025-01-10"));
        assert_eq!(plan.districts.len(), 1);
        assert_eq!(plan.districts[0].0.as_str(), "Mumbai");
        assert_eq!(plan.districts[0].1, 5000.0);
    }

    #[test]
    fn test_plan_rejects_unknown_district() {
        let result = TrainingConfig::default().plan(
            None,
            None,
            &["Atlantis".to_string()],
            date("2025-04-30"),
        );
        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }

    #[test]
    fn test_plan_rejects_reversed_range() {
        let result = TrainingConfig::default().plan(
            Some(date("2025-02-01")),
            Some(date("2025-01-01")),
            &[],
            date("2025-04-30"),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_failures() {
        let mut config = TrainingConfig::default();
        config.districts[0].capacity = -1.0;
        assert!(config.validate().is_err());

        let mut config = TrainingConfig::default();
        config.districts.push(config.districts[0].clone());
        assert!(config.validate().is_err());

        let config = TrainingConfig {
            districts: Vec::new(),
            ..TrainingConfig::default()
        };
        assert!(config.validate().is_err());

        let config = TrainingConfig {
            workers: 0,
            ..TrainingConfig::default()
        };
        assert!(config.validate().is_err());

        let mut app = AppConfig::default();
        app.provider.url_template = "https://example.com/static".into();
        assert!(app.validate().is_err());
    }

    #[test]
    fn test_deserialize_partial_training_section() {
        let config: TrainingConfig = serde_json::from_str(
            r#"{"districts": [{"name": "Pune", "capacity": 1500}], "start": "2025-01-01"}"#,
        )
        .unwrap();

        assert_eq!(config.districts.len(), 1);
        assert_eq!(config.start, Some(date("2025-01-01")));
        assert_eq!(config.workers, 4);
    }
}
