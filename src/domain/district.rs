//! District identifier

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

/// District identifier, the key of every per-district mapping
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct District(String);

impl District {
    /// Create a district with validation. Surrounding whitespace is dropped.
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        let trimmed = name.trim();

        if trimmed.is_empty() {
            return Err(DomainError::validation("District cannot be empty"));
        }

        if trimmed.len() > 128 {
            return Err(DomainError::validation(
                "District cannot exceed 128 characters",
            ));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for District {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for District {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_district() {
        let district = District::new("Kolkata").unwrap();
        assert_eq!(district.as_str(), "Kolkata");
    }

    #[test]
    fn test_district_is_trimmed() {
        let district = District::new("  Mumbai ").unwrap();
        assert_eq!(district.as_str(), "Mumbai");
    }

    #[test]
    fn test_empty_district_rejected() {
        assert!(District::new("").is_err());
        assert!(District::new("   ").is_err());
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let district = District::new("Delhi").unwrap();
        assert_eq!(serde_json::to_string(&district).unwrap(), "\"Delhi\"");
    }
}
