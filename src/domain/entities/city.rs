use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::entities::media::MediaResponse;

const MAX_NAME_LENGTH: u64 = 100;
const MAX_STATE_LENGTH: u64 = 50;
const MAX_COUNTRY_LENGTH: u64 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct City {
    pub id: i64,
    pub name: String,
    pub state: String,
    pub country: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl City {
    /// Case-insensitive comparison on the (name, state, country) identity.
    pub fn has_identity(&self, name: &str, state: &str, country: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
            && self.state.to_lowercase() == state.to_lowercase()
            && self.country.to_lowercase() == country.to_lowercase()
    }

    pub fn label(&self) -> String {
        format!("{}, {} - {}", self.name, self.state, self.country)
    }
}

#[derive(Debug)]
pub struct CityInsert {
    pub name: String,
    pub state: String,
    pub country: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewCityRequest {
    #[validate(length(min = 1, max = MAX_NAME_LENGTH, message = "Name must be between 1 and 100 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = MAX_STATE_LENGTH, message = "State must be between 1 and 50 characters"))]
    pub state: String,

    #[validate(length(min = 1, max = MAX_COUNTRY_LENGTH, message = "Country must be between 1 and 100 characters"))]
    pub country: String,
}

impl NewCityRequest {
    pub fn new(name: impl Into<String>, state: impl Into<String>, country: impl Into<String>) -> Self {
        NewCityRequest {
            name: name.into(),
            state: state.into(),
            country: country.into(),
        }
    }

    /// Strips surrounding whitespace from every field.
    pub fn normalized(self) -> Self {
        NewCityRequest {
            name: self.name.trim().to_string(),
            state: self.state.trim().to_string(),
            country: self.country.trim().to_string(),
        }
    }

    pub fn prepare_for_insert(&self) -> CityInsert {
        let now = Utc::now();
        CityInsert {
            name: self.name.clone(),
            state: self.state.clone(),
            country: self.country.clone(),
            active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

// ───── API Response Models ──────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct CityRegistration {
    pub city: City,
    pub created: bool,
    pub reactivated: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CityOverview {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub city: City,
    pub media_count: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CityListResponse {
    pub cities: Vec<CityOverview>,
    pub total: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CityCarousel {
    pub city: City,
    pub media: Vec<MediaResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_ignores_case() {
        let now = Utc::now();
        let city = City {
            id: 1,
            name: "Porto".into(),
            state: "Norte".into(),
            country: "Portugal".into(),
            active: true,
            created_at: now,
            updated_at: now,
        };

        assert!(city.has_identity("PORTO", "norte", "portugal"));
        assert!(!city.has_identity("Porto", "Lisboa", "Portugal"));
        assert_eq!(city.label(), "Porto, Norte - Portugal");
    }

    #[test]
    fn normalized_request_rejects_blank_fields() {
        let request = NewCityRequest::new("  ", "Norte", "Portugal").normalized();
        let errors = request.validate().unwrap_err();

        assert!(errors.field_errors().contains_key("name"));
    }
}
