use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::entities::{city::City, media::Media};

/// Table name mapped to its ordered list of field records.
pub type BackupDocument = BTreeMap<String, Vec<serde_json::Value>>;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackupTable {
    #[display("cities")]
    Cities,
    #[display("media")]
    Media,
}

impl BackupTable {
    /// Load order: parents before children.
    pub const LOAD_ORDER: [BackupTable; 2] = [BackupTable::Cities, BackupTable::Media];

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "cities" => Some(BackupTable::Cities),
            "media" => Some(BackupTable::Media),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BackupTable::Cities => "cities",
            BackupTable::Media => "media",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportMode {
    /// Clear every supplied table, then reload it.
    #[default]
    Replace,
    /// Leave the target alone when it already holds media.
    IfEmpty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityRecord {
    pub id: i64,
    pub name: String,
    pub state: String,
    pub country: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRecord {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub file_ref: String,
    pub city_id: i64,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default = "Utc::now")]
    pub uploaded_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl From<City> for CityRecord {
    fn from(city: City) -> Self {
        CityRecord {
            id: city.id,
            name: city.name,
            state: city.state,
            country: city.country,
            active: city.active,
            created_at: city.created_at,
            updated_at: city.updated_at,
        }
    }
}

impl From<CityRecord> for City {
    fn from(record: CityRecord) -> Self {
        City {
            id: record.id,
            name: record.name,
            state: record.state,
            country: record.country,
            active: record.active,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

impl From<Media> for MediaRecord {
    fn from(media: Media) -> Self {
        MediaRecord {
            id: media.id,
            title: media.title,
            description: media.description,
            file_ref: media.file_ref,
            city_id: media.city_id,
            active: media.active,
            uploaded_at: media.uploaded_at,
            updated_at: media.updated_at,
        }
    }
}

impl From<MediaRecord> for Media {
    fn from(record: MediaRecord) -> Self {
        Media {
            id: record.id,
            title: record.title,
            description: record.description,
            file_ref: record.file_ref,
            city_id: record.city_id,
            active: record.active,
            uploaded_at: record.uploaded_at,
            updated_at: record.updated_at,
        }
    }
}

// ───── Reports ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableImport {
    pub table: String,
    pub cleared: u64,
    pub inserted: u64,
    pub failed: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ImportReport {
    /// Set when an `IfEmpty` import found existing media and did nothing.
    pub skipped_existing: Option<i64>,
    pub tables: Vec<TableImport>,
    pub skipped_tables: Vec<String>,
}

impl ImportReport {
    pub fn inserted(&self) -> u64 {
        self.tables.iter().map(|t| t.inserted).sum()
    }

    pub fn failed(&self) -> u64 {
        self.tables.iter().map(|t| t.failed).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SyncSummary {
    pub uploaded: u64,
    pub skipped: u64,
    pub failed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_names_are_case_insensitive() {
        assert_eq!(BackupTable::from_name(" Cities "), Some(BackupTable::Cities));
        assert_eq!(BackupTable::from_name("MEDIA"), Some(BackupTable::Media));
        assert_eq!(BackupTable::from_name("auth_user"), None);
    }

    #[test]
    fn record_defaults_fill_missing_flags() {
        let record: CityRecord = serde_json::from_value(serde_json::json!({
            "id": 3,
            "name": "Braga",
            "state": "Norte",
            "country": "Portugal"
        }))
        .unwrap();

        assert!(record.active);
        assert_eq!(record.id, 3);
    }
}
