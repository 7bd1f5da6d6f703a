use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::entities::backup::{
    BackupDocument, BackupTable, CityRecord, ImportMode, ImportReport, MediaRecord, TableImport,
};
use crate::errors::AppError;
use crate::repositories::{backup::BackupRepository, media::MediaRepository};

/// Loads and dumps whole-table JSON backups.
pub struct BackupImporter<R>
where
    R: BackupRepository + MediaRepository,
{
    pub repo: R,
}

impl<R> BackupImporter<R>
where
    R: BackupRepository + MediaRepository,
{
    pub fn new(repo: R) -> Self {
        BackupImporter { repo }
    }

    /// Per-record failures are counted and skipped. Only repository failures
    /// outside a single record (clearing, counting, sequence sync) abort.
    pub async fn import(&self, document: BackupDocument, mode: ImportMode) -> Result<ImportReport, AppError> {
        let mut report = ImportReport::default();

        if mode == ImportMode::IfEmpty {
            let existing = self.repo.count_media().await?;
            if existing > 0 {
                tracing::info!(existing, "Target already holds media, import skipped");
                report.skipped_existing = Some(existing);
                return Ok(report);
            }
        }

        for name in document.keys() {
            if BackupTable::from_name(name).is_none() {
                tracing::warn!(table = %name, "Unknown table in backup, skipped");
                report.skipped_tables.push(name.clone());
            }
        }

        for table in BackupTable::LOAD_ORDER {
            let records: Vec<&Value> = document
                .iter()
                .filter(|(name, _)| BackupTable::from_name(name) == Some(table))
                .flat_map(|(_, records)| records.iter())
                .collect();

            if records.is_empty() {
                continue;
            }

            report.tables.push(self.import_table(table, &records, mode).await?);
        }

        tracing::info!(
            inserted = report.inserted(),
            failed = report.failed(),
            skipped_tables = report.skipped_tables.len(),
            "Import finished"
        );
        Ok(report)
    }

    async fn import_table(&self, table: BackupTable, records: &[&Value], mode: ImportMode) -> Result<TableImport, AppError> {
        let cleared = match mode {
            ImportMode::Replace => self.repo.clear_table(table).await?,
            ImportMode::IfEmpty => 0,
        };

        let mut summary = TableImport {
            table: table.name().to_string(),
            cleared,
            inserted: 0,
            failed: 0,
        };

        for (index, value) in records.iter().enumerate() {
            match self.insert_record(table, value).await {
                Ok(()) => summary.inserted += 1,
                Err(e) => {
                    tracing::warn!(table = %table, index, "Record not imported: {}", e);
                    summary.failed += 1;
                }
            }
        }

        if summary.inserted > 0 {
            self.repo.sync_id_sequence(table).await?;
        }

        tracing::info!(
            table = %table,
            cleared = summary.cleared,
            inserted = summary.inserted,
            failed = summary.failed,
            "Table imported"
        );
        Ok(summary)
    }

    async fn insert_record(&self, table: BackupTable, value: &Value) -> Result<(), AppError> {
        match table {
            BackupTable::Cities => {
                let record: CityRecord = decode(value)?;
                self.repo.insert_city_record(&record).await
            }
            BackupTable::Media => {
                let record: MediaRecord = decode(value)?;
                self.repo.insert_media_record(&record).await
            }
        }
    }

    /// Dumps every city and media row in the format [`BackupImporter::import`] reads.
    pub async fn export(&self) -> Result<BackupDocument, AppError> {
        let mut document = BackupDocument::new();

        let cities = self.repo.export_cities().await?;
        document.insert(BackupTable::Cities.name().to_string(), to_values(cities)?);

        let media = self.repo.export_media().await?;
        document.insert(BackupTable::Media.name().to_string(), to_values(media)?);

        Ok(document)
    }
}

fn decode<T: DeserializeOwned>(value: &Value) -> Result<T, AppError> {
    serde_json::from_value(value.clone()).map_err(|e| AppError::InvalidInput(format!("Malformed record: {}", e)))
}

fn to_values<T: serde::Serialize>(records: Vec<T>) -> Result<Vec<Value>, AppError> {
    records
        .into_iter()
        .map(|r| serde_json::to_value(r).map_err(|e| AppError::InternalError(e.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::MediaQuery;
    use crate::repositories::{city::CityRepository, memory::InMemoryGalleryRepo};
    use serde_json::json;

    fn backup() -> BackupDocument {
        serde_json::from_value(json!({
            "media": [
                { "id": 10, "title": "Ribeira", "description": "River front", "file_ref": "ribeira.jpg", "city_id": 1 },
                { "id": 11, "title": "Orphan", "description": "No city", "file_ref": "orphan.jpg", "city_id": 77 },
                { "title": "Broken" }
            ],
            "cities": [
                { "id": 1, "name": "Porto", "state": "Norte", "country": "Portugal" },
                { "id": 2, "name": "Braga", "state": "Norte", "country": "Portugal", "active": false }
            ],
            "auth_user": [ { "id": 1 } ]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn import_loads_cities_before_media_and_counts_failures() {
        let importer = BackupImporter::new(InMemoryGalleryRepo::new());

        let report = importer.import(backup(), ImportMode::Replace).await.unwrap();

        assert_eq!(report.skipped_tables, ["auth_user"]);
        assert_eq!(report.tables[0].table, "cities");
        assert_eq!(report.tables[0].inserted, 2);
        assert_eq!(report.tables[1].inserted, 1);
        assert_eq!(report.tables[1].failed, 2);

        let media = importer.repo.find_media(&MediaQuery::active()).await.unwrap();
        assert_eq!(media[0].media.id, 10);
        assert_eq!(media[0].city_name, "Porto");
    }

    #[tokio::test]
    async fn ids_continue_after_imported_rows() {
        let importer = BackupImporter::new(InMemoryGalleryRepo::new());
        importer.import(backup(), ImportMode::Replace).await.unwrap();

        let city = importer
            .repo
            .create_city(&crate::entities::city::NewCityRequest::new("Faro", "Algarve", "Portugal").prepare_for_insert())
            .await
            .unwrap();

        assert_eq!(city.id, 3);
    }

    #[tokio::test]
    async fn if_empty_leaves_populated_target_alone() {
        let importer = BackupImporter::new(InMemoryGalleryRepo::new());
        importer.import(backup(), ImportMode::Replace).await.unwrap();

        let report = importer.import(backup(), ImportMode::IfEmpty).await.unwrap();

        assert_eq!(report.skipped_existing, Some(1));
        assert!(report.tables.is_empty());
    }

    #[tokio::test]
    async fn replace_twice_gives_same_state() {
        let importer = BackupImporter::new(InMemoryGalleryRepo::new());
        importer.import(backup(), ImportMode::Replace).await.unwrap();

        let report = importer.import(backup(), ImportMode::Replace).await.unwrap();

        assert_eq!(report.tables[0].cleared, 2);
        assert_eq!(importer.repo.count_media().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn export_reads_back_in() {
        let source = BackupImporter::new(InMemoryGalleryRepo::new());
        source.import(backup(), ImportMode::Replace).await.unwrap();
        let document = source.export().await.unwrap();

        let target = BackupImporter::new(InMemoryGalleryRepo::new());
        let report = target.import(document, ImportMode::IfEmpty).await.unwrap();

        assert_eq!(report.inserted(), 3);
        assert_eq!(report.failed(), 0);
    }
}
