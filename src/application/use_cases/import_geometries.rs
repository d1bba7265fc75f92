use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use crate::application::{GeometrySource, GeometryStore};
use crate::domain::{DomainError, ImportSummary};

/// Use case copying every geometry of a source file into the store.
///
/// Rows are read up front, then written one at a time in file order. Each
/// update is awaited before the next one starts; the first failure aborts
/// the rest of the run.
pub struct ImportGeometriesUseCase {
    source: Arc<dyn GeometrySource>,
    store: Arc<dyn GeometryStore>,
}

impl ImportGeometriesUseCase {
    pub fn new(source: Arc<dyn GeometrySource>, store: Arc<dyn GeometryStore>) -> Self {
        Self { source, store }
    }

    pub async fn execute(&self) -> Result<ImportSummary, DomainError> {
        info!("Reading geometries from {}", self.source.describe());
        let records = self.source.read_all()?;
        info!("Loaded {} rows", records.len());

        let mut summary = ImportSummary {
            rows_read: records.len() as u64,
            ..ImportSummary::default()
        };

        let progress_bar = ProgressBar::new(summary.rows_read);
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .map_err(|e| DomainError::internal(format!("Invalid progress bar template: {}", e)))?
                .progress_chars("#>-"),
        );

        info!("Updating geometries...");
        for record in records {
            progress_bar.set_message(format!("id {}", record.id()));
            if let Err(e) = self.store.update_geometry(record.id(), record.wkt()).await {
                progress_bar.abandon_with_message(format!("failed at id {}", record.id()));
                return Err(e);
            }
            debug!(
                "Updated id {} ({})",
                record.id(),
                if record.has_geometry() { "geometry" } else { "null" }
            );

            summary.rows_updated += 1;
            if !record.has_geometry() {
                summary.null_geometries += 1;
            }
            progress_bar.inc(1);
        }
        progress_bar.finish_with_message("done");

        info!(
            "Geometry update complete: {} rows ({} null)",
            summary.rows_updated, summary.null_geometries
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use super::*;
    use crate::domain::GeometryRecord;

    struct FixedSource(Vec<GeometryRecord>);

    impl GeometrySource for FixedSource {
        fn describe(&self) -> String {
            "fixture".to_string()
        }

        fn read_all(&self) -> Result<Vec<GeometryRecord>, DomainError> {
            Ok(self.0.clone())
        }
    }

    #[derive(Default)]
    struct RecordingStore {
        calls: Mutex<Vec<(i64, Option<String>)>>,
        reject_id: Option<i64>,
    }

    #[async_trait]
    impl GeometryStore for RecordingStore {
        async fn update_geometry(&self, id: i64, wkt: Option<&str>) -> Result<(), DomainError> {
            self.calls.lock().await.push((id, wkt.map(str::to_string)));
            if self.reject_id == Some(id) {
                return Err(DomainError::not_found(format!("record {}", id)));
            }
            Ok(())
        }
    }

    fn square(id: i64) -> GeometryRecord {
        GeometryRecord::new(id, Some(format!("POLYGON(({id} 0,{id} 1,1 1,{id} 0))")))
    }

    #[tokio::test]
    async fn issues_one_update_per_row_in_file_order() {
        let source = Arc::new(FixedSource(vec![
            square(3),
            GeometryRecord::new(1, None),
            square(2),
        ]));
        let store = Arc::new(RecordingStore::default());
        let use_case = ImportGeometriesUseCase::new(source, store.clone());

        let summary = use_case.execute().await.unwrap();

        let calls = store.calls.lock().await;
        assert_eq!(
            *calls,
            vec![
                (3, Some("POLYGON((3 0,3 1,1 1,3 0))".to_string())),
                (1, None),
                (2, Some("POLYGON((2 0,2 1,1 1,2 0))".to_string())),
            ]
        );
        assert_eq!(
            summary,
            ImportSummary {
                rows_read: 3,
                rows_updated: 3,
                null_geometries: 1,
            }
        );
    }

    #[tokio::test]
    async fn failed_update_stops_remaining_rows() {
        let source = Arc::new(FixedSource(vec![square(1), square(2), square(3)]));
        let store = Arc::new(RecordingStore {
            reject_id: Some(2),
            ..RecordingStore::default()
        });
        let use_case = ImportGeometriesUseCase::new(source, store.clone());

        let err = use_case.execute().await.unwrap_err();

        assert!(err.is_not_found());
        let ids: Vec<i64> = store.calls.lock().await.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn empty_source_updates_nothing() {
        let source = Arc::new(FixedSource(Vec::new()));
        let store = Arc::new(RecordingStore::default());
        let use_case = ImportGeometriesUseCase::new(source, store.clone());

        let summary = use_case.execute().await.unwrap();

        assert_eq!(summary, ImportSummary::default());
        assert!(store.calls.lock().await.is_empty());
    }
}
