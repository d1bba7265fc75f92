use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::GeometryStore;
use crate::domain::{DomainError, GeometryRecord};

/// Accepts every id and remembers the updates in arrival order.
/// Backs `--dry-run`.
pub struct InMemoryGeometryStore {
    updates: Arc<Mutex<Vec<GeometryRecord>>>,
}

impl InMemoryGeometryStore {
    pub fn new() -> Self {
        Self {
            updates: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn updates(&self) -> Vec<GeometryRecord> {
        self.updates.lock().await.clone()
    }
}

impl Default for InMemoryGeometryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GeometryStore for InMemoryGeometryStore {
    async fn update_geometry(&self, id: i64, wkt: Option<&str>) -> Result<(), DomainError> {
        let mut updates = self.updates.lock().await;
        updates.push(GeometryRecord::new(id, wkt.map(str::to_string)));
        debug!("Recorded update #{} for id {}", updates.len(), id);
        Ok(())
    }
}
