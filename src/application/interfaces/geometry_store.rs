use async_trait::async_trait;

use crate::domain::DomainError;

/// Persistence target for imported geometries.
#[async_trait]
pub trait GeometryStore: Send + Sync {
    /// Set the geometry of the record keyed by `id`.
    ///
    /// Returns `DomainError::NotFound` when no record has that key.
    async fn update_geometry(&self, id: i64, wkt: Option<&str>) -> Result<(), DomainError>;
}
