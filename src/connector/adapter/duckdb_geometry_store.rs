use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use duckdb::{params, Connection};
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::GeometryStore;
use crate::domain::DomainError;

pub const DEFAULT_TABLE: &str = "tambons";

/// Writes geometries into `<table>.geom`, keyed by `<table>.id`.
pub struct DuckdbGeometryStore {
    conn: Arc<Mutex<Connection>>,
    update_sql: String,
}

impl DuckdbGeometryStore {
    /// Open an existing database file. The table must already exist.
    pub fn open(db_path: &Path, table: &str) -> Result<Self, DomainError> {
        if !db_path.is_file() {
            return Err(DomainError::environment_missing(format!(
                "Database not found: {}",
                db_path.display()
            )));
        }
        let conn = Connection::open(db_path)
            .map_err(|e| DomainError::storage(format!("Failed to open DuckDB database: {}", e)))?;
        Self::with_connection(Arc::new(Mutex::new(conn)), table)
    }

    /// Create a store over an existing shared connection, checking that
    /// `table` has the `id` and `geom` columns.
    pub fn with_connection(conn: Arc<Mutex<Connection>>, table: &str) -> Result<Self, DomainError> {
        validate_identifier(table)?;
        {
            let guard = conn.try_lock().map_err(|_| {
                DomainError::storage("DuckDB connection is busy during initialization")
            })?;
            guard
                .prepare(&format!("SELECT id, geom FROM {} LIMIT 0", table))
                .map_err(|e| {
                    DomainError::storage(format!(
                        "Table '{}' with columns (id, geom) is not available: {}",
                        table, e
                    ))
                })?;
        }
        debug!("DuckDB geometry table '{}' verified", table);

        Ok(Self {
            conn,
            update_sql: format!("UPDATE {} SET geom = ?1 WHERE id = ?2", table),
        })
    }

    /// Returns a clone of the shared connection Arc.
    pub fn shared_connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }
}

#[async_trait]
impl GeometryStore for DuckdbGeometryStore {
    async fn update_geometry(&self, id: i64, wkt: Option<&str>) -> Result<(), DomainError> {
        let conn = self.conn.lock().await;
        let affected = conn
            .execute(&self.update_sql, params![wkt, id])
            .map_err(|e| DomainError::storage(format!("Failed to update id {}: {}", id, e)))?;

        if affected == 0 {
            return Err(DomainError::not_found(format!("No record with id {}", id)));
        }
        Ok(())
    }
}

/// Table names are interpolated into SQL, so only plain identifiers pass.
pub fn validate_identifier(name: &str) -> Result<(), DomainError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(DomainError::invalid_input(format!(
            "Invalid table name: {:?}",
            name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_reject_sql_fragments() {
        assert!(validate_identifier("tambons").is_ok());
        assert!(validate_identifier("_geo_2024").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("1abc").is_err());
        assert!(validate_identifier("tambons; DROP TABLE x").is_err());
        assert!(validate_identifier("a.b").is_err());
    }

    #[test]
    fn missing_database_is_environment_missing() {
        let err = DuckdbGeometryStore::open(Path::new("/nonexistent/geo.duckdb"), "tambons")
            .err()
            .unwrap();
        assert!(matches!(err, DomainError::EnvironmentMissing(_)));
    }
}
