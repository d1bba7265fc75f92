use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::DomainError;

/// Checks run before an import touches the store.
///
/// A shapefile is a set of sibling files; the geometry file alone is not
/// enough, the `.dbf` attribute table carries the identifiers.
pub struct ImportPreflight {
    shapefile: PathBuf,
    database: Option<PathBuf>,
}

impl ImportPreflight {
    pub fn new(shapefile: impl Into<PathBuf>) -> Self {
        Self {
            shapefile: shapefile.into(),
            database: None,
        }
    }

    /// Also require an existing database file. The import updates rows, it
    /// never creates a database.
    pub fn with_database(mut self, database: impl Into<PathBuf>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn run(&self) -> Result<(), DomainError> {
        if !self.shapefile.is_file() {
            return Err(DomainError::input_missing(format!(
                "File not found: {}",
                self.shapefile.display()
            )));
        }

        let table = attribute_table_path(&self.shapefile);
        if !table.is_file() {
            return Err(DomainError::environment_missing(format!(
                "Missing attribute table {} (required next to {})",
                table.display(),
                self.shapefile.display()
            )));
        }

        if let Some(database) = &self.database {
            if !database.is_file() {
                return Err(DomainError::environment_missing(format!(
                    "Database not found: {}",
                    database.display()
                )));
            }
        }

        debug!("Preflight passed for {}", self.shapefile.display());
        Ok(())
    }
}

pub fn attribute_table_path(shapefile: &Path) -> PathBuf {
    shapefile.with_extension("dbf")
}
