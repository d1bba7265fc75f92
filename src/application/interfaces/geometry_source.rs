use crate::domain::{DomainError, GeometryRecord};

/// Reads every geometry row from an input file.
pub trait GeometrySource: Send + Sync {
    /// Human-readable location, used in log lines.
    fn describe(&self) -> String;

    /// Parse all rows up front, in file order.
    fn read_all(&self) -> Result<Vec<GeometryRecord>, DomainError>;
}
