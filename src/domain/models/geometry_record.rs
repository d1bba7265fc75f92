/// A row destined for the store: an integer key and the WKT of its shape.
///
/// `wkt` is `None` for null shapes so the store receives `NULL` rather than
/// an empty or malformed string.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryRecord {
    id: i64,
    wkt: Option<String>,
}

impl GeometryRecord {
    pub fn new(id: i64, wkt: Option<String>) -> Self {
        Self { id, wkt }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn wkt(&self) -> Option<&str> {
        self.wkt.as_deref()
    }

    pub fn has_geometry(&self) -> bool {
        self.wkt.is_some()
    }
}

/// Outcome of an import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub rows_read: u64,
    pub rows_updated: u64,
    pub null_geometries: u64,
}
