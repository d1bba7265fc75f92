//! # Connector Layer
//!
//! External integrations implementing application ports:
//! - Completion streaming (OpenAI-compatible HTTP + SSE)
//! - Geometry input (ESRI shapefile)
//! - Storage (DuckDB, in-memory for dry runs)

pub mod adapter;

pub use adapter::*;
