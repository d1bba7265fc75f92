mod duckdb_geometry_store;
mod in_memory_geometry_store;
mod openai_compatible_client;
mod shapefile_geometry_source;
mod sse_decoder;

pub use duckdb_geometry_store::*;
pub use in_memory_geometry_store::*;
pub use openai_compatible_client::*;
pub use shapefile_geometry_source::*;
pub use sse_decoder::*;
