mod completion_client;
mod geometry_source;
mod geometry_store;

pub use completion_client::*;
pub use geometry_source::*;
pub use geometry_store::*;
