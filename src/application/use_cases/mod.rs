mod import_geometries;
mod import_preflight;
mod relay_prompt;

pub use import_geometries::*;
pub use import_preflight::*;
pub use relay_prompt::*;
