mod geometry_record;
mod prompt;

pub use geometry_record::*;
pub use prompt::*;
