use std::path::PathBuf;

use clap::Subcommand;

use crate::connector::{DEFAULT_ID_COLUMN, DEFAULT_TABLE};

/// Environment fallback for `import-geom --database`.
pub const DATABASE_VAR: &str = "GEOCHAT_DATABASE";
const DATABASE_FILE: &str = "geochat.duckdb";

#[derive(Subcommand)]
pub enum Commands {
    /// Read a prompt from stdin and stream the model's answer to stdout
    Ask {
        /// Model name (overrides DEEPSEEK_MODEL)
        #[arg(long)]
        model: Option<String>,

        /// API base URL (overrides DEEPSEEK_BASE_URL)
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Write shapefile geometries into the store as WKT, keyed by id
    ImportGeom {
        #[arg(short, long, default_value = "thai_tambons.shp")]
        shapefile: PathBuf,

        /// DuckDB file to update (defaults to $GEOCHAT_DATABASE, then <data-dir>/geochat.duckdb)
        #[arg(long)]
        database: Option<PathBuf>,

        #[arg(short, long, default_value = DEFAULT_TABLE)]
        table: String,

        /// Attribute column holding the integer key
        #[arg(long, default_value = DEFAULT_ID_COLUMN)]
        id_column: String,

        /// Read and convert every row but record updates in memory only
        #[arg(long)]
        dry_run: bool,
    },
}

pub fn resolve_database(explicit: Option<PathBuf>, data_dir: &str) -> PathBuf {
    explicit
        .or_else(|| std::env::var_os(DATABASE_VAR).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(expand_tilde(data_dir)).join(DATABASE_FILE))
}

pub fn expand_tilde(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            if path == "~" {
                return home.to_string_lossy().to_string();
            }
            return path.replacen("~", &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}
