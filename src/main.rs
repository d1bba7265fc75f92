use std::io::{Read, Write};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use geochat::cli::{resolve_database, Commands};
use geochat::{
    validate_identifier, DomainError, DuckdbGeometryStore, GeometryStore, ImportGeometriesUseCase,
    ImportPreflight, InMemoryGeometryStore, OpenAiCompatibleClient, Prompt, RelayConfig,
    RelayPromptUseCase, ShapefileGeometrySource,
};

#[derive(Parser)]
#[command(name = "geochat")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    #[arg(short, long, global = true, default_value = "~/.geochat")]
    data_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // `ask` owns stdout for the answer; keep its log output to warnings.
    let default_level = match (&cli.command, cli.verbose) {
        (_, true) => "debug",
        (Commands::Ask { .. }, false) => "warn",
        (_, false) => "info",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Err(e) = run(cli).await {
        if let Some(domain) = e.downcast_ref::<DomainError>() {
            if domain.is_usage_error() {
                println!("{}", domain);
                std::process::exit(1);
            }
        }
        return Err(e);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Ask { model, base_url } => {
            println!("Enter your prompt (Press Ctrl+D when finished):");
            std::io::stdout().flush()?;
            let mut input = String::new();
            std::io::stdin().lock().read_to_string(&mut input)?;

            // Reject empty input before configuration or network are touched.
            let prompt = Prompt::new(input)?;

            let mut config = RelayConfig::from_env()?;
            if let Some(model) = model {
                config = config.with_model(model);
            }
            if let Some(base_url) = base_url {
                config = config.with_base_url(base_url);
            }
            info!("Using model {} at {}", config.model, config.base_url);

            let use_case = RelayPromptUseCase::new(Arc::new(OpenAiCompatibleClient::new(config)));
            let mut stdout = std::io::stdout();
            use_case.execute(&prompt, &mut stdout).await?;
        }

        Commands::ImportGeom {
            shapefile,
            database,
            table,
            id_column,
            dry_run,
        } => {
            validate_identifier(&table)?;
            let database = resolve_database(database, &cli.data_dir);

            let mut preflight = ImportPreflight::new(&shapefile);
            if !dry_run {
                preflight = preflight.with_database(&database);
            }
            preflight.run()?;

            let source = Arc::new(ShapefileGeometrySource::open(&shapefile, &id_column)?);

            let store: Arc<dyn GeometryStore> = if dry_run {
                info!("Dry run: updates are recorded in memory only");
                Arc::new(InMemoryGeometryStore::new())
            } else {
                info!("Using DuckDB at {} (table {})", database.display(), table);
                Arc::new(DuckdbGeometryStore::open(&database, &table)?)
            };

            let summary = ImportGeometriesUseCase::new(source, store).execute().await?;
            println!(
                "Updated {} of {} rows ({} with null geometry){}",
                summary.rows_updated,
                summary.rows_read,
                summary.null_geometries,
                if dry_run { " [dry run]" } else { "" }
            );
        }
    }

    Ok(())
}
