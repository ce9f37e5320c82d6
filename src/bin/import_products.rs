use clap::{Parser, ValueEnum};
use std::{path::PathBuf, process::ExitCode};
use tracing_subscriber::EnvFilter;

use sunrise_store::catalog::import::{self, ImportFormat, RowOutcome};
use sunrise_store::config::Config;

/// Import products from a CSV or Excel file.
#[derive(Parser, Debug)]
#[command(name = "import_products", version)]
struct Cli {
    /// Path to the file with a header row
    file_path: PathBuf,

    #[arg(long, value_enum, default_value_t = Format::Csv)]
    format: Format,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Csv,
    Excel,
}

impl From<Format> for ImportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Csv => ImportFormat::Csv,
            Format::Excel => ImportFormat::Excel,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error importing products: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = tokio::fs::read(&cli.file_path).await?;
    let db = sunrise_store::connect(&Config::database_url_from_env(), 1).await?;

    let report = import::import_file(&db, &bytes, cli.format.into()).await?;
    for row in &report.rows {
        match &row.result {
            Ok(RowOutcome::Created(product)) => {
                println!("Created product: {} ({})", product.name, product.sku)
            }
            Ok(RowOutcome::Skipped(product)) => {
                println!("Product already exists: {}", product.name)
            }
            Err(err) => println!("Line {}: {}", row.line, err),
        }
    }
    for message in report.messages() {
        println!("{message}");
    }
    Ok(())
}
