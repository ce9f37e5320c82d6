use sea_orm::{Condition, TransactionTrait};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use sunrise_store::catalog::{categories, seed};
use sunrise_store::config::Config;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Failed to populate categories: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let db = sunrise_store::connect(&Config::database_url_from_env(), 1).await?;
    let txn = db.begin().await?;
    let report = seed::populate_categories(&txn).await?;
    txn.commit().await?;

    let rule = "=".repeat(50);
    println!("\n{rule}\nCategory Tree Created:\n{rule}");
    let tree = categories::list_tree(&db, Condition::all()).await?;
    for line in seed::outline(&tree) {
        println!("{line}");
    }
    println!("\nSuccessfully populated categories!");
    println!("Total categories created: {}", report.created);
    Ok(())
}
