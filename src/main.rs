use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use scent_compare::{
    config::{self, AppConfig, database},
    core::{
        batch, observer::TracingObserver, reconcile::process_staged_data, seller,
        staging::stage_parsed_data,
    },
    errors::Result,
    parsers::{ParserOptions, parser_for_path},
};
use sea_orm::DatabaseConnection;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "scent-compare", version, about = "Perfume price ingestion pipeline")]
struct Cli {
    /// Path to config.toml; defaults to ./config.toml when present
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create every table and index
    InitDb,
    /// Register or refresh the sellers listed in config.toml
    SeedSellers,
    /// Parse a seller sheet and stage it under a new batch id
    Ingest {
        /// Spreadsheet or CSV file to ingest
        #[arg(long)]
        file: PathBuf,
        /// Code of the seller the sheet belongs to
        #[arg(long)]
        seller_code: String,
    },
    /// Reconcile staged items into the production catalog
    Process {
        /// Only process this batch
        #[arg(long)]
        batch_id: Option<String>,
        /// Maximum number of staged items to process
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        limit: Option<u64>,
    },
    /// Make the failed items of a batch eligible for processing again
    Requeue {
        /// Batch to requeue
        #[arg(long)]
        batch_id: String,
    },
    /// Show staged record counts for a batch
    BatchStatus {
        /// Batch to inspect
        #[arg(long)]
        batch_id: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; DATABASE_URL may come from there
    dotenv().ok();

    let cli = Cli::parse();

    // 3. Load the application configuration
    let app_config = match &cli.config {
        Some(path) => config::load_config(path),
        None => config::load_default_config(),
    }
    .inspect_err(|e| error!("Critical error loading application configuration: {}", e))?;

    // 4. Open the database and make sure the schema exists
    let db = database::create_connection(&app_config.resolved_database_url())
        .await
        .inspect_err(|e| error!("Failed to open database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database schema is up to date."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    match cli.command {
        Command::InitDb => Ok(()),
        Command::SeedSellers => {
            let result = seller::seed_sellers(&db, &app_config.sellers).await?;
            println!(
                "Sellers seeded: {} created, {} updated.",
                result.created, result.updated
            );
            Ok(())
        }
        Command::Ingest { file, seller_code } => {
            ingest(&db, &app_config, &file, seller_code.trim()).await
        }
        Command::Process { batch_id, limit } => {
            let limit = limit.unwrap_or(app_config.ingestion.default_limit);
            let summary =
                process_staged_data(&db, batch_id.as_deref(), limit, &TracingObserver).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            if summary.processed_count + summary.failed_count >= limit {
                println!("Limit of {limit} reached; run `process` again to continue.");
            }
            Ok(())
        }
        Command::Requeue { batch_id } => {
            let count = batch::requeue_failed(&db, &batch_id).await?;
            println!("Requeued {count} failed item(s) in batch {batch_id}.");
            Ok(())
        }
        Command::BatchStatus { batch_id } => {
            let status = batch::batch_status(&db, &batch_id).await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
            Ok(())
        }
    }
}

async fn ingest(
    db: &DatabaseConnection,
    app_config: &AppConfig,
    file: &std::path::Path,
    seller_code: &str,
) -> Result<()> {
    if seller::get_seller_by_code(db, seller_code).await?.is_none() {
        warn!(
            seller_code,
            "Seller is not registered; its items will fail until it is seeded"
        );
    }

    let mut parser = parser_for_path(file, ParserOptions::from(&app_config.ingestion))?;
    let packets = parser
        .parse(file)
        .inspect_err(|e| error!("Failed to parse {}: {}", file.display(), e))?;
    for warning in parser.errors() {
        warn!(target: "ingestion", "{warning}");
    }

    let batch_id = uuid::Uuid::new_v4().to_string();
    let counts = stage_parsed_data(
        db,
        &packets,
        parser.source_identifier(),
        &batch_id,
        seller_code,
        &TracingObserver,
    )
    .await?;

    let parsed_prices: usize = packets.iter().map(|p| p.prices.len()).sum();
    if counts.items_staged < packets.len() || counts.prices_staged < parsed_prices {
        warn!(
            parsed_items = packets.len(),
            staged_items = counts.items_staged,
            parsed_prices,
            staged_prices = counts.prices_staged,
            "Fewer records were staged than parsed"
        );
    }

    println!(
        "Batch {batch_id}: staged {} item(s) and {} price(s) from {} ({} warning(s)).",
        counts.items_staged,
        counts.prices_staged,
        file.display(),
        parser.errors().len()
    );
    Ok(())
}
