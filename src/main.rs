mod config;
mod db;
mod export;
mod fetch;
mod parser;
mod pipeline;
mod product;
mod reconcile;
mod report;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use db::{ProductStore, SqliteStore};
use fetch::{Fetcher, HttpTransport};
use pipeline::Pipeline;
use product::Category;
use report::{ConsoleReporter, Reporter};

#[derive(Parser)]
#[command(
    name = "catalog_scraper",
    about = "Refresh the network product catalog from vendor documentation pages"
)]
struct Cli {
    /// SQLite database (default: $CATALOG_DB, then data/catalog.sqlite)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Seconds to wait after each successful request (overrides the stored setting)
    #[arg(long, global = true)]
    delay: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the EOL listing and update status/EOL/EOS on MR, MX, MS and MV products
    Eol {
        /// Also write the scraped EOL map as JSON
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Scrape a single datasheet
    Scrape {
        /// Product category (mr, mx, ms, mv, ...)
        category: String,
        /// Model code, e.g. MR46
        model: String,
        /// Merge the result into the catalog
        #[arg(long)]
        save: bool,
        /// Also write the scraped record as JSON
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Scrape every MR datasheet linked from the MR index and update the catalog
    ScrapeMr,
    /// Scrape the ISE appliance comparison table
    Ise {
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Import products_<category>.json files from a directory
    Import { dir: PathBuf },
    /// Product counts per category and status
    Stats,
    /// List products in one category
    List { category: String },
    /// Print one stored product as JSON
    Show { id: String },
    /// Show or change stored settings
    Config {
        /// Seconds between requests (1-10)
        #[arg(long)]
        rate_limit: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let db_path = config::resolve_db_path(cli.db);
    let store = SqliteStore::open(&db_path)?;

    let flag_delay = cli.delay.map(config::check_rate_limit).transpose()?;
    let stored_delay = store
        .get_setting(config::RATE_LIMIT_KEY)?
        .and_then(|v| v.parse::<u64>().ok())
        .and_then(|secs| config::check_rate_limit(secs).ok());
    let delay = config::resolve_delay(flag_delay, stored_delay);

    let reporter: Arc<dyn Reporter> = Arc::new(ConsoleReporter::new());
    let transport = HttpTransport::new(config::REQUEST_TIMEOUT)?;
    let pipeline = Pipeline::new(Fetcher::new(transport, delay), reporter);

    let result = match cli.command {
        Commands::Eol { export } => {
            let updated = match export {
                Some(path) => {
                    let eol = pipeline.scrape_eol_table().await?;
                    export::write_json(&path, &eol)?;
                    println!("Exported {} EOL entries to {}", eol.len(), path.display());
                    pipeline.apply_eol_map(&store, &eol)?
                }
                None => pipeline.update_eol_data(&store).await?,
            };
            println!("Done: {} products updated.", updated);
            Ok(())
        }
        Commands::Scrape {
            category,
            model,
            save,
            export,
        } => {
            let category: Category = category.parse()?;
            let Some(record) = pipeline.scrape_one(category, &model).await? else {
                println!("No datasheet found for {}.", model);
                return Ok(());
            };
            println!("{}", serde_json::to_string_pretty(&record)?);
            if let Some(path) = export {
                export::write_json(&path, &record)?;
            }
            if save {
                reconcile::upsert(&store, category, &record)?;
                println!("Saved {} to {}.", record.product_id(), category);
            }
            Ok(())
        }
        Commands::ScrapeMr => {
            println!("Scraping MR datasheets ({}s between requests)...", delay.as_secs());
            let updated = pipeline.scrape_all_mr(&store).await?;
            println!("Done: {} MR products updated.", updated);
            Ok(())
        }
        Commands::Ise { export } => {
            let models = pipeline.scrape_ise_models().await?;
            println!("{}", serde_json::to_string_pretty(&models)?);
            if let Some(path) = export {
                export::write_json(&path, &models)?;
            }
            Ok(())
        }
        Commands::Import { dir } => {
            let n = db::import_catalog(&store, &dir)
                .with_context(|| format!("importing from {}", dir.display()))?;
            println!("Imported {} products into {}.", n, db_path.display());
            Ok(())
        }
        Commands::Stats => {
            let s = store.get_stats()?;
            println!("Total:     {}", s.total);
            for (category, n) in &s.by_category {
                println!("  {:<16} {}", category, n);
            }
            println!("By status:");
            for (status, n) in &s.by_status {
                println!("  {:<16} {}", status, n);
            }
            Ok(())
        }
        Commands::List { category } => {
            let category: Category = category.parse()?;
            let products = store.get_products_by_category(category)?;
            if products.is_empty() {
                println!("No {} products. Run 'import' or 'scrape-mr' first.", category);
                return Ok(());
            }

            println!(
                "{:>3} | {:<16} | {:<28} | {:<14} | {:<10}",
                "#", "Id", "Name", "Status", "EOS"
            );
            println!("{}", "-".repeat(82));
            for (i, p) in products.iter().enumerate() {
                println!(
                    "{:>3} | {:<16} | {:<28} | {:<14} | {:<10}",
                    i + 1,
                    truncate(&p.id, 16),
                    truncate(&p.name, 28),
                    p.status.map(|s| s.as_str()).unwrap_or("-"),
                    p.attr_str("eos_date").unwrap_or("-"),
                );
            }
            println!("\n{} products", products.len());
            Ok(())
        }
        Commands::Show { id } => {
            let id = id.trim().to_lowercase();
            match store.get_product_by_id(&id)? {
                Some(product) => println!("{}", serde_json::to_string_pretty(&product)?),
                None => bail!("no product with id {}", id),
            }
            Ok(())
        }
        Commands::Config { rate_limit } => {
            if let Some(secs) = rate_limit {
                let secs = config::check_rate_limit(secs)?;
                store.set_setting(config::RATE_LIMIT_KEY, &secs.to_string())?;
                pipeline.fetcher().set_delay(std::time::Duration::from_secs(secs));
                println!("Rate limit set to {}s.", secs);
            } else {
                println!("Database:   {}", db_path.display());
                println!("Rate limit: {}s", pipeline.fetcher().delay().as_secs());
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max - 3).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
