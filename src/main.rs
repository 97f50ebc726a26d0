// src/main.rs
// =============================================================================
// This is the entry point of the follow-graph CLI.
//
// What happens here:
// 1. Set up logging (tracing, filtered by RUST_LOG)
// 2. Parse command-line arguments using clap
// 3. Load configuration from the environment / .env
// 4. Dispatch to the subcommand handler
// 5. Exit with proper code (0 = success, 1 = nothing crawled / not found,
//    2 = error)
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use follow_graph::config::AppConfig;
use follow_graph::crawl::{CrawlConfig, CrawlReport, Crawler};
use follow_graph::fetch::HttpFetcher;
use follow_graph::model::IdentityKey;
use follow_graph::store::{MemorySink, PersistenceSink, SqliteStore};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("follow_graph=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            error!("follow-graph failed: {e:#}");
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    let config = AppConfig::from_env().context("failed to load configuration")?;

    match cli.command {
        Commands::Crawl { handle, depth, workers, db, dry_run, json } => {
            let db_path = db.unwrap_or_else(|| config.database_path.clone());
            let sink: Arc<dyn PersistenceSink> = if dry_run {
                Arc::new(MemorySink::new())
            } else {
                Arc::new(open_store(&db_path)?)
            };
            let crawl_config = CrawlConfig {
                max_depth: depth,
                workers,
                frontier_capacity: config.frontier_capacity,
                result_capacity: config.result_capacity,
            };
            handle_crawl(&config, crawl_config, sink, &handle, json).await
        }
        Commands::Show { handle, db, json } => {
            let db_path = db.unwrap_or_else(|| config.database_path.clone());
            handle_show(&db_path, &handle, json).await
        }
    }
}

fn open_store(path: &Path) -> Result<SqliteStore> {
    SqliteStore::open(path).with_context(|| format!("failed to open database {}", path.display()))
}

// Handles the 'crawl' subcommand
async fn handle_crawl(
    config: &AppConfig,
    crawl_config: CrawlConfig,
    sink: Arc<dyn PersistenceSink>,
    handle: &str,
    json: bool,
) -> Result<i32> {
    let fetcher = Arc::new(HttpFetcher::new(&config.base_url, config.http_timeout)?);
    info!(base_url = %config.base_url, "using page fetcher");

    let crawler = Crawler::new(crawl_config, fetcher, sink);
    let report = crawler.run(IdentityKey::from(handle)).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    // Exit code 1 = the root itself could not be crawled
    Ok(if report.root_failed() { 1 } else { 0 })
}

// Handles the 'show' subcommand
async fn handle_show(db_path: &Path, handle: &str, json: bool) -> Result<i32> {
    let store = open_store(db_path)?;
    let key = IdentityKey::from(handle);

    let Some(person) = store.person_by_handle(&key).await? else {
        eprintln!("No person stored for handle '{}'", handle);
        return Ok(1);
    };
    let follows = store.follows_of(person.id).await?;

    if json {
        let output = serde_json::json!({ "person": person, "follows": follows });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(0);
    }

    println!("{:<14} {}", "HANDLE", person.handle);
    println!("{:<14} {}", "ID", person.id);
    println!("{:<14} {}", "NAME", person.name);
    println!("{:<14} {}", "IMAGE", person.image_url);
    println!("{:<14} {}", "VERIFIED", if person.verified { "yes" } else { "no" });
    println!("{:<14} {}", "PLAN", person.plan.as_str());
    println!("{:<14} {}", "TRACKS", person.track_count);
    println!("{:<14} {}", "FOLLOWS", follows.len());
    for followee in &follows {
        println!("   {}", followee);
    }
    Ok(0)
}

// Prints the crawl report as a human-readable table
fn print_report(report: &CrawlReport) {
    println!("{:<20} {:>10}", "CRAWL", report.root);
    println!("{}", "=".repeat(31));
    let rows = [
        ("max depth", report.max_depth),
        ("workers", report.workers),
        ("admitted", report.admitted),
        ("fetched", report.fetched),
        ("persisted", report.persisted),
        ("explored", report.explored),
        ("edges recorded", report.edges_recorded),
        ("fetch failures", report.fetch_failures),
        ("persist failures", report.persist_failures),
    ];
    for (label, value) in rows {
        println!("{:<20} {:>10}", label, value);
    }
    println!("{:<20} {:>8}ms", "elapsed", report.elapsed_ms);
}
