//! Quarry — repository ingestion pipeline for code search.
//!
//! One-shot binary: index a repository (local path or clone URL) against
//! the in-memory engine and print the summary, optionally running a query
//! over the fresh index.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use quarry::indexer::Indexer;
use quarry::logging::init_tracing;
use quarry::repo::RepoManager;
use quarry::search::{MemoryEngine, SearchEngine, SearchQuery};
use quarry::{Config, Result};

/// Quarry — repository ingestion pipeline for code search
#[derive(Parser, Debug)]
#[command(name = "quarry")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Repository to index: a local path or an http(s)/git clone URL
    source: String,

    /// Name for the repository (derived from the source when omitted)
    #[arg(short, long)]
    name: Option<String>,

    /// Directory for managed clones and the location store
    #[arg(short, long, env = "QUARRY_REPO_DIR", default_value = "./repos")]
    repo_dir: std::path::PathBuf,

    /// Maximum file size in bytes
    #[arg(long, env = "QUARRY_MAX_FILE_SIZE", default_value = "1048576")]
    max_file_size: u64,

    /// Run this query against the fresh index and print the hits
    #[arg(short, long)]
    query: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "QUARRY_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, env = "QUARRY_LOG_JSON")]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.log_json);
    tracing::info!("Quarry v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::new()
        .with_repo_dir(cli.repo_dir)
        .with_max_file_size(cli.max_file_size)
        .with_log_level(cli.log_level);
    config.validate()?;

    let manager = Arc::new(RepoManager::new(config.repo_dir.clone())?);
    let engine = Arc::new(MemoryEngine::new());
    let indexer = Indexer::new(config, manager, Arc::clone(&engine) as Arc<dyn SearchEngine>)?;

    // Ctrl-c cancels the pass between files.
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling");
            signal_token.cancel();
        }
    });

    let repo = indexer
        .index_repository(&cancel, &cli.source, cli.name.as_deref())
        .await?;

    println!("Indexed repository '{}' ({})", repo.name, repo.id);
    println!("  files:     {}", repo.file_count);
    println!("  lines:     {}", repo.total_lines);
    println!("  languages: {}", repo.languages.join(", "));
    if let Some(branch) = &repo.branch {
        println!("  branch:    {branch}");
    }
    if let Some(commit) = &repo.last_commit {
        println!("  commit:    {commit}");
    }

    if let Some(query) = cli.query {
        let results = engine
            .search(&SearchQuery {
                query,
                max_results: Some(10),
                ..Default::default()
            })
            .await?;

        println!("\n{} result(s):", results.len());
        for result in results {
            println!(
                "  [{:<8}] {}:{}-{} {}",
                result.kind, result.file_path, result.start_line, result.end_line, result.name
            );
        }
    }

    Ok(())
}
