// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two subcommands:
// - crawl: walk the follow graph from a root handle and store what we find
// - show:  print one stored person and who they follow
//
// Rust concepts:
// - Derive macros: clap generates the parser from the struct definitions
// - Option<T>: flags that may be absent (falls back to the environment)
// =============================================================================

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "follow-graph",
    version,
    about = "Crawl a social follow graph breadth-first and store profiles and follows",
    long_about = "follow-graph starts at one account, visits every account it follows (and every \
                  account those follow, up to --depth hops), and records each profile and follow \
                  edge in a SQLite database."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl the follow graph starting at HANDLE
    ///
    /// Example: follow-graph crawl dxmfromcvs --depth 2 --workers 10
    Crawl {
        /// Handle of the account to start from
        handle: String,

        /// Maximum number of follow hops from the root
        ///
        /// Depth 0 = only the root profile is stored.
        /// Depth 1 = the root, its follows, and the root's follow edges.
        #[arg(long, default_value_t = 0)]
        depth: usize,

        /// Number of pages fetched in parallel
        #[arg(long, default_value_t = 10)]
        workers: usize,

        /// SQLite database file (overrides DATABASE_PATH)
        #[arg(long)]
        db: Option<PathBuf>,

        /// Keep results in memory instead of writing to the database
        #[arg(long)]
        dry_run: bool,

        /// Print the crawl report as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show a stored person and the handles they follow
    ///
    /// Example: follow-graph show dxmfromcvs
    Show {
        /// Handle of the stored account
        handle: String,

        /// SQLite database file (overrides DATABASE_PATH)
        #[arg(long)]
        db: Option<PathBuf>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}
