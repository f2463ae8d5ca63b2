use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bookhound")]
#[command(author, version, about = "ASIN resolution for e-book libraries")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve the ASIN for a single book
    Lookup {
        /// Book title
        #[arg(long)]
        title: Option<String>,

        /// Author name
        #[arg(long)]
        author: Option<String>,

        /// Language code (2- or 3-letter, region-qualified accepted)
        #[arg(long)]
        language: Option<String>,

        /// ISBN, when known
        #[arg(long)]
        isbn: Option<String>,

        /// Restrict to one source (amazon, googlebooks, openlibrary)
        #[arg(long)]
        source: Option<String>,

        /// Expand the search with fuzzy title/author variations
        #[arg(long)]
        fuzzy: bool,

        /// Minimum confidence for fuzzy matches
        #[arg(long, default_value = "0.8")]
        fuzzy_threshold: f64,

        /// Bypass the cache, including cached negatives
        #[arg(long)]
        refresh: bool,

        /// Output the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve ASINs for every e-book under the library root
    Batch {
        /// Library root (overrides BOOKHOUND_LIBRARY / CALIBRE_LIBRARY_PATH)
        #[arg(long)]
        library: Option<PathBuf>,

        /// Parallel lookup workers
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Expand searches with fuzzy title/author variations
        #[arg(long)]
        fuzzy: bool,

        /// Write resolved ASINs back into each file's metadata
        #[arg(long)]
        write_back: bool,
    },

    /// Inspect or maintain the lookup cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Show entry counts
    Stats,

    /// Drop every entry
    Clear,

    /// Drop expired negative entries
    Prune,
}
