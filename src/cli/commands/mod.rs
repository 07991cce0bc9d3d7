//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod cache;
mod helpers;
mod products;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};

#[derive(Parser)]
#[command(name = "paapi")]
#[command(about = "Signed, rate-limited, cached Product Advertising API access")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Data directory holding the cache and investigations (overrides config file)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch products by ASIN (cache first) and print them as JSON
    Get {
        /// One or more ASINs
        #[arg(required = true)]
        ids: Vec<String>,
        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Search the catalog by keywords
    Search {
        /// Search keywords
        keywords: String,
        /// Search index (e.g. All, HomeAndKitchen)
        #[arg(short, long, default_value = "All")]
        index: String,
        /// Results per page (1-10)
        #[arg(short = 'n', long, default_value = "10")]
        count: u32,
        /// Result page
        #[arg(long)]
        page: Option<u32>,
        /// Restrict to a browse node
        #[arg(long)]
        browse_node: Option<String>,
        /// Minimum price in minor units
        #[arg(long)]
        min_price: Option<u64>,
        /// Maximum price in minor units
        #[arg(long)]
        max_price: Option<u64>,
        /// Sort order (e.g. Featured, Price:LowToHigh)
        #[arg(long)]
        sort: Option<String>,
        /// Keep mobile-app and zero-price listings
        #[arg(long)]
        include_ineligible: bool,
        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Show the browse nodes of an item and which would be chosen as its category
    BrowseNodes {
        /// ASIN to inspect
        id: String,
    },

    /// Inspect the product cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Show entry counts
    Stats,

    /// Report the cached state of each ASIN without calling the vendor
    Check {
        /// One or more ASINs
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        data: cli.data,
    };
    let (settings, _config) = load_settings_with_options(options).await;

    match cli.command {
        Commands::Get { ids, pretty } => products::cmd_get(&settings, &ids, pretty).await,
        Commands::Search {
            keywords,
            index,
            count,
            page,
            browse_node,
            min_price,
            max_price,
            sort,
            include_ineligible,
            pretty,
        } => {
            let mut params = crate::paapi::SearchParams::new(&keywords)
                .with_search_index(&index)
                .with_item_count(count);
            params.item_page = page;
            params.browse_node_id = browse_node;
            params.min_price = min_price;
            params.max_price = max_price;
            params.sort_by = sort;
            if include_ineligible {
                params = params.include_ineligible();
            }
            products::cmd_search(&settings, &params, pretty).await
        }
        Commands::BrowseNodes { id } => products::cmd_browse_nodes(&settings, &id).await,
        Commands::Cache { command } => match command {
            CacheCommands::Stats => cache::cmd_cache_stats(&settings),
            CacheCommands::Check { ids } => cache::cmd_cache_check(&settings, &ids),
        },
    }
}
