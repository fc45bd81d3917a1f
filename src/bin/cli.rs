//! fischdex CLI
//!
//! Crawls the wiki into datasets and queries them locally.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use fischdex::{
    error::{AppError, Result},
    models::{Config, CrawlTarget},
    pipeline,
    search::{Catalog, MAX_SUGGESTIONS, MatchResult},
    storage::LocalStorage,
    utils::http::HttpSource,
};

/// fischdex - Fisch wiki crawler and lookup
#[derive(Parser, Debug)]
#[command(name = "fischdex", version, about = "Fisch wiki crawler and lookup")]
struct Cli {
    /// Path to storage directory containing config.toml
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl one target, or all of them
    Crawl {
        #[arg(value_enum)]
        target: TargetArg,
    },

    /// Resolve a query against a dataset
    Lookup {
        /// Dataset name or alias (creatures, tools, enchantments, ...)
        dataset: String,
        query: String,
    },

    /// List completion candidates for a partial query
    Suggest {
        dataset: String,
        #[arg(default_value = "")]
        prefix: String,
        #[arg(short, long, default_value_t = MAX_SUGGESTIONS)]
        limit: usize,
    },

    /// Validate configuration
    Validate,

    /// Show per-dataset record counts
    Info,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum TargetArg {
    Creatures,
    Tools,
    Enchantments,
    All,
}

impl TargetArg {
    fn targets(self) -> Vec<CrawlTarget> {
        match self {
            TargetArg::Creatures => vec![CrawlTarget::Creatures],
            TargetArg::Tools => vec![CrawlTarget::Tools],
            TargetArg::Enchantments => vec![CrawlTarget::Enchantments],
            TargetArg::All => CrawlTarget::ALL.to_vec(),
        }
    }
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.storage_dir.join("config.toml");
    let config = Config::load_or_default(&config_path);
    let storage = LocalStorage::from_config(&config.paths, &cli.storage_dir);

    match cli.command {
        Command::Crawl { target } => {
            config.validate()?;
            let source = HttpSource::from_config(&config.crawler)?;

            let mut failed = Vec::new();
            for target in target.targets() {
                match pipeline::run_crawler(&config, &storage, &source, target).await {
                    Ok(report) => {
                        for dataset in &report.datasets {
                            log::info!(
                                "✓ {} ({} records, sha256 {})",
                                dataset.location,
                                dataset.stats.dataset_size,
                                dataset.stats.sha256
                            );
                        }
                    }
                    Err(e) => {
                        log::error!("Crawl of {} failed: {}", target, e);
                        failed.push(target.to_string());
                    }
                }
            }

            if !failed.is_empty() {
                return Err(AppError::validation(format!(
                    "crawl failed for: {}",
                    failed.join(", ")
                )));
            }
        }

        Command::Lookup { dataset, query } => {
            let catalog = Catalog::load(&storage).await;
            match catalog.lookup(&query, &dataset)? {
                MatchResult::Found(record) => {
                    println!("{}", serde_json::to_string_pretty(record)?);
                }
                MatchResult::NotFound => println!("No match for '{query}' in {dataset}"),
                MatchResult::Ambiguous(candidates) => {
                    println!("'{query}' matches {} records:", candidates.len());
                    for record in candidates {
                        println!("  {} ({})", record.display_name(), record.id);
                    }
                }
            }
        }

        Command::Suggest {
            dataset,
            prefix,
            limit,
        } => {
            let catalog = Catalog::load(&storage).await;
            for suggestion in catalog.suggest(&prefix, &dataset, limit)? {
                println!("{}\t{}", suggestion.key, suggestion.display);
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
        }

        Command::Info => {
            log::info!("Storage directory: {}", cli.storage_dir.display());
            let catalog = Catalog::load(&storage).await;
            for (category, count) in catalog.counts() {
                println!(
                    "{:<24} {:>6} records  {}",
                    category.name(),
                    count,
                    storage.dataset_path(category).display()
                );
            }
        }
    }

    Ok(())
}
