mod catalog;
mod export_file;
mod inspect;
mod scrape;
mod verify;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "ivory")]
#[command(about = "Ivory storefront price tracker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List configured category groups and keys
    Categories,
    /// Scrape categories, enrich them, and write an export
    Scrape {
        /// Restrict the run to this category key (repeatable)
        #[arg(long = "category", value_name = "KEY")]
        categories: Vec<String>,

        /// Skip LLM enrichment and the exchange rate lookup
        #[arg(long)]
        no_enrich: bool,

        /// Directory for export files (overrides IVORY_OUTPUT_DIR)
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },
    /// Check an export file for schema and consistency issues
    Validate {
        path: PathBuf,
    },
    /// Re-run the US price verification pass over an existing export
    Verify {
        path: PathBuf,

        /// Where to write the result (default: <stem>_verified.json)
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Print per-category price ratio statistics for an export
    Report {
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ivory_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Commands::Categories => catalog::list_categories(&config),
        Commands::Scrape {
            categories,
            no_enrich,
            output_dir,
        } => {
            scrape::run_scrape(
                &config,
                scrape::ScrapeOptions {
                    categories,
                    no_enrich,
                    output_dir,
                },
            )
            .await
        }
        Commands::Validate { path } => inspect::validate_file(&path),
        Commands::Verify { path, output } => {
            verify::run_verify(&config, &path, output.as_deref()).await
        }
        Commands::Report { path } => inspect::report_file(&path),
    }
}
