pub mod types;
pub mod config;
pub mod data;
pub mod geometry;
pub mod scoring;
pub mod processing;
pub mod join;
pub mod output;
pub mod server;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score commercial parcels and write the ranked-site collection
    Score {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Run the pipeline and serve the results
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Score { config } => {
            println!("Scoring sites with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(config)?;

            let sites = run_pipeline(&app_config)?;

            output::write_sites(&app_config.output, &sites)?;
            println!("Scoring complete!");
        }
        Commands::Serve { config } => {
            println!("Serving sites with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(config)?;

            // Serve fresh results rather than whatever a previous run left
            // on disk.
            let sites = run_pipeline(&app_config)?;
            output::write_sites(&app_config.output, &sites)?;

            server::start_server(app_config, sites).await?;
        }
    }

    Ok(())
}

fn run_pipeline(app_config: &config::AppConfig) -> Result<Vec<types::RankedSite>> {
    // 1. Load Data
    let mut parcels = data::load_parcels(app_config)?;

    // 1b. Join population density (if configured)
    if let Some(density_path) = &app_config.input.density {
        let density_tree =
            join::load_density_polygons(density_path, &app_config.input.density_field)?;
        join::join_density(&mut parcels, &density_tree);
    }

    // 2. Filter, score, rank
    Ok(processing::rank_sites(app_config, &parcels))
}
