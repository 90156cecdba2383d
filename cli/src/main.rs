mod parse_html;
mod recipe;
mod refresh;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chefkoch")]
#[command(about = "Chefkoch recipe sensor tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one refresh cycle for every configured entry and print the results
    Refresh {
        /// Config file (default: ~/.chefkoch/config.json)
        #[arg(long, env = "CHEFKOCH_CONFIG")]
        config: Option<PathBuf>,
        /// Recipe site root, overrides the config file
        #[arg(long, env = "CHEFKOCH_BASE_URL")]
        base_url: Option<String>,
    },
    /// Fetch one recipe page and print its attributes
    Recipe {
        /// Recipe detail page URL
        url: String,
        /// Config file (default: ~/.chefkoch/config.json)
        #[arg(long, env = "CHEFKOCH_CONFIG")]
        config: Option<PathBuf>,
        /// Recipe site root, overrides the config file
        #[arg(long, env = "CHEFKOCH_BASE_URL")]
        base_url: Option<String>,
    },
    /// Extract recipe attributes from a saved HTML page
    ParseHtml {
        /// Path to the HTML file
        #[arg(long)]
        file: PathBuf,
        /// URL the page was saved from
        #[arg(long)]
        url: String,
    },
}

/// Log to stderr so stdout stays valid JSON.
fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    match cli.command {
        Commands::Refresh { config, base_url } => {
            refresh::refresh(config, base_url).await?;
        }
        Commands::Recipe {
            url,
            config,
            base_url,
        } => {
            recipe::recipe(&url, config, base_url).await?;
        }
        Commands::ParseHtml { file, url } => {
            parse_html::parse_html(&file, &url)?;
        }
    }

    Ok(())
}
