mod config;
mod loader;
mod models;
mod pipeline;
mod scraper;
mod utils;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::AppConfig;
use crate::loader::{load_contacts, write_contacts};
use crate::models::{Category, SearchQuery, SearchReport};
use crate::pipeline::Pipeline;
use crate::scraper::DirectorySource;

#[derive(Parser)]
#[command(name = "portal-search", about = "Academic portal person search", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Search the portal for students, lecturers or alumni
    Search {
        /// Name, NIM or other keyword
        keyword: String,

        /// 1 (mahasiswa), 2 (dosen) or 3 (alumni)
        #[arg(short, long, default_value = "1")]
        category: Category,

        /// Override the portal origin
        #[arg(long, env = "PORTAL_BASE_URL")]
        base_url: Option<String>,

        /// Concurrent detail-page fetches (1 = sequential)
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Clean a student contact export (NIM → email, phone → 62…)
    CleanContacts {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long, default_value = "cleaned_contacts.csv")]
        output: PathBuf,

        /// Number of cleaned rows to log as a preview
        #[arg(long, default_value_t = 10)]
        preview: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "portal_search=info,warn",
        1 => "portal_search=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::new(filter))
        .init();

    let mut config = AppConfig::load().context("Failed to load configuration")?;

    match cli.command {
        Command::Search {
            keyword,
            category,
            base_url,
            concurrency,
        } => {
            let _t = utils::Timer::start("Portal search");
            if let Some(url) = base_url {
                config.portal.base_url = url;
            }
            if let Some(n) = concurrency {
                config.pipeline.detail_concurrency = n;
            }

            let query = SearchQuery::new(keyword, category);
            let pipeline = Pipeline::new(config);

            match pipeline.search(&query).await {
                Ok(results) => {
                    let report = SearchReport::new(&query, results);
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
                Err(e) => {
                    println!("{}", serde_json::to_string_pretty(&e)?);
                    anyhow::bail!("Search failed: {}", e);
                }
            }
        }

        Command::CleanContacts {
            input,
            output,
            preview,
        } => {
            let _t = utils::Timer::start("Contact cleaning");
            let contacts = load_contacts(&input)?;

            let head = &contacts[..contacts.len().min(preview)];
            info!("Preview:\n{}", serde_json::to_string_pretty(head)?);

            write_contacts(&output, &contacts)?;
            println!("{} contacts written to {}", contacts.len(), output.display());
        }
    }

    Ok(())
}
