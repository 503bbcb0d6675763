mod config;
mod crawler;
mod models;
mod net;
mod notify;
mod parser;
mod pipeline;
mod seen;

use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use crate::config::Settings;
use crate::crawler::CategoryKind;
use crate::net::HttpFetcher;
use crate::pipeline::{ErrorResponse, Pipeline, Response};

#[derive(Parser)]
#[command(name = "camphub_scraper", about = "Camphub contest scraper and webhook notifier")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl a category and print every open listing with details
    List {
        /// Category slug (e.g. "contest", "tutor", "vet")
        #[arg(short, long, default_value = "contest")]
        category: String,
        /// Section: default, type, tag, medical, private
        #[arg(short, long, default_value = "default")]
        kind: String,
    },
    /// Scrape a single contest page
    Detail {
        /// Contest page URL on the site
        url: String,
    },
    /// Send webhook notifications for listings not seen before
    Notify {
        #[arg(short, long, default_value = "contest")]
        category: String,
        /// Webhook URL (defaults to `webhook_url` from config)
        #[arg(short, long)]
        webhook: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let ok = match run(cli.command).await {
        Ok(ok) => ok,
        Err(e) => print_json(&Response::<()>::Err(ErrorResponse::new(format!("{e:#}")))),
    };

    info!(elapsed_ms = t0.elapsed().as_millis() as u64, "Done");
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Runs one flow and prints its envelope. Errors here are setup failures only.
async fn run(command: Commands) -> anyhow::Result<bool> {
    let settings = Settings::load()?;
    let fetcher = HttpFetcher::new(&settings.base_url, Duration::from_secs(settings.timeout_secs))?;
    let pipeline = Pipeline::new(&settings, Box::new(fetcher))?;

    let ok = match command {
        Commands::List { category, kind } => {
            print_json(&pipeline.run_list(CategoryKind::parse(&kind), &category).await)
        }
        Commands::Detail { url } => print_json(&pipeline.run_detail(&url).await),
        Commands::Notify { category, webhook } => {
            let Some(webhook) = webhook.or(settings.webhook_url) else {
                anyhow::bail!("No webhook given (use --webhook or CAMPHUB_WEBHOOK_URL)");
            };
            print_json(&pipeline.run_notify(&category, &webhook).await)
        }
    };
    Ok(ok)
}

fn print_json<T: Serialize>(response: &Response<T>) -> bool {
    match serde_json::to_string_pretty(response) {
        Ok(json) => println!("{json}"),
        Err(e) => println!(r#"{{"status":"error","message":"{e}"}}"#),
    }
    response.is_ok()
}
