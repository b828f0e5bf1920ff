use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use clap::Parser;
use tracing::info;

use nr_browser::{BrowserSession, CdpSession, FetchSession};
use nr_core::sink::RestrictionGate;
use nr_core::{Document, DocumentSink, ParseOutcome, PluginDescriptor, Restrictions, Result};
use nr_scrappers::scrapers::PayPalScraper;
use nr_scrappers::Scraper;

#[derive(Parser, Debug)]
#[command(author, version, about = "PayPal newsroom scraper", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run one parse pass and emit accepted documents as JSON lines
    Scrape {
        /// Earliest accepted publication date (YYYY-MM-DD)
        #[arg(long)]
        from_date: Option<NaiveDate>,
        /// Stop after this many documents
        #[arg(long)]
        max_documents: Option<usize>,
        /// Browser backend: cdp (real browser) or fetch (static HTML)
        #[arg(long, default_value = "cdp")]
        backend: String,
    },
    /// List available sources
    List,
}

/// Writes each accepted document to stdout as one JSON line.
struct JsonLinesSink;

#[async_trait]
impl DocumentSink for JsonLinesSink {
    async fn accept(&self, document: Document) -> Result<()> {
        println!("{}", serde_json::to_string(&document)?);
        Ok(())
    }
}

async fn run<S: BrowserSession>(
    plugin: PluginDescriptor,
    restrictions: Restrictions,
    session: S,
    sink: Arc<dyn DocumentSink>,
) -> Result<ParseOutcome> {
    let mut scraper = PayPalScraper::new(plugin, restrictions, session, sink);
    info!("🦗 scraping {}", scraper.source());
    scraper.parse().await
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Scrape {
            from_date,
            max_documents,
            backend,
        } => {
            let restrictions = Restrictions {
                from_date: from_date.map(|date| date.and_time(NaiveTime::MIN).and_utc()),
                max_documents,
            };
            let sink: Arc<dyn DocumentSink> =
                Arc::new(RestrictionGate::new(JsonLinesSink, restrictions.clone()));
            let plugin = PluginDescriptor::new("paypal-newsroom", env!("CARGO_PKG_VERSION"));

            let outcome = match backend.as_str() {
                "fetch" => {
                    let session = FetchSession::new()?;
                    run(plugin, restrictions, session, sink).await?
                }
                "cdp" => {
                    let session = CdpSession::launch().await?;
                    run(plugin, restrictions, session, sink).await?
                }
                other => {
                    return Err(nr_core::Error::Browser(format!("unknown backend `{other}`")))
                }
            };

            match outcome {
                ParseOutcome::Exhausted => info!("📭 catalog exhausted, run complete"),
                ParseOutcome::DateCutoff => info!("🏁 date cutoff reached, run finished early"),
                ParseOutcome::DocumentCap => info!("🛑 document cap reached, run finished early"),
            }
        }
        Commands::List => {
            println!("Available sources:");
            println!("  - PayPal Newsroom (us/paypal)");
        }
    }

    Ok(())
}
