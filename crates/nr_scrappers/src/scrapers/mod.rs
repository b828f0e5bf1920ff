use async_trait::async_trait;

use nr_core::{ParseOutcome, Result};

pub mod us;

pub use us::paypal::PayPalScraper;

/// A single-source parser payload driven by the host pipeline.
#[async_trait]
pub trait Scraper: Send {
    /// Human-readable name of the news source.
    fn source(&self) -> &str;

    /// Run one full parse pass. Documents are pushed to the sink as they
    /// are produced; the return value only reports how the run ended.
    async fn parse(&mut self) -> Result<ParseOutcome>;
}
