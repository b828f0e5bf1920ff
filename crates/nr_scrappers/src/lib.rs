pub mod datetime;
pub mod scrapers;

pub use scrapers::{PayPalScraper, Scraper};

pub mod prelude {
    pub use super::scrapers::Scraper;
    pub use nr_core::{Document, Error, ParseOutcome, Result};
}
