use std::time::Duration;

use thiserror::Error;

use crate::restrictions::RestrictionKind;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("No element found for selector `{selector}`")]
    ElementNotFound { selector: String },

    #[error("Timed out after {waited:?} waiting for selector `{selector}`")]
    WaitTimeout { selector: String, waited: Duration },

    #[error("Scraping error: {0}")]
    Scraping(String),

    #[error("Document is out of the {0} restriction")]
    OutOfRestriction(RestrictionKind),

    #[error("Sink error: {0}")]
    Sink(String),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}
