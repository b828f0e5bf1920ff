use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One extracted article, handed to the sink as soon as it is assembled.
///
/// `id` and `storage` stay unset here; the host's persistence layer fills
/// them in after acceptance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Option<i64>,
    pub title: String,
    /// Short abstract shown on the listing card.
    pub summary: String,
    /// Full article body.
    pub text: String,
    pub link: String,
    pub storage: Option<String>,
    pub published: DateTime<Utc>,
    /// Capture timestamp, set when the record is assembled.
    pub loaded: DateTime<Utc>,
    /// Category tag texts in page order. Duplicates are legal.
    pub categories: Vec<String>,
}

/// Identity the host hands a plugin at construction time.
#[derive(Debug, Clone)]
pub struct PluginDescriptor {
    pub name: String,
    pub version: String,
}

impl PluginDescriptor {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// How a parse pass ended. Every variant is a successful run boundary;
/// hard failures travel as errors instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOutcome {
    /// The next-page control could not be found: end of catalog.
    Exhausted,
    /// The sink refused a document older than the from-date restriction.
    DateCutoff,
    /// The configured document cap was reached.
    DocumentCap,
}
