use std::fmt;

use chrono::{DateTime, Utc};

/// Names the acceptance boundary a document fell outside of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestrictionKind {
    FromDate,
    MaxDocuments,
}

impl fmt::Display for RestrictionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestrictionKind::FromDate => write!(f, "from-date"),
            RestrictionKind::MaxDocuments => write!(f, "max-documents"),
        }
    }
}

/// Host-configured acceptance boundaries for one run.
#[derive(Debug, Clone, Default)]
pub struct Restrictions {
    /// Earliest accepted publication date.
    pub from_date: Option<DateTime<Utc>>,
    /// Upper bound on forwarded documents.
    pub max_documents: Option<usize>,
}

impl Restrictions {
    /// The single stop condition the scrape loop evaluates after each
    /// forwarded record. A document cap takes precedence; the from-date
    /// boundary is also enforced sink-side, so either end terminates the
    /// run.
    pub fn stop_condition(&self) -> StopCondition {
        match (self.max_documents, self.from_date) {
            (Some(cap), _) => StopCondition::MaxDocuments(cap),
            (None, Some(cutoff)) => StopCondition::FromDate(cutoff),
            (None, None) => StopCondition::Unbounded,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum StopCondition {
    #[default]
    Unbounded,
    MaxDocuments(usize),
    FromDate(DateTime<Utc>),
}

impl StopCondition {
    /// Evaluated after a record has been forwarded. Returns the boundary
    /// that was crossed, if any.
    pub fn breached(
        &self,
        forwarded: usize,
        last_published: DateTime<Utc>,
    ) -> Option<RestrictionKind> {
        match self {
            StopCondition::Unbounded => None,
            StopCondition::MaxDocuments(cap) => {
                (forwarded >= *cap).then_some(RestrictionKind::MaxDocuments)
            }
            StopCondition::FromDate(cutoff) => {
                (last_published < *cutoff).then_some(RestrictionKind::FromDate)
            }
        }
    }
}
