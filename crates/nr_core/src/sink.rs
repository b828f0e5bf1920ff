use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;

use crate::restrictions::{RestrictionKind, Restrictions};
use crate::types::Document;
use crate::{Error, Result};

/// Consumer of produced documents, supplied by the host pipeline.
///
/// An implementation may refuse a document with
/// [`Error::OutOfRestriction`] to tell the producer it has crossed an
/// acceptance boundary.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    /// Deliver one finished document.
    async fn accept(&self, document: Document) -> Result<()>;
}

#[async_trait]
impl<S: DocumentSink + ?Sized> DocumentSink for Arc<S> {
    async fn accept(&self, document: Document) -> Result<()> {
        (**self).accept(document).await
    }
}

/// Enforces the host restrictions in front of any sink: a document
/// published before the from-date boundary is refused before delivery.
pub struct RestrictionGate<S> {
    inner: S,
    restrictions: Restrictions,
}

impl<S: DocumentSink> RestrictionGate<S> {
    pub fn new(inner: S, restrictions: Restrictions) -> Self {
        Self {
            inner,
            restrictions,
        }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

#[async_trait]
impl<S: DocumentSink> DocumentSink for RestrictionGate<S> {
    async fn accept(&self, document: Document) -> Result<()> {
        if let Some(cutoff) = self.restrictions.from_date {
            if document.published < cutoff {
                debug!(
                    link = %document.link,
                    published = %document.published,
                    cutoff = %cutoff,
                    "document predates the from-date boundary"
                );
                return Err(Error::OutOfRestriction(RestrictionKind::FromDate));
            }
        }
        self.inner.accept(document).await
    }
}

/// In-process collecting sink.
#[derive(Default)]
pub struct MemorySink {
    documents: Mutex<Vec<Document>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn documents(&self) -> Vec<Document> {
        self.documents.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.documents.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DocumentSink for MemorySink {
    async fn accept(&self, document: Document) -> Result<()> {
        self.documents.lock().unwrap().push(document);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn document(published: chrono::DateTime<Utc>) -> Document {
        Document {
            id: None,
            title: "Test Article".to_string(),
            summary: "A summary".to_string(),
            text: "Body text".to_string(),
            link: "https://example.com/article".to_string(),
            storage: None,
            published,
            loaded: Utc::now(),
            categories: vec!["Company News".to_string()],
        }
    }

    #[tokio::test]
    async fn memory_sink_collects_in_order() {
        let sink = MemorySink::new();
        let first = Utc.with_ymd_and_hms(2024, 6, 2, 0, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        sink.accept(document(first)).await.unwrap();
        sink.accept(document(second)).await.unwrap();
        let documents = sink.documents();
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].published, first);
        assert_eq!(documents[1].published, second);
    }

    #[tokio::test]
    async fn gate_passes_documents_inside_the_range() {
        let cutoff = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let inner = Arc::new(MemorySink::new());
        let gate = RestrictionGate::new(
            inner.clone(),
            Restrictions {
                from_date: Some(cutoff),
                max_documents: None,
            },
        );
        gate.accept(document(cutoff)).await.unwrap();
        assert_eq!(inner.len(), 1);
    }

    #[tokio::test]
    async fn gate_refuses_documents_before_the_cutoff() {
        let cutoff = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let stale = Utc.with_ymd_and_hms(2024, 5, 31, 0, 0, 0).unwrap();
        let inner = Arc::new(MemorySink::new());
        let gate = RestrictionGate::new(
            inner.clone(),
            Restrictions {
                from_date: Some(cutoff),
                max_documents: None,
            },
        );
        let refused = gate.accept(document(stale)).await;
        assert!(matches!(
            refused,
            Err(Error::OutOfRestriction(RestrictionKind::FromDate))
        ));
        assert!(inner.is_empty());
    }

    #[tokio::test]
    async fn gate_without_a_cutoff_passes_everything() {
        let stale = Utc.with_ymd_and_hms(1999, 1, 1, 0, 0, 0).unwrap();
        let inner = Arc::new(MemorySink::new());
        let gate = RestrictionGate::new(inner.clone(), Restrictions::default());
        gate.accept(document(stale)).await.unwrap();
        assert_eq!(inner.len(), 1);
    }
}
