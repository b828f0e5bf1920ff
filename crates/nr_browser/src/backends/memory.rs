//! Fixture-backed session: registered pages instead of a network, plus an
//! event log the scraper tests assert navigation and context hygiene
//! against.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use nr_core::{Error, Result};

use super::dom::{ContextSet, DomElement};
use crate::{BrowserSession, ContextId};

/// What happened on the session, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Navigated(String),
    OpenedContext(ContextId),
    SwitchedContext(ContextId),
    ClosedContext(ContextId),
}

pub struct MemorySession {
    pages: HashMap<String, String>,
    contexts: ContextSet,
    events: Vec<SessionEvent>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            contexts: ContextSet::new(),
            events: Vec::new(),
        }
    }

    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }

    pub fn events(&self) -> &[SessionEvent] {
        &self.events
    }

    pub fn open_contexts(&self) -> usize {
        self.contexts.count()
    }
}

impl Default for MemorySession {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrowserSession for MemorySession {
    type Element = DomElement;

    async fn navigate(&mut self, url: &str) -> Result<()> {
        // Fragments never reach the server.
        let page = url.splitn(2, '#').next().unwrap_or(url);
        let html = self
            .pages
            .get(page)
            .cloned()
            .ok_or_else(|| Error::Browser(format!("no page registered for `{page}`")))?;
        self.contexts.set_document(url.to_string(), html);
        self.events.push(SessionEvent::Navigated(url.to_string()));
        debug!(%url, "loaded fixture page");
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String> {
        Ok(self.contexts.current().url.clone())
    }

    async fn find_one(&mut self, selector: &str) -> Result<DomElement> {
        self.contexts.find_one(selector)
    }

    async fn find_all(&mut self, selector: &str) -> Result<Vec<DomElement>> {
        self.contexts.find_all(selector)
    }

    async fn find_in(&mut self, element: &DomElement, selector: &str) -> Result<DomElement> {
        self.contexts.find_in(element, selector)
    }

    async fn find_all_in(
        &mut self,
        element: &DomElement,
        selector: &str,
    ) -> Result<Vec<DomElement>> {
        self.contexts.find_all_in(element, selector)
    }

    async fn text(&mut self, element: &DomElement) -> Result<String> {
        self.contexts.text(element)
    }

    async fn attribute(&mut self, element: &DomElement, name: &str) -> Result<Option<String>> {
        self.contexts.attribute(element, name)
    }

    fn current_context(&self) -> ContextId {
        self.contexts.current_id()
    }

    async fn open_context(&mut self) -> Result<ContextId> {
        let id = self.contexts.open();
        self.events.push(SessionEvent::OpenedContext(id));
        Ok(id)
    }

    async fn switch_to_context(&mut self, context: ContextId) -> Result<()> {
        self.contexts.switch_to(context)?;
        self.events.push(SessionEvent::SwitchedContext(context));
        Ok(())
    }

    async fn close_context(&mut self) -> Result<()> {
        let closed = self.contexts.close_current()?;
        self.events.push(SessionEvent::ClosedContext(closed));
        Ok(())
    }

    async fn wait_until_present(
        &mut self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<DomElement> {
        // Fixture documents are as present as they will ever be.
        self.contexts.find_one(selector)
    }

    async fn invoke(&mut self, element: &DomElement) -> Result<()> {
        let target = self.contexts.resolve_href(element)?;
        self.navigate(&target).await
    }
}
