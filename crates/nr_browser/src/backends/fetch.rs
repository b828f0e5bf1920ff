//! Headless-fetch backend: plain HTTP GET plus a static DOM. Suitable
//! whenever the target site renders without JavaScript; a "browsing
//! context" is simply an independently fetched document.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use reqwest::Client;
use tracing::debug;

use nr_core::Result;

use super::dom::{ContextSet, DomElement};
use crate::{BrowserSession, ContextId};

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

pub struct FetchSession {
    client: Client,
    contexts: ContextSet,
}

impl FetchSession {
    pub fn new() -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;
        Ok(Self {
            client,
            contexts: ContextSet::new(),
        })
    }
}

#[async_trait]
impl BrowserSession for FetchSession {
    type Element = DomElement;

    async fn navigate(&mut self, url: &str) -> Result<()> {
        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        debug!(%url, bytes = body.len(), "fetched document");
        self.contexts.set_document(url.to_string(), body);
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
        Ok(self.contexts.open())
    }

    async fn switch_to_context(&mut self, context: ContextId) -> Result<()> {
        self.contexts.switch_to(context)
    }

    async fn close_context(&mut self) -> Result<()> {
        self.contexts.close_current()?;
        Ok(())
    }

    async fn wait_until_present(
        &mut self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<DomElement> {
        // A fetched document is static; the element is either present now
        // or never will be.
        self.contexts.find_one(selector)
    }

    async fn invoke(&mut self, element: &DomElement) -> Result<()> {
        let target = self.contexts.resolve_href(element)?;
        debug!(%target, "following activated link");
        self.navigate(&target).await
    }
}
