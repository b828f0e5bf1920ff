use std::time::Duration;

use async_trait::async_trait;

use nr_core::Result;

pub mod backends;

pub use backends::cdp::CdpSession;
pub use backends::fetch::FetchSession;
pub use backends::memory::MemorySession;

/// Handle to one isolated browsing context (tab) within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(pub(crate) u64);

/// Narrow seam over a browser driver.
///
/// The scrape loop depends only on this trait, so a real browser can be
/// swapped for a headless-fetch backend when the target site renders
/// without JavaScript, or for fixture pages under test.
///
/// A session starts with a single root context. All element and document
/// operations apply to the current context.
#[async_trait]
pub trait BrowserSession: Send {
    type Element: Send + Sync;

    /// Load a URL into the current context.
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// URL of the document in the current context.
    async fn current_url(&mut self) -> Result<String>;

    /// First element matching a CSS selector, document-wide.
    async fn find_one(&mut self, selector: &str) -> Result<Self::Element>;

    /// All elements matching a CSS selector, in document order.
    async fn find_all(&mut self, selector: &str) -> Result<Vec<Self::Element>>;

    /// First descendant of `element` matching a CSS selector.
    async fn find_in(&mut self, element: &Self::Element, selector: &str)
        -> Result<Self::Element>;

    /// All descendants of `element` matching a CSS selector.
    async fn find_all_in(
        &mut self,
        element: &Self::Element,
        selector: &str,
    ) -> Result<Vec<Self::Element>>;

    /// Visible text of an element. Absent text reads as empty, never as an
    /// error.
    async fn text(&mut self, element: &Self::Element) -> Result<String>;

    /// Attribute value of an element, `None` when the attribute is unset.
    async fn attribute(&mut self, element: &Self::Element, name: &str)
        -> Result<Option<String>>;

    fn current_context(&self) -> ContextId;

    /// Open a fresh context without switching to it.
    async fn open_context(&mut self) -> Result<ContextId>;

    async fn switch_to_context(&mut self, context: ContextId) -> Result<()>;

    /// Close the current context. The root context cannot be closed.
    async fn close_context(&mut self) -> Result<()>;

    /// Poll for an element until it appears or the timeout expires.
    async fn wait_until_present(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Self::Element>;

    /// Activate an element through direct script-level invocation, never a
    /// simulated pointer click.
    async fn invoke(&mut self, element: &Self::Element) -> Result<()>;
}
