//! Real-browser backend over the Chrome DevTools Protocol.
//!
//! One `Page` per browsing context. The event handler runs on its own
//! task and is aborted when the session drops; dropping the `Browser`
//! also ends the Chrome process.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use nr_core::{Error, Result};

use crate::{BrowserSession, ContextId};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

fn cdp_err(e: CdpError) -> Error {
    Error::Browser(e.to_string())
}

pub struct CdpSession {
    browser: Browser,
    handler: JoinHandle<()>,
    pages: Vec<(ContextId, Page)>,
    current: usize,
    next_id: u64,
}

impl CdpSession {
    /// Launch a headless browser and open the root browsing context.
    pub async fn launch() -> Result<Self> {
        let config = BrowserConfigBuilder::default()
            .request_timeout(Duration::from_secs(30))
            .window_size(1280, 1024)
            .headless_mode(HeadlessMode::default())
            .arg("--disable-notifications")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--mute-audio")
            .build()
            .map_err(Error::Browser)?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(cdp_err)?;
        let handler = tokio::task::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    warn!("browser handler error: {e:?}");
                }
            }
            debug!("browser event handler finished");
        });

        let page = browser.new_page("about:blank").await.map_err(cdp_err)?;
        info!("browser session launched");
        Ok(Self {
            browser,
            handler,
            pages: vec![(ContextId(0), page)],
            current: 0,
            next_id: 1,
        })
    }

    fn page(&self) -> &Page {
        &self.pages[self.current].1
    }

    /// Shut the browser down cleanly. Dropping the session is enough to
    /// end the Chrome process, but close lets it flush first.
    pub async fn close(mut self) -> Result<()> {
        self.browser.close().await.map_err(cdp_err)?;
        self.handler.abort();
        Ok(())
    }
}

impl Drop for CdpSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

#[async_trait]
impl BrowserSession for CdpSession {
    type Element = Element;

    async fn navigate(&mut self, url: &str) -> Result<()> {
        let page = self.page();
        page.goto(url).await.map_err(cdp_err)?;
        page.wait_for_navigation().await.map_err(cdp_err)?;
        debug!(%url, "navigation settled");
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String> {
        Ok(self
            .page()
            .url()
            .await
            .map_err(cdp_err)?
            .unwrap_or_else(|| "about:blank".to_string()))
    }

    async fn find_one(&mut self, selector: &str) -> Result<Element> {
        self.page()
            .find_element(selector)
            .await
            .map_err(|_| Error::ElementNotFound {
                selector: selector.to_string(),
            })
    }

    async fn find_all(&mut self, selector: &str) -> Result<Vec<Element>> {
        self.page().find_elements(selector).await.map_err(cdp_err)
    }

    async fn find_in(&mut self, element: &Element, selector: &str) -> Result<Element> {
        element
            .find_element(selector)
            .await
            .map_err(|_| Error::ElementNotFound {
                selector: selector.to_string(),
            })
    }

    async fn find_all_in(&mut self, element: &Element, selector: &str) -> Result<Vec<Element>> {
        element.find_elements(selector).await.map_err(cdp_err)
    }

    async fn text(&mut self, element: &Element) -> Result<String> {
        Ok(element
            .inner_text()
            .await
            .map_err(cdp_err)?
            .unwrap_or_default())
    }

    async fn attribute(&mut self, element: &Element, name: &str) -> Result<Option<String>> {
        element.attribute(name).await.map_err(cdp_err)
    }

    fn current_context(&self) -> ContextId {
        self.pages[self.current].0
    }

    async fn open_context(&mut self) -> Result<ContextId> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(cdp_err)?;
        let id = ContextId(self.next_id);
        self.next_id += 1;
        self.pages.push((id, page));
        Ok(id)
    }

    async fn switch_to_context(&mut self, context: ContextId) -> Result<()> {
        let index = self
            .pages
            .iter()
            .position(|(id, _)| *id == context)
            .ok_or_else(|| Error::Browser(format!("unknown browsing context {context:?}")))?;
        self.current = index;
        self.pages[index].1.bring_to_front().await.map_err(cdp_err)?;
        Ok(())
    }

    async fn close_context(&mut self) -> Result<()> {
        if self.pages.len() == 1 {
            return Err(Error::Browser(
                "cannot close the last browsing context".to_string(),
            ));
        }
        let (_, page) = self.pages.remove(self.current);
        page.close().await.map_err(cdp_err)?;
        self.current = 0;
        Ok(())
    }

    async fn wait_until_present(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Element> {
        let start = Instant::now();
        loop {
            match self.page().find_element(selector).await {
                Ok(element) => {
                    debug!(selector, elapsed = ?start.elapsed(), "element appeared");
                    return Ok(element);
                }
                Err(_) if start.elapsed() >= timeout => {
                    return Err(Error::WaitTimeout {
                        selector: selector.to_string(),
                        waited: start.elapsed(),
                    });
                }
                Err(_) => tokio::time::sleep(POLL_INTERVAL).await,
            }
        }
    }

    async fn invoke(&mut self, element: &Element) -> Result<()> {
        // The newsroom's controls have not reacted reliably to simulated
        // pointer clicks; go through the DOM method instead.
        element
            .call_js_fn("function() { this.click(); }", false)
            .await
            .map_err(cdp_err)?;
        Ok(())
    }
}
