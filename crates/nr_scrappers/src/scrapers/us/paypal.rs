//! PayPal corporate newsroom scraper.
//!
//! Walks the paginated listing at `newsroom.paypal-corp.com`, opens each
//! article in a second browsing context, and forwards one [`Document`]
//! per article to the host sink until pagination runs out or the sink
//! reports the from-date boundary.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use nr_browser::BrowserSession;
use nr_core::{
    Document, DocumentSink, Error, ParseOutcome, PluginDescriptor, RestrictionKind, Restrictions,
    Result, StopCondition,
};

use crate::datetime;
use crate::scrapers::Scraper;

/// Landing page of the newsroom catalog.
const HOST: &str = "https://newsroom.paypal-corp.com/news";

// Structural contract with the live site. Selector drift is the dominant
// failure mode, so every extraction failure logs the field and page
// involved.
const ITEM_LIST: &str = ".wd_item_list";
const ITEM_CARD: &str = ".wd_has-image";
const ITEM_TITLE: &str = ".wd_title";
const ITEM_DATE: &str = ".wd_date";
const ITEM_SUMMARY: &str = ".wd_summary";
const ITEM_LINK: &str = "a";
const ARTICLE_BODY: &str = ".wd_news_body";
const CATEGORY_LINK: &str = ".wd_category_link";
const NEXT_PAGE: &str = "li.wd_page_next";
const CONSENT_ACCEPT: &str = "#acceptAllButton";

/// Settle delays and bounded-wait limits for one run.
///
/// The listing and article pages render client-side, so each navigation
/// gets a fixed settle pause before the DOM is read.
#[derive(Debug, Clone)]
pub struct Pacing {
    pub listing_settle: Duration,
    pub detail_settle: Duration,
    pub pagination_settle: Duration,
    /// Bounded wait for the article body region.
    pub body_timeout: Duration,
    /// Bounded wait for the consent control to become interactable.
    pub consent_timeout: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            listing_settle: Duration::from_secs(2),
            detail_settle: Duration::from_secs(1),
            pagination_settle: Duration::from_secs(3),
            body_timeout: Duration::from_secs(20),
            consent_timeout: Duration::from_secs(2),
        }
    }
}

/// What a listing card yields before the detail page is opened.
struct CardSummary {
    title: String,
    summary: String,
    published: DateTime<Utc>,
    link: String,
}

pub struct PayPalScraper<S: BrowserSession> {
    plugin: PluginDescriptor,
    restrictions: Restrictions,
    session: S,
    sink: Arc<dyn DocumentSink>,
    stop: StopCondition,
    pacing: Pacing,
}

impl<S: BrowserSession> PayPalScraper<S> {
    /// The session is borrowed for the duration of one run; the host gets
    /// it back through [`into_session`](Self::into_session).
    pub fn new(
        plugin: PluginDescriptor,
        restrictions: Restrictions,
        session: S,
        sink: Arc<dyn DocumentSink>,
    ) -> Self {
        let stop = restrictions.stop_condition();
        Self {
            plugin,
            restrictions,
            session,
            sink,
            stop,
            pacing: Pacing::default(),
        }
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn into_session(self) -> S {
        self.session
    }

    /// Navigate, settle, then try to get the consent overlay out of the
    /// way. Overlay trouble never aborts a page load.
    async fn init_page(&mut self, url: &str, settle: Duration) -> Result<()> {
        self.session.navigate(url).await?;
        tokio::time::sleep(settle).await;
        if let Err(e) = self.dismiss_consent_overlay().await {
            debug!(%url, error = %e, "consent dismissal failed, continuing");
        }
        Ok(())
    }

    async fn dismiss_consent_overlay(&mut self) -> Result<()> {
        match self
            .session
            .wait_until_present(CONSENT_ACCEPT, self.pacing.consent_timeout)
            .await
        {
            Ok(button) => {
                self.session.invoke(&button).await?;
                let url = self.session.current_url().await.unwrap_or_default();
                debug!(%url, "passed the consent overlay");
            }
            Err(Error::ElementNotFound { .. }) | Err(Error::WaitTimeout { .. }) => {
                let url = self.session.current_url().await.unwrap_or_default();
                debug!(%url, "no consent overlay on page");
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    async fn field_text(&mut self, card: &S::Element, selector: &str) -> Result<String> {
        let element = self.session.find_in(card, selector).await?;
        self.session.text(&element).await
    }

    async fn field_date(&mut self, card: &S::Element) -> Result<DateTime<Utc>> {
        let raw = self.field_text(card, ITEM_DATE).await?;
        datetime::normalize(&raw)
    }

    async fn field_link(&mut self, card: &S::Element) -> Result<String> {
        let anchor = self.session.find_in(card, ITEM_LINK).await?;
        self.session
            .attribute(&anchor, "href")
            .await?
            .ok_or_else(|| Error::Scraping(format!("`{ITEM_LINK}` carries no href attribute")))
    }

    /// Read one listing card. Title and summary fall back to placeholders;
    /// a card without a parseable date or a link is dropped.
    async fn read_card(&mut self, page_url: &str, card: &S::Element) -> Option<CardSummary> {
        let title = match self.field_text(card, ITEM_TITLE).await {
            Ok(title) => title,
            Err(e) => {
                warn!(url = %page_url, field = "title", error = %e, "falling back to placeholder");
                " ".to_string()
            }
        };

        let published = match self.field_date(card).await {
            Ok(published) => published,
            Err(e) => {
                warn!(url = %page_url, field = "date", error = %e, "dropping item");
                return None;
            }
        };

        let summary = match self.field_text(card, ITEM_SUMMARY).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(url = %page_url, field = "summary", error = %e, "falling back to empty");
                String::new()
            }
        };

        let link = match self.field_link(card).await {
            Ok(link) => link,
            Err(e) => {
                warn!(url = %page_url, field = "link", error = %e, "dropping item");
                return None;
            }
        };

        Some(CardSummary {
            title,
            summary,
            published,
            link,
        })
    }

    /// Pull body text and category tags from the article page loaded in
    /// the current context.
    async fn read_article(&mut self) -> Result<(String, Vec<String>)> {
        let body = self
            .session
            .wait_until_present(ARTICLE_BODY, self.pacing.body_timeout)
            .await?;
        let text = self.session.text(&body).await?;
        let mut categories = Vec::new();
        for tag in self.session.find_all(CATEGORY_LINK).await? {
            categories.push(self.session.text(&tag).await?);
        }
        Ok((text, categories))
    }

    /// Activate the next-page control. Lookup and activation failures
    /// collapse into one terminal condition; the caller cannot tell a
    /// missing control from a dead one, and the site gives no way to.
    async fn advance_page(&mut self) -> Result<()> {
        let arrow = self.session.find_one(NEXT_PAGE).await?;
        self.session.invoke(&arrow).await?;
        tokio::time::sleep(self.pacing.pagination_settle).await;
        Ok(())
    }
}

#[async_trait]
impl<S: BrowserSession> Scraper for PayPalScraper<S> {
    fn source(&self) -> &str {
        "PayPal Newsroom"
    }

    async fn parse(&mut self) -> Result<ParseOutcome> {
        debug!(plugin = %self.plugin.name, host = HOST, "parser entering source");
        self.init_page(HOST, self.pacing.listing_settle).await?;

        let mut forwarded = 0usize;
        loop {
            debug!("loading the item list");
            let list = self.session.find_one(ITEM_LIST).await?;
            let cards = self.session.find_all_in(&list, ITEM_CARD).await?;
            let page_url = self
                .session
                .current_url()
                .await
                .unwrap_or_else(|_| HOST.to_string());
            debug!(url = %page_url, cards = cards.len(), "processing the item list");

            for card in &cards {
                let Some(summary) = self.read_card(&page_url, card).await else {
                    continue;
                };

                let origin = self.session.current_context();
                let detail = self.session.open_context().await?;
                self.session.switch_to_context(detail).await?;
                self.init_page(&summary.link, self.pacing.detail_settle)
                    .await?;
                let (text, categories) = self.read_article().await?;

                let document = Document {
                    id: None,
                    title: summary.title,
                    summary: summary.summary,
                    text,
                    link: summary.link,
                    storage: None,
                    published: summary.published,
                    loaded: Utc::now(),
                    categories,
                };
                let published = document.published;
                let link = document.link.clone();
                let delivered = self.sink.accept(document).await;

                // The detail context goes away before the sink verdict is
                // acted on, termination included.
                self.session.close_context().await?;
                self.session.switch_to_context(origin).await?;

                match delivered {
                    Ok(()) => forwarded += 1,
                    Err(Error::OutOfRestriction(RestrictionKind::FromDate)) => {
                        debug!(
                            %link,
                            from_date = ?self.restrictions.from_date,
                            "document is out of the date range, finishing"
                        );
                        return Ok(ParseOutcome::DateCutoff);
                    }
                    Err(e) => return Err(e),
                }

                if let Some(kind) = self.stop.breached(forwarded, published) {
                    debug!(?kind, forwarded, "stop condition reached, finishing");
                    return Ok(match kind {
                        RestrictionKind::FromDate => ParseOutcome::DateCutoff,
                        RestrictionKind::MaxDocuments => ParseOutcome::DocumentCap,
                    });
                }
            }

            if let Err(e) = self.advance_page().await {
                debug!(error = %e, "no next-page control, ending the run");
                return Ok(ParseOutcome::Exhausted);
            }
            debug!("advanced to the next page");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use nr_browser::backends::memory::{MemorySession, SessionEvent};
    use nr_core::sink::{MemorySink, RestrictionGate};

    const PAGE_2: &str = "https://newsroom.paypal-corp.com/news?page=2";

    fn card(
        title: Option<&str>,
        date: Option<&str>,
        summary: Option<&str>,
        link: Option<&str>,
    ) -> String {
        let mut html = String::from(r#"<li class="wd_has-image">"#);
        if let Some(title) = title {
            html.push_str(&format!(r#"<span class="wd_title">{title}</span>"#));
        }
        if let Some(date) = date {
            html.push_str(&format!(r#"<span class="wd_date">{date}</span>"#));
        }
        if let Some(summary) = summary {
            html.push_str(&format!(r#"<span class="wd_summary">{summary}</span>"#));
        }
        if let Some(link) = link {
            html.push_str(&format!(r#"<a href="{link}">Read more</a>"#));
        }
        html.push_str("</li>");
        html
    }

    fn listing(cards: &[String], next: Option<&str>) -> String {
        let mut html = String::from(r#"<html><body><ul class="wd_item_list">"#);
        for card in cards {
            html.push_str(card);
        }
        html.push_str("</ul>");
        if let Some(next) = next {
            html.push_str(&format!(
                r#"<ul class="wd_pagination"><li class="wd_page_next"><a href="{next}">Next</a></li></ul>"#
            ));
        }
        html.push_str("</body></html>");
        html
    }

    fn article(body: &str, categories: &[&str]) -> String {
        let tags = categories
            .iter()
            .map(|c| format!(r##"<a class="wd_category_link" href="#">{c}</a>"##))
            .collect::<String>();
        format!(
            r#"<html><body><div class="wd_news_body">{body}</div><div class="wd_category_link_list">{tags}</div></body></html>"#
        )
    }

    fn plugin() -> PluginDescriptor {
        PluginDescriptor::new("paypal-newsroom", "0.1.0")
    }

    fn zero_pacing() -> Pacing {
        Pacing {
            listing_settle: Duration::ZERO,
            detail_settle: Duration::ZERO,
            pagination_settle: Duration::ZERO,
            body_timeout: Duration::ZERO,
            consent_timeout: Duration::ZERO,
        }
    }

    fn navigations(events: &[SessionEvent]) -> usize {
        events
            .iter()
            .filter(|event| matches!(event, SessionEvent::Navigated(_)))
            .count()
    }

    #[tokio::test]
    async fn forwards_every_complete_item_and_exhausts_pagination() {
        let first = "https://newsroom.paypal-corp.com/2025-05-06-first";
        let second = "https://newsroom.paypal-corp.com/2025-05-01-second";
        let session = MemorySession::new()
            .with_page(
                HOST,
                listing(
                    &[card(
                        Some("First"),
                        Some("May 6, 2025"),
                        Some("Summary one"),
                        Some(first),
                    )],
                    Some(PAGE_2),
                ),
            )
            .with_page(
                PAGE_2,
                listing(
                    &[card(
                        Some("Second"),
                        Some("May 1, 2025"),
                        Some("Summary two"),
                        Some(second),
                    )],
                    None,
                ),
            )
            .with_page(first, article("Body one.", &["Company News", "Payments"]))
            .with_page(second, article("Body two.", &[]));

        let sink = Arc::new(MemorySink::new());
        let mut scraper =
            PayPalScraper::new(plugin(), Restrictions::default(), session, sink.clone())
                .with_pacing(zero_pacing());

        let outcome = scraper.parse().await.unwrap();
        assert_eq!(outcome, ParseOutcome::Exhausted);

        let documents = sink.documents();
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].title, "First");
        assert_eq!(documents[0].summary, "Summary one");
        assert_eq!(documents[0].text, "Body one.");
        assert_eq!(documents[0].link, first);
        assert_eq!(
            documents[0].categories,
            vec!["Company News".to_string(), "Payments".to_string()]
        );
        assert!(documents[0].loaded >= documents[0].published);
        assert!(documents[0].id.is_none());
        assert!(documents[0].storage.is_none());
        assert_eq!(documents[1].title, "Second");
        assert!(documents[1].categories.is_empty());

        // Every detail context was closed and focus returned to the root.
        let session = scraper.into_session();
        assert_eq!(session.open_contexts(), 1);
    }

    #[tokio::test]
    async fn drops_items_missing_date_or_link() {
        let complete = "https://newsroom.paypal-corp.com/2025-05-06-complete";
        let session = MemorySession::new()
            .with_page(
                HOST,
                listing(
                    &[
                        card(
                            Some("Complete"),
                            Some("May 6, 2025"),
                            Some("Kept"),
                            Some(complete),
                        ),
                        card(
                            Some("No date"),
                            None,
                            Some("Dropped"),
                            Some("https://newsroom.paypal-corp.com/ignored"),
                        ),
                        card(Some("No link"), Some("May 4, 2025"), Some("Dropped"), None),
                    ],
                    None,
                ),
            )
            .with_page(complete, article("Only body.", &[]));

        let sink = Arc::new(MemorySink::new());
        let mut scraper =
            PayPalScraper::new(plugin(), Restrictions::default(), session, sink.clone())
                .with_pacing(zero_pacing());

        // The run still ends through the pagination path, not an error.
        let outcome = scraper.parse().await.unwrap();
        assert_eq!(outcome, ParseOutcome::Exhausted);

        let documents = sink.documents();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].title, "Complete");
    }

    #[tokio::test]
    async fn unparseable_dates_drop_the_item_too() {
        let session = MemorySession::new().with_page(
            HOST,
            listing(
                &[card(
                    Some("Bad date"),
                    Some("sometime last week"),
                    Some("s"),
                    Some("https://newsroom.paypal-corp.com/ignored"),
                )],
                None,
            ),
        );

        let sink = Arc::new(MemorySink::new());
        let mut scraper =
            PayPalScraper::new(plugin(), Restrictions::default(), session, sink.clone())
                .with_pacing(zero_pacing());

        assert_eq!(scraper.parse().await.unwrap(), ParseOutcome::Exhausted);
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn missing_title_and_summary_get_placeholders() {
        let link = "https://newsroom.paypal-corp.com/2025-05-06-bare";
        let session = MemorySession::new()
            .with_page(
                HOST,
                listing(&[card(None, Some("May 6, 2025"), None, Some(link))], None),
            )
            .with_page(link, article("Bare body.", &[]));

        let sink = Arc::new(MemorySink::new());
        let mut scraper =
            PayPalScraper::new(plugin(), Restrictions::default(), session, sink.clone())
                .with_pacing(zero_pacing());

        scraper.parse().await.unwrap();
        let documents = sink.documents();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].title, " ");
        assert_eq!(documents[0].summary, "");
        assert_eq!(documents[0].text, "Bare body.");
    }

    #[tokio::test]
    async fn finishes_early_when_the_sink_reports_the_date_cutoff() {
        let cutoff = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();
        let fresh = "https://newsroom.paypal-corp.com/2025-05-06-fresh";
        let stale = "https://newsroom.paypal-corp.com/2025-04-20-stale";
        // PAGE_2 is deliberately unregistered: reaching it would fail the
        // test, proving no navigation happens after the cutoff.
        let session = MemorySession::new()
            .with_page(
                HOST,
                listing(
                    &[
                        card(Some("Fresh"), Some("May 6, 2025"), Some("s"), Some(fresh)),
                        card(Some("Stale"), Some("April 20, 2025"), Some("s"), Some(stale)),
                    ],
                    Some(PAGE_2),
                ),
            )
            .with_page(fresh, article("Fresh body.", &[]))
            .with_page(stale, article("Stale body.", &[]));

        let restrictions = Restrictions {
            from_date: Some(cutoff),
            max_documents: None,
        };
        let collected = Arc::new(MemorySink::new());
        let gate = Arc::new(RestrictionGate::new(collected.clone(), restrictions.clone()));
        let mut scraper = PayPalScraper::new(plugin(), restrictions, session, gate)
            .with_pacing(zero_pacing());
        let root = scraper.session().current_context();

        let outcome = scraper.parse().await.unwrap();
        assert_eq!(outcome, ParseOutcome::DateCutoff);
        assert_eq!(collected.len(), 1);
        assert_eq!(collected.documents()[0].title, "Fresh");

        let session = scraper.into_session();
        assert_eq!(session.current_context(), root);
        assert_eq!(session.open_contexts(), 1);

        let events = session.events();
        // Host listing plus two detail pages; nothing after the refusal.
        assert_eq!(navigations(events), 3);
        assert!(matches!(
            events[events.len() - 2],
            SessionEvent::ClosedContext(_)
        ));
        assert_eq!(events[events.len() - 1], SessionEvent::SwitchedContext(root));
    }

    #[tokio::test]
    async fn document_cap_stops_the_run_before_pagination() {
        let first = "https://newsroom.paypal-corp.com/2025-05-06-first";
        let second = "https://newsroom.paypal-corp.com/2025-05-05-second";
        let session = MemorySession::new()
            .with_page(
                HOST,
                listing(
                    &[
                        card(Some("First"), Some("May 6, 2025"), Some("s"), Some(first)),
                        card(Some("Second"), Some("May 5, 2025"), Some("s"), Some(second)),
                    ],
                    Some(PAGE_2),
                ),
            )
            .with_page(first, article("Body one.", &[]))
            .with_page(second, article("Body two.", &[]));

        let restrictions = Restrictions {
            from_date: None,
            max_documents: Some(1),
        };
        let sink = Arc::new(MemorySink::new());
        let mut scraper = PayPalScraper::new(plugin(), restrictions, session, sink.clone())
            .with_pacing(zero_pacing());

        let outcome = scraper.parse().await.unwrap();
        assert_eq!(outcome, ParseOutcome::DocumentCap);
        assert_eq!(sink.len(), 1);

        // The second card was never opened.
        let session = scraper.into_session();
        assert_eq!(navigations(session.events()), 2);
    }

    #[tokio::test]
    async fn consent_overlay_is_activated_when_present() {
        let link = "https://newsroom.paypal-corp.com/2025-05-06-story";
        let mut page = listing(
            &[card(Some("Story"), Some("May 6, 2025"), Some("s"), Some(link))],
            None,
        );
        page = page.replace(
            "<html><body>",
            r##"<html><body><a id="acceptAllButton" href="#">Accept all</a>"##,
        );
        let session = MemorySession::new()
            .with_page(HOST, page)
            .with_page(link, article("Story body.", &[]));

        let sink = Arc::new(MemorySink::new());
        let mut scraper =
            PayPalScraper::new(plugin(), Restrictions::default(), session, sink.clone())
                .with_pacing(zero_pacing());

        assert_eq!(scraper.parse().await.unwrap(), ParseOutcome::Exhausted);
        assert_eq!(sink.len(), 1);

        // Activation re-navigated the listing once.
        let session = scraper.into_session();
        assert!(session
            .events()
            .iter()
            .any(|event| matches!(event, SessionEvent::Navigated(url) if url == &format!("{HOST}#"))));
    }

    #[tokio::test]
    async fn propagates_when_the_listing_container_is_missing() {
        let session =
            MemorySession::new().with_page(HOST, "<html><body><p>maintenance</p></body></html>");

        let sink = Arc::new(MemorySink::new());
        let mut scraper =
            PayPalScraper::new(plugin(), Restrictions::default(), session, sink.clone())
                .with_pacing(zero_pacing());

        let outcome = scraper.parse().await;
        assert!(matches!(outcome, Err(Error::ElementNotFound { .. })));
        assert!(sink.is_empty());
    }

    #[test]
    fn source_names_the_newsroom() {
        let session = MemorySession::new();
        let sink = Arc::new(MemorySink::new());
        let scraper = PayPalScraper::new(plugin(), Restrictions::default(), session, sink);
        assert_eq!(scraper.source(), "PayPal Newsroom");
    }
}
