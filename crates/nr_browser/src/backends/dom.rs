//! Static-DOM plumbing shared by the fetch and memory backends.
//!
//! Browsing contexts hold the raw HTML of their document; elements are
//! owned outer-HTML snapshots of the matched node. Snapshots keep every
//! handle free of the parsed tree, so nothing unsendable lives across an
//! await point and handles stay valid after the context navigates away.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use nr_core::{Error, Result};

use crate::ContextId;

/// An element snapshot: the outer HTML of the matched node.
#[derive(Debug, Clone)]
pub struct DomElement {
    outer: String,
}

impl DomElement {
    fn from_ref(element: ElementRef<'_>) -> Self {
        Self {
            outer: element.html(),
        }
    }

    pub(crate) fn outer_html(&self) -> &str {
        &self.outer
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| Error::Scraping(format!("Invalid selector `{selector}`: {e}")))
}

/// The element a fragment was snapshotted from.
fn fragment_root(fragment: &Html) -> Option<ElementRef<'_>> {
    fragment
        .root_element()
        .children()
        .filter_map(ElementRef::wrap)
        .next()
}

pub(crate) fn absolutize(base: &str, href: &str) -> Result<String> {
    if let Ok(absolute) = Url::parse(href) {
        return Ok(absolute.to_string());
    }
    let base = Url::parse(base)
        .map_err(|e| Error::Scraping(format!("Invalid base URL `{base}`: {e}")))?;
    let joined = base
        .join(href)
        .map_err(|e| Error::Scraping(format!("Cannot resolve `{href}` against `{base}`: {e}")))?;
    Ok(joined.to_string())
}

pub(crate) struct DomContext {
    pub id: ContextId,
    pub url: String,
    pub html: String,
}

/// The set of open browsing contexts and the cursor over them.
pub(crate) struct ContextSet {
    contexts: Vec<DomContext>,
    current: usize,
    next_id: u64,
}

impl ContextSet {
    pub fn new() -> Self {
        Self {
            contexts: vec![DomContext {
                id: ContextId(0),
                url: String::new(),
                html: String::new(),
            }],
            current: 0,
            next_id: 1,
        }
    }

    pub fn current(&self) -> &DomContext {
        &self.contexts[self.current]
    }

    pub fn current_id(&self) -> ContextId {
        self.contexts[self.current].id
    }

    pub fn count(&self) -> usize {
        self.contexts.len()
    }

    pub fn set_document(&mut self, url: String, html: String) {
        let context = &mut self.contexts[self.current];
        context.url = url;
        context.html = html;
    }

    pub fn open(&mut self) -> ContextId {
        let id = ContextId(self.next_id);
        self.next_id += 1;
        self.contexts.push(DomContext {
            id,
            url: String::new(),
            html: String::new(),
        });
        id
    }

    pub fn switch_to(&mut self, id: ContextId) -> Result<()> {
        let index = self
            .contexts
            .iter()
            .position(|context| context.id == id)
            .ok_or_else(|| Error::Browser(format!("unknown browsing context {id:?}")))?;
        self.current = index;
        Ok(())
    }

    /// Close the current context. The cursor falls back to the root; the
    /// caller is expected to switch explicitly afterwards.
    pub fn close_current(&mut self) -> Result<ContextId> {
        if self.contexts.len() == 1 {
            return Err(Error::Browser(
                "cannot close the last browsing context".to_string(),
            ));
        }
        let closed = self.contexts.remove(self.current);
        self.current = 0;
        Ok(closed.id)
    }

    pub fn find_one(&self, selector: &str) -> Result<DomElement> {
        let parsed = parse_selector(selector)?;
        let document = Html::parse_document(&self.current().html);
        document
            .select(&parsed)
            .next()
            .map(DomElement::from_ref)
            .ok_or_else(|| Error::ElementNotFound {
                selector: selector.to_string(),
            })
    }

    pub fn find_all(&self, selector: &str) -> Result<Vec<DomElement>> {
        let parsed = parse_selector(selector)?;
        let document = Html::parse_document(&self.current().html);
        Ok(document.select(&parsed).map(DomElement::from_ref).collect())
    }

    pub fn find_in(&self, element: &DomElement, selector: &str) -> Result<DomElement> {
        let parsed = parse_selector(selector)?;
        let fragment = Html::parse_fragment(element.outer_html());
        fragment
            .select(&parsed)
            .next()
            .map(DomElement::from_ref)
            .ok_or_else(|| Error::ElementNotFound {
                selector: selector.to_string(),
            })
    }

    pub fn find_all_in(&self, element: &DomElement, selector: &str) -> Result<Vec<DomElement>> {
        let parsed = parse_selector(selector)?;
        let fragment = Html::parse_fragment(element.outer_html());
        Ok(fragment.select(&parsed).map(DomElement::from_ref).collect())
    }

    pub fn text(&self, element: &DomElement) -> Result<String> {
        let fragment = Html::parse_fragment(element.outer_html());
        Ok(fragment
            .root_element()
            .text()
            .collect::<String>()
            .trim()
            .to_string())
    }

    pub fn attribute(&self, element: &DomElement, name: &str) -> Result<Option<String>> {
        let fragment = Html::parse_fragment(element.outer_html());
        Ok(fragment_root(&fragment)
            .and_then(|root| root.value().attr(name))
            .map(str::to_string))
    }

    /// The navigation target a script-level activation of `element` would
    /// reach: its own `href`, or the first descendant anchor's, resolved
    /// against the current document URL.
    pub fn resolve_href(&self, element: &DomElement) -> Result<String> {
        let fragment = Html::parse_fragment(element.outer_html());
        let own = fragment_root(&fragment)
            .and_then(|root| root.value().attr("href"))
            .map(str::to_string);
        let target = match own {
            Some(href) => href,
            None => {
                let anchors = parse_selector("a[href]")?;
                fragment
                    .select(&anchors)
                    .next()
                    .and_then(|anchor| anchor.value().attr("href"))
                    .map(str::to_string)
                    .ok_or_else(|| {
                        Error::Scraping("element has no activatable link".to_string())
                    })?
            }
        };
        absolutize(&self.current().url, &target)
    }
}
