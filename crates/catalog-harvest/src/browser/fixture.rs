//! In-memory page driver for offline replays and tests.
//!
//! A `FixtureSite` holds recorded listing pages keyed by URL. Each page
//! scripts how many cards are visible after load, how many more mount per
//! scroll, and how many navigations fail before the page loads. Descendant
//! selectors are matched by exact key, not parsed as CSS.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{PageDriver, RenderedItem};
use crate::types::{HarvestError, HarvestResult};

/// One descendant element of a fixture card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureNode {
    pub text: Option<String>,
    pub attributes: BTreeMap<String, String>,
    /// Simulate a DOM access failure on every read of this node.
    pub broken: bool,
}

impl FixtureNode {
    pub fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Self::default()
        }
    }

    pub fn attr(name: &str, value: &str) -> Self {
        Self::default().with_attr(name, value)
    }

    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }
}

/// One recorded listing card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureCard {
    pub attributes: BTreeMap<String, String>,
    /// Descendants keyed by the selector that locates them.
    pub nodes: BTreeMap<String, FixtureNode>,
}

impl FixtureCard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_node(mut self, selector: &str, node: FixtureNode) -> Self {
        self.nodes.insert(selector.to_string(), node);
        self
    }

    pub fn with_text(self, selector: &str, text: &str) -> Self {
        self.with_node(selector, FixtureNode::text(text))
    }
}

/// A recorded listing page and its rendering script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixturePage {
    pub cards: Vec<FixtureCard>,
    /// Cards mounted right after navigation. `None` mounts all of them.
    pub initial: Option<usize>,
    /// Cards mounted by each scroll to the bottom.
    pub per_scroll: usize,
    /// Navigations that fail before this page loads.
    pub failures_before_load: usize,
}

impl FixturePage {
    pub fn new(cards: Vec<FixtureCard>) -> Self {
        Self {
            cards,
            ..Self::default()
        }
    }

    /// Mount `initial` cards on load and `per_scroll` more per scroll.
    pub fn progressive(mut self, initial: usize, per_scroll: usize) -> Self {
        self.initial = Some(initial);
        self.per_scroll = per_scroll;
        self
    }

    pub fn failing(mut self, failures: usize) -> Self {
        self.failures_before_load = failures;
        self
    }
}

/// A set of recorded pages acting as a single browser tab.
#[derive(Debug, Default)]
pub struct FixtureSite {
    pages: BTreeMap<String, FixturePage>,
    current: Option<String>,
    mounted: AtomicUsize,
    attempts: HashMap<String, usize>,
    polls: AtomicUsize,
    scrolls: AtomicUsize,
}

impl FixtureSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, page: FixturePage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    /// Load a site from a JSON map of URL → page.
    pub fn load(path: &Path) -> HarvestResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let pages: BTreeMap<String, FixturePage> = serde_json::from_str(&raw)?;
        if pages.is_empty() {
            return Err(HarvestError::Config(format!(
                "fixture {} contains no pages",
                path.display()
            )));
        }
        Ok(Self {
            pages,
            ..Self::default()
        })
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.pages.keys().map(String::as_str)
    }

    /// Navigation attempts made against `url` so far.
    pub fn attempts(&self, url: &str) -> usize {
        self.attempts.get(url).copied().unwrap_or(0)
    }

    /// Total `query_all` calls since creation.
    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::Relaxed)
    }

    /// Total scroll-to-bottom commands since creation.
    pub fn scrolls(&self) -> usize {
        self.scrolls.load(Ordering::Relaxed)
    }

    fn current_page(&self) -> Result<&FixturePage> {
        let url = self.current.as_deref().ok_or_else(|| anyhow!("no page loaded"))?;
        self.pages
            .get(url)
            .ok_or_else(|| anyhow!("no fixture for {url}"))
    }
}

#[async_trait]
impl PageDriver for FixtureSite {
    type Item = FixtureItem;

    async fn navigate(&mut self, url: &str, _timeout_ms: u64) -> Result<()> {
        let attempt = self.attempts.entry(url.to_string()).or_insert(0);
        *attempt += 1;
        let attempt = *attempt;

        self.current = None;
        self.mounted.store(0, Ordering::Relaxed);

        let Some(page) = self.pages.get(url) else {
            bail!("net::ERR_NAME_NOT_RESOLVED at {url}");
        };
        if attempt <= page.failures_before_load {
            bail!("navigation timed out (scripted failure {attempt})");
        }

        let initial = page.initial.unwrap_or(page.cards.len()).min(page.cards.len());
        self.mounted.store(initial, Ordering::Relaxed);
        self.current = Some(url.to_string());
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, timeout_ms: u64) -> Result<()> {
        let page = self.current_page()?;
        if page.cards.is_empty() || self.mounted.load(Ordering::Relaxed) == 0 {
            bail!("selector {selector:?} did not appear within {timeout_ms}ms");
        }
        Ok(())
    }

    async fn query_all(&self, _selector: &str) -> Result<Vec<FixtureItem>> {
        self.polls.fetch_add(1, Ordering::Relaxed);
        let page = self.current_page()?;
        let mounted = self.mounted.load(Ordering::Relaxed);
        Ok(page.cards[..mounted]
            .iter()
            .map(|card| FixtureItem(Arc::new(card.clone())))
            .collect())
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        self.scrolls.fetch_add(1, Ordering::Relaxed);
        let page = self.current_page()?;
        let mounted = self.mounted.load(Ordering::Relaxed);
        let next = (mounted + page.per_scroll).min(page.cards.len());
        self.mounted.store(next, Ordering::Relaxed);
        Ok(())
    }

    async fn scroll_into_view(&self, _item: &FixtureItem) -> Result<()> {
        self.current_page().map(|_| ())
    }

    async fn close(self) -> Result<()> {
        Ok(())
    }
}

/// A handle to one fixture card.
#[derive(Debug, Clone)]
pub struct FixtureItem(Arc<FixtureCard>);

impl FixtureItem {
    pub fn new(card: FixtureCard) -> Self {
        Self(Arc::new(card))
    }

    fn node(&self, selector: &str) -> Result<Option<&FixtureNode>> {
        match self.0.nodes.get(selector) {
            Some(node) if node.broken => bail!("stale element reference: {selector}"),
            other => Ok(other),
        }
    }
}

#[async_trait]
impl RenderedItem for FixtureItem {
    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        Ok(self.0.attributes.get(name).cloned())
    }

    async fn text(&self, selector: &str) -> Result<Option<String>> {
        Ok(self.node(selector)?.map(|n| n.text.clone().unwrap_or_default()))
    }

    async fn descendant_attribute(&self, selector: &str, name: &str) -> Result<Option<String>> {
        Ok(self.node(selector)?.and_then(|n| n.attributes.get(name).cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cards(n: usize) -> Vec<FixtureCard> {
        (0..n)
            .map(|i| FixtureCard::new().with_attr("id", &i.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_progressive_mounting() {
        let mut site = FixtureSite::new()
            .with_page("https://shop.test/a", FixturePage::new(cards(25)).progressive(10, 10));
        site.navigate("https://shop.test/a", 1000).await.unwrap();

        assert_eq!(site.query_all("li").await.unwrap().len(), 10);
        site.scroll_to_bottom().await.unwrap();
        assert_eq!(site.query_all("li").await.unwrap().len(), 20);
        site.scroll_to_bottom().await.unwrap();
        site.scroll_to_bottom().await.unwrap();
        assert_eq!(site.query_all("li").await.unwrap().len(), 25);
        assert_eq!(site.polls(), 3);
        assert_eq!(site.scrolls(), 3);
    }

    #[tokio::test]
    async fn test_scripted_failures_then_load() {
        let mut site = FixtureSite::new()
            .with_page("https://shop.test/a", FixturePage::new(cards(3)).failing(2));
        assert!(site.navigate("https://shop.test/a", 1000).await.is_err());
        assert!(site.navigate("https://shop.test/a", 1000).await.is_err());
        assert!(site.navigate("https://shop.test/a", 1000).await.is_ok());
        assert_eq!(site.attempts("https://shop.test/a"), 3);
        assert!(site.wait_for_selector("li", 1000).await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_url_fails() {
        let mut site = FixtureSite::new();
        assert!(site.navigate("https://shop.test/missing", 1000).await.is_err());
        assert!(site.query_all("li").await.is_err());
    }

    #[tokio::test]
    async fn test_item_reads() {
        let item = FixtureItem::new(
            FixtureCard::new()
                .with_attr("id", "7")
                .with_text(".brand", "Puma")
                .with_node("img", FixtureNode::attr("src", "https://img.test/7.jpg"))
                .with_node(".broken", FixtureNode::broken()),
        );
        assert_eq!(item.attribute("id").await.unwrap().as_deref(), Some("7"));
        assert_eq!(item.text(".brand").await.unwrap().as_deref(), Some("Puma"));
        assert_eq!(item.text(".missing").await.unwrap(), None);
        assert_eq!(
            item.descendant_attribute("img", "src").await.unwrap().as_deref(),
            Some("https://img.test/7.jpg")
        );
        assert_eq!(item.descendant_attribute("img", "data-src").await.unwrap(), None);
        assert!(item.text(".broken").await.is_err());
    }

    #[test]
    fn test_load_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.json");
        std::fs::write(
            &path,
            r#"{"https://shop.test/nike": {"cards": [{"attributes": {"id": "1"},
                "nodes": {".product-brand": {"text": "Nike"}}}], "per_scroll": 5}}"#,
        )
        .unwrap();

        let site = FixtureSite::load(&path).unwrap();
        assert_eq!(site.urls().collect::<Vec<_>>(), vec!["https://shop.test/nike"]);
    }
}
