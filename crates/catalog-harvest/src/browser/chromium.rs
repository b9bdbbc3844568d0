//! Chromium-based page driver using chromiumoxide.

use super::{PageDriver, RenderedItem};
use crate::config::BrowserOptions;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(250);

const SCROLL_TO_BOTTOM_JS: &str = "window.scrollTo(0, document.body.scrollHeight)";

/// Find the Chromium binary path.
pub fn find_chromium(explicit: Option<&PathBuf>) -> Option<PathBuf> {
    // 1. Configured path
    if let Some(path) = explicit {
        if path.exists() {
            return Some(path.clone());
        }
    }

    // 2. CATALOG_HARVEST_CHROMIUM env
    if let Ok(p) = std::env::var("CATALOG_HARVEST_CHROMIUM") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 3. System PATH
    for name in ["google-chrome", "chromium", "chromium-browser", "chrome"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 4. Common macOS location
    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// One Chromium tab, reused for every target of a run.
pub struct ChromiumDriver {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromiumDriver {
    /// Launch Chromium and open a blank page.
    pub async fn launch(options: &BrowserOptions) -> Result<Self> {
        let chrome_path = find_chromium(options.executable.as_ref())
            .context("Chromium not found. Set browser.executable or CATALOG_HARVEST_CHROMIUM.")?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .window_size(options.window_width, options.window_height)
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled");
        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(ua) = &options.user_agent {
            builder = builder.arg(format!("--user-agent={ua}"));
        }
        for arg in &options.args {
            builder = builder.arg(arg.as_str());
        }
        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("CDP handler event error: {e}");
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .context("failed to create new page")?;

        tracing::info!("Chromium launched (headless: {})", options.headless);

        Ok(Self {
            browser,
            page,
            handler,
        })
    }
}

#[async_trait]
impl PageDriver for ChromiumDriver {
    type Item = ChromiumItem;

    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<()> {
        let result =
            tokio::time::timeout(Duration::from_millis(timeout_ms), self.page.goto(url)).await;

        match result {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => bail!("navigation failed: {e}"),
            Err(_) => bail!("navigation timed out after {timeout_ms}ms"),
        }
    }

    async fn wait_for_selector(&self, selector: &str, timeout_ms: u64) -> Result<()> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            // Lookup errors while the document is still settling are retried
            if let Ok(found) = self.page.find_elements(selector).await {
                if !found.is_empty() {
                    return Ok(());
                }
            }
            if Instant::now() >= deadline {
                bail!("selector {selector:?} did not appear within {timeout_ms}ms");
            }
            tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
        }
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<ChromiumItem>> {
        let elements = self
            .page
            .find_elements(selector)
            .await
            .with_context(|| format!("failed to query {selector:?}"))?;
        Ok(elements.into_iter().map(ChromiumItem).collect())
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        self.page
            .evaluate(SCROLL_TO_BOTTOM_JS)
            .await
            .context("scroll script failed")?;
        Ok(())
    }

    async fn scroll_into_view(&self, item: &ChromiumItem) -> Result<()> {
        item.0
            .scroll_into_view()
            .await
            .context("scroll into view failed")?;
        Ok(())
    }

    async fn close(self) -> Result<()> {
        let _ = self.page.close().await;
        let mut browser = self.browser;
        let _ = browser.close().await;
        let _ = browser.wait().await;
        self.handler.abort();
        Ok(())
    }
}

/// A listing card element inside the Chromium page.
pub struct ChromiumItem(Element);

impl ChromiumItem {
    async fn first(&self, selector: &str) -> Result<Option<Element>> {
        let mut found = self
            .0
            .find_elements(selector)
            .await
            .with_context(|| format!("failed to query {selector:?}"))?;
        if found.is_empty() {
            return Ok(None);
        }
        Ok(Some(found.swap_remove(0)))
    }
}

#[async_trait]
impl RenderedItem for ChromiumItem {
    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        self.0
            .attribute(name)
            .await
            .with_context(|| format!("failed to read attribute {name:?}"))
    }

    async fn text(&self, selector: &str) -> Result<Option<String>> {
        match self.first(selector).await? {
            Some(el) => el.inner_text().await.context("failed to read inner text"),
            None => Ok(None),
        }
    }

    async fn descendant_attribute(&self, selector: &str, name: &str) -> Result<Option<String>> {
        match self.first(selector).await? {
            Some(el) => el
                .attribute(name)
                .await
                .with_context(|| format!("failed to read attribute {name:?}")),
            None => Ok(None),
        }
    }
}
