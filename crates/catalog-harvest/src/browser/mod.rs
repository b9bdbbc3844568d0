//! Browsing-context abstraction for driving a live catalog page.
//!
//! Defines the `PageDriver` and `RenderedItem` traits that abstract over
//! the browser engine (Chromium via chromiumoxide, or an in-memory fixture).

pub mod chromium;
pub mod fixture;

use anyhow::Result;
use async_trait::async_trait;

/// A single live page (tab) reused across targets.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Handle to one rendered listing card. Valid only until the next navigation.
    type Item: RenderedItem;

    /// Navigate to a URL with a timeout.
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<()>;
    /// Block until at least one element matches `selector`, or time out.
    async fn wait_for_selector(&self, selector: &str, timeout_ms: u64) -> Result<()>;
    /// All elements currently rendered that match `selector`, in DOM order.
    async fn query_all(&self, selector: &str) -> Result<Vec<Self::Item>>;
    /// Scroll the viewport to the bottom of the document.
    async fn scroll_to_bottom(&self) -> Result<()>;
    /// Bring one item into the viewport so lazy content hydrates.
    async fn scroll_into_view(&self, item: &Self::Item) -> Result<()>;
    /// Release the page.
    async fn close(self) -> Result<()>
    where
        Self: Sized;
}

/// Read access to one rendered listing card.
///
/// Missing elements and attributes are `Ok(None)`; only DOM access
/// failures are errors.
#[async_trait]
pub trait RenderedItem: Send + Sync {
    /// An attribute of the item element itself.
    async fn attribute(&self, name: &str) -> Result<Option<String>>;
    /// Rendered text of the first descendant matching `selector`.
    async fn text(&self, selector: &str) -> Result<Option<String>>;
    /// An attribute of the first descendant matching `selector`.
    async fn descendant_attribute(&self, selector: &str, name: &str) -> Result<Option<String>>;
}
