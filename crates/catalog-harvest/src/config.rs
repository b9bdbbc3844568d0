//! Harvest configuration: target tables, card selectors, and loop thresholds.
//!
//! The whole configuration is a single value injected into the
//! [`Harvester`](crate::orchestrator::Harvester). It deserializes from JSON
//! with every field optional, falling back to the defaults below.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{CategoryKind, HarvestError, HarvestResult, Target};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// A labelled listing page URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub label: String,
    pub url: String,
}

impl CatalogEntry {
    pub fn new(label: &str, url: &str) -> Self {
        Self {
            label: label.to_string(),
            url: url.to_string(),
        }
    }
}

/// Ordered listing pages per category kind.
///
/// A kind missing from a configured catalog has no targets. The built-in
/// tables apply only when the whole `catalog` section is absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub brand: Vec<CatalogEntry>,
    #[serde(default)]
    pub keyword: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn entries(&self, kind: CategoryKind) -> &[CatalogEntry] {
        match kind {
            CategoryKind::Brand => &self.brand,
            CategoryKind::Keyword => &self.keyword,
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        let brand = ["levis", "puma", "nike", "adidas", "hrx"]
            .iter()
            .map(|b| CatalogEntry::new(b, &format!("https://www.myntra.com/{b}")))
            .collect();
        let keyword = ["tshirt", "shoes", "jeans", "dresses", "jackets"]
            .iter()
            .map(|k| CatalogEntry::new(k, &format!("https://www.myntra.com/{k}?rawQuery={k}")))
            .collect();
        Self { brand, keyword }
    }
}

/// CSS selectors and markers describing one listing card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardSelectors {
    pub card: String,
    /// Attribute on the card element carrying its native identifier.
    pub id_attribute: String,
    pub brand: String,
    pub name: String,
    pub picture_source: String,
    pub image: String,
    pub discounted_price: String,
    pub list_price: String,
    pub mrp: String,
    pub discount: String,
    pub rating: String,
    pub comment_count: String,
    pub comment_delimiter: char,
    pub watermark: String,
    pub ad_marker: String,
}

impl Default for CardSelectors {
    fn default() -> Self {
        Self {
            card: "li.product-base".into(),
            id_attribute: "id".into(),
            brand: ".product-brand".into(),
            name: ".product-product".into(),
            picture_source: "picture source".into(),
            image: "img".into(),
            discounted_price: ".product-discountedPrice".into(),
            list_price: ".product-price".into(),
            mrp: ".product-strike".into(),
            discount: ".product-discountPercentage".into(),
            rating: ".product-ratingsContainer span".into(),
            comment_count: ".product-ratingsCount".into(),
            comment_delimiter: '|',
            watermark: ".product-waterMark".into(),
            ad_marker: "AD".into(),
        }
    }
}

/// Pause after a successful navigation before scrolling starts, per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostLoadDelay {
    pub brand_ms: u64,
    pub keyword_ms: u64,
}

impl PostLoadDelay {
    pub fn for_kind(&self, kind: CategoryKind) -> Duration {
        Duration::from_millis(match kind {
            CategoryKind::Brand => self.brand_ms,
            CategoryKind::Keyword => self.keyword_ms,
        })
    }
}

impl Default for PostLoadDelay {
    fn default() -> Self {
        Self {
            brand_ms: 4000,
            keyword_ms: 3000,
        }
    }
}

/// Browser launch options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserOptions {
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub user_agent: Option<String>,
    pub args: Vec<String>,
    pub executable: Option<PathBuf>,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1280,
            window_height: 900,
            user_agent: Some(DEFAULT_USER_AGENT.to_string()),
            args: vec!["--disable-http2".to_string()],
            executable: None,
        }
    }
}

/// Everything a harvest run needs besides the browser and the sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    pub catalog: Catalog,
    pub selectors: CardSelectors,
    /// Items to collect per target.
    pub target_count: usize,
    /// Consecutive no-growth polls tolerated before the loader gives up.
    pub stall_limit: u32,
    /// Total navigation attempts per target.
    pub retry_budget: u32,
    pub cooldown_ms: u64,
    pub navigation_timeout_ms: u64,
    pub selector_timeout_ms: u64,
    /// Wait after each scroll for new cards to mount.
    pub settle_ms: u64,
    pub post_load_delay: PostLoadDelay,
    /// Per-card scroll-into-view pause before extraction. Zero disables it.
    pub hydrate_delay_ms: u64,
    pub between_targets_ms: u64,
    /// Optional wall-clock cap on one target's scroll loop.
    pub max_load_ms: Option<u64>,
    pub output_dir: PathBuf,
    pub browser: BrowserOptions,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            catalog: Catalog::default(),
            selectors: CardSelectors::default(),
            target_count: 40,
            stall_limit: 6,
            retry_budget: 3,
            cooldown_ms: 6000,
            navigation_timeout_ms: 90_000,
            selector_timeout_ms: 20_000,
            settle_ms: 2000,
            post_load_delay: PostLoadDelay::default(),
            hydrate_delay_ms: 800,
            between_targets_ms: 0,
            max_load_ms: None,
            output_dir: PathBuf::from("outputs"),
            browser: BrowserOptions::default(),
        }
    }
}

impl HarvestConfig {
    /// Load and validate a JSON config file.
    pub fn load(path: &Path) -> HarvestResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            HarvestError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the harvest loop cannot run with.
    pub fn validate(&self) -> HarvestResult<()> {
        if self.target_count == 0 {
            return Err(HarvestError::Config("target_count must be at least 1".into()));
        }
        if self.retry_budget == 0 {
            return Err(HarvestError::Config("retry_budget must be at least 1".into()));
        }
        if self.selectors.card.trim().is_empty() {
            return Err(HarvestError::Config("selectors.card must not be empty".into()));
        }
        // An empty marker is a substring of every watermark
        if self.selectors.ad_marker.is_empty() {
            return Err(HarvestError::Config("selectors.ad_marker must not be empty".into()));
        }
        for kind in CategoryKind::ALL {
            let mut seen = HashSet::new();
            for entry in self.catalog.entries(kind) {
                if entry.label.trim().is_empty() {
                    return Err(HarvestError::Config(format!("empty {kind} label")));
                }
                // Labels become file names inside output_dir
                if entry.label.contains(['/', '\\', '\0']) {
                    return Err(HarvestError::Config(format!(
                        "{kind} label {:?} must not contain path separators",
                        entry.label
                    )));
                }
                if !seen.insert(entry.label.as_str()) {
                    return Err(HarvestError::Config(format!(
                        "duplicate {kind} label: {}",
                        entry.label
                    )));
                }
            }
        }
        Ok(())
    }

    /// All targets: the brand group, then the keyword group, each in declaration order.
    pub fn targets(&self) -> Vec<Target> {
        CategoryKind::ALL
            .iter()
            .flat_map(|kind| self.targets_of(*kind))
            .collect()
    }

    pub fn targets_of(&self, kind: CategoryKind) -> Vec<Target> {
        self.catalog
            .entries(kind)
            .iter()
            .map(|e| Target::new(kind, e.label.clone(), e.url.clone()))
            .collect()
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn hydrate_delay(&self) -> Option<Duration> {
        (self.hydrate_delay_ms > 0).then(|| Duration::from_millis(self.hydrate_delay_ms))
    }

    pub fn between_targets(&self) -> Duration {
        Duration::from_millis(self.between_targets_ms)
    }

    pub fn max_load(&self) -> Option<Duration> {
        self.max_load_ms.map(Duration::from_millis)
    }
}
