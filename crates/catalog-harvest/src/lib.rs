//! Catalog Harvest: drive an infinite-scroll catalog page, extract listing cards, write CSV.

pub mod browser;
pub mod classify;
pub mod config;
pub mod extract;
pub mod loader;
pub mod navigation;
pub mod orchestrator;
pub mod sink;
pub mod types;

pub use browser::chromium::ChromiumDriver;
pub use browser::fixture::FixtureSite;
pub use browser::{PageDriver, RenderedItem};
pub use classify::Classifier;
pub use config::{BrowserOptions, CardSelectors, HarvestConfig};
pub use extract::{Extractor, Refine, Rule, Source};
pub use loader::{load_items, LoadPolicy, LoadReport, StopReason};
pub use navigation::{load, NavigationPolicy};
pub use orchestrator::{HarvestSummary, Harvester, TargetOutcome, TargetReport};
pub use sink::{list_outputs, read_records, CsvSink, OutputFile, ResultSink};
pub use types::*;
