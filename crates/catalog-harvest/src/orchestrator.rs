//! Harvest orchestration: navigate, load, extract, and persist each target in turn.
//!
//! Targets run strictly one after another on a single page. A target that
//! cannot be loaded, or whose item query fails, is skipped and nothing is
//! written for it; the run always moves on to the next target.

use std::path::PathBuf;

use crate::browser::PageDriver;
use crate::config::HarvestConfig;
use crate::extract::Extractor;
use crate::loader::{self, LoadPolicy, StopReason};
use crate::navigation::{self, NavigationPolicy};
use crate::sink::ResultSink;
use crate::types::{HarvestResult, ListingType, ProductRecord, Target};

/// What happened to one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetOutcome {
    Saved {
        path: PathBuf,
        records: usize,
        advertisements: usize,
        stop: StopReason,
    },
    Skipped {
        reason: String,
    },
    WriteFailed {
        reason: String,
    },
}

/// Outcome of one target within a run.
#[derive(Debug, Clone)]
pub struct TargetReport {
    pub target: Target,
    pub outcome: TargetOutcome,
}

/// Outcomes of a whole run, in harvest order.
#[derive(Debug, Clone, Default)]
pub struct HarvestSummary {
    pub reports: Vec<TargetReport>,
}

impl HarvestSummary {
    pub fn saved(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, TargetOutcome::Saved { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.reports.len() - self.saved()
    }

    pub fn total_records(&self) -> usize {
        self.reports
            .iter()
            .map(|r| match r.outcome {
                TargetOutcome::Saved { records, .. } => records,
                _ => 0,
            })
            .sum()
    }

    pub fn written_paths(&self) -> Vec<&PathBuf> {
        self.reports
            .iter()
            .filter_map(|r| match &r.outcome {
                TargetOutcome::Saved { path, .. } => Some(path),
                _ => None,
            })
            .collect()
    }
}

/// Drives one page through a list of targets and hands records to a sink.
pub struct Harvester<D: PageDriver, S: ResultSink> {
    driver: D,
    sink: S,
    config: HarvestConfig,
    extractor: Extractor,
    navigation: NavigationPolicy,
    load: LoadPolicy,
}

impl<D: PageDriver, S: ResultSink> Harvester<D, S> {
    pub fn new(driver: D, sink: S, config: HarvestConfig) -> Self {
        Self {
            extractor: Extractor::new(&config.selectors),
            navigation: NavigationPolicy::from_config(&config),
            load: LoadPolicy::from_config(&config),
            driver,
            sink,
            config,
        }
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Give back the driver and sink, e.g. to close the browser.
    pub fn into_parts(self) -> (D, S) {
        (self.driver, self.sink)
    }

    /// Harvest every configured target, brands first.
    pub async fn run_all(&mut self) -> HarvestSummary {
        let targets = self.config.targets();
        self.run(&targets).await
    }

    /// Harvest `targets` in order. Never aborts early.
    pub async fn run(&mut self, targets: &[Target]) -> HarvestSummary {
        let mut summary = HarvestSummary::default();
        let pause = self.config.between_targets();

        for (i, target) in targets.iter().enumerate() {
            tracing::info!(
                "[{}/{}] Harvesting {} {} ({})",
                i + 1,
                targets.len(),
                target.kind,
                target.label,
                target.url
            );

            let outcome = self.harvest_target(target).await;
            match &outcome {
                TargetOutcome::Saved {
                    path,
                    records,
                    advertisements,
                    ..
                } => tracing::info!(
                    "Saved {records} records ({advertisements} ads) to {}",
                    path.display()
                ),
                TargetOutcome::Skipped { reason } => {
                    tracing::warn!("Skipped {} {}: {reason}", target.kind, target.label)
                }
                TargetOutcome::WriteFailed { reason } => {
                    tracing::warn!("Could not save {} {}: {reason}", target.kind, target.label)
                }
            }

            summary.reports.push(TargetReport {
                target: target.clone(),
                outcome,
            });

            if i + 1 < targets.len() && !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
        }

        tracing::info!(
            "Run complete: {} saved, {} failed, {} records",
            summary.saved(),
            summary.failed(),
            summary.total_records()
        );
        summary
    }

    /// Navigate, load, extract, and persist a single target.
    pub async fn harvest_target(&mut self, target: &Target) -> TargetOutcome {
        if !navigation::load(&mut self.driver, target, &self.navigation).await {
            return TargetOutcome::Skipped {
                reason: format!("page did not load after {} attempts", self.navigation.attempts),
            };
        }

        let (records, stop) = match self.collect(target).await {
            Ok(collected) => collected,
            Err(e) => {
                return TargetOutcome::Skipped {
                    reason: e.to_string(),
                }
            }
        };

        let advertisements = records
            .iter()
            .filter(|r| r.listing_type == ListingType::Advertisement)
            .count();

        match self.sink.write(target, &records) {
            Ok(path) => TargetOutcome::Saved {
                path,
                records: records.len(),
                advertisements,
                stop,
            },
            Err(e) => TargetOutcome::WriteFailed {
                reason: e.to_string(),
            },
        }
    }

    /// Load items on the current page and extract one record per item.
    ///
    /// Item handles live only for the duration of this call.
    async fn collect(&self, target: &Target) -> HarvestResult<(Vec<ProductRecord>, StopReason)> {
        let settle = self.config.post_load_delay.for_kind(target.kind);
        if !settle.is_zero() {
            tokio::time::sleep(settle).await;
        }

        let report = loader::load_items(&self.driver, &self.load).await?;
        tracing::debug!(
            "Loaded {} items in {} polls ({:?})",
            report.items.len(),
            report.polls,
            report.reason
        );

        let hydrate = self.config.hydrate_delay();
        let mut records = Vec::with_capacity(report.items.len());
        for item in &report.items {
            if let Some(delay) = hydrate {
                if let Err(e) = self.driver.scroll_into_view(item).await {
                    tracing::debug!("Hydration scroll failed: {e:#}");
                }
                tokio::time::sleep(delay).await;
            }
            let record = self.extractor.extract(item, target.kind).await;
            if record.image_url.is_none() {
                tracing::debug!(
                    "No image for item {} ({})",
                    records.len() + 1,
                    record.product_name.as_deref().unwrap_or("unnamed")
                );
            }
            records.push(record);
        }

        Ok((records, report.reason))
    }
}
