//! Incremental loader: scroll a virtualized listing until enough cards mount.
//!
//! Each poll counts the rendered cards. The loop stops when the count reaches
//! the target, or when the count has not grown for `stall_limit` consecutive
//! polls. A stalled stop is a normal outcome for short catalogs and returns
//! whatever is mounted.

use std::time::Duration;

use tokio::time::Instant;

use crate::browser::PageDriver;
use crate::config::HarvestConfig;
use crate::types::{HarvestError, HarvestResult};

/// Thresholds for one load.
#[derive(Debug, Clone)]
pub struct LoadPolicy {
    pub item_selector: String,
    pub target_count: usize,
    pub stall_limit: u32,
    /// Wait after each scroll for new items to mount.
    pub settle: Duration,
    pub max_duration: Option<Duration>,
}

impl LoadPolicy {
    pub fn from_config(config: &HarvestConfig) -> Self {
        Self {
            item_selector: config.selectors.card.clone(),
            target_count: config.target_count,
            stall_limit: config.stall_limit,
            settle: config.settle(),
            max_duration: config.max_load(),
        }
    }
}

/// Why the loader stopped polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The target count was reached.
    Reached,
    /// The count stopped growing.
    Stalled,
    /// `max_duration` elapsed first.
    TimedOut,
}

/// Items mounted at the final poll, in DOM order.
#[derive(Debug)]
pub struct LoadReport<I> {
    pub items: Vec<I>,
    pub polls: usize,
    pub reason: StopReason,
}

#[derive(Debug, Default)]
struct LoadState {
    previous_count: usize,
    stall_streak: u32,
}

impl LoadState {
    /// Record a poll and return the current stall streak.
    fn observe(&mut self, count: usize) -> u32 {
        if count == self.previous_count {
            self.stall_streak += 1;
        } else {
            self.stall_streak = 0;
            self.previous_count = count;
        }
        self.stall_streak
    }
}

/// Poll and scroll until the policy's stop condition holds.
///
/// Only a failed element query is an error. A failed scroll is logged and
/// the poll counts as usual, so a broken scroll ends in a stall.
pub async fn load_items<D: PageDriver>(
    driver: &D,
    policy: &LoadPolicy,
) -> HarvestResult<LoadReport<D::Item>> {
    let started = Instant::now();
    let mut state = LoadState::default();
    let mut polls = 0;

    loop {
        let mut items = driver
            .query_all(&policy.item_selector)
            .await
            .map_err(|e| HarvestError::Driver(format!("item query failed: {e:#}")))?;
        polls += 1;
        let count = items.len();
        tracing::debug!("Poll {polls}: {count} items rendered");

        if count >= policy.target_count {
            items.truncate(policy.target_count);
            return Ok(LoadReport {
                items,
                polls,
                reason: StopReason::Reached,
            });
        }

        let streak = state.observe(count);
        if streak >= policy.stall_limit {
            tracing::info!(
                "Item count stalled at {count} after {polls} polls (target {})",
                policy.target_count
            );
            return Ok(LoadReport {
                items,
                polls,
                reason: StopReason::Stalled,
            });
        }

        if let Some(max) = policy.max_duration {
            if started.elapsed() >= max {
                tracing::warn!("Load time cap of {max:?} hit with {count} items");
                return Ok(LoadReport {
                    items,
                    polls,
                    reason: StopReason::TimedOut,
                });
            }
        }

        if let Err(e) = driver.scroll_to_bottom().await {
            tracing::warn!("Scroll command failed: {e:#}");
        }
        if !policy.settle.is_zero() {
            tokio::time::sleep(policy.settle).await;
        }
    }
}
