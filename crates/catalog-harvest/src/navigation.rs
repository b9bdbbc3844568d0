//! Navigation controller: load a target page, retrying transient failures.

use std::time::Duration;

use crate::browser::PageDriver;
use crate::config::HarvestConfig;
use crate::types::Target;

/// Retry policy for loading one target.
#[derive(Debug, Clone)]
pub struct NavigationPolicy {
    /// Total attempts, including the first.
    pub attempts: u32,
    pub cooldown: Duration,
    pub navigation_timeout_ms: u64,
    pub selector_timeout_ms: u64,
    /// Selector whose first match signals that listing content has rendered.
    pub ready_selector: String,
}

impl NavigationPolicy {
    pub fn from_config(config: &HarvestConfig) -> Self {
        Self {
            attempts: config.retry_budget,
            cooldown: config.cooldown(),
            navigation_timeout_ms: config.navigation_timeout_ms,
            selector_timeout_ms: config.selector_timeout_ms,
            ready_selector: config.selectors.card.clone(),
        }
    }
}

/// Drive the page to `target.url` and wait for the first listing card.
///
/// Returns `false` once the retry budget is spent; the caller skips the target.
pub async fn load<D: PageDriver>(
    driver: &mut D,
    target: &Target,
    policy: &NavigationPolicy,
) -> bool {
    let attempts = policy.attempts.max(1);

    for attempt in 1..=attempts {
        match try_load(driver, target, policy).await {
            Ok(()) => {
                tracing::debug!("Loaded {} on attempt {attempt}/{attempts}", target.url);
                return true;
            }
            Err(e) => {
                tracing::warn!(
                    "Load failed for {} ({attempt}/{attempts}): {e:#}",
                    target.url
                );
                if attempt < attempts && !policy.cooldown.is_zero() {
                    tokio::time::sleep(policy.cooldown).await;
                }
            }
        }
    }

    tracing::error!(
        "Giving up on {} {} after {attempts} attempts",
        target.kind,
        target.label
    );
    false
}

async fn try_load<D: PageDriver>(
    driver: &mut D,
    target: &Target,
    policy: &NavigationPolicy,
) -> anyhow::Result<()> {
    driver.navigate(&target.url, policy.navigation_timeout_ms).await?;
    driver
        .wait_for_selector(&policy.ready_selector, policy.selector_timeout_ms)
        .await
}
