//! Sponsored vs organic classification of a listing card.

use crate::browser::RenderedItem;
use crate::types::ListingType;

/// Looks for an ad watermark on a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classifier {
    watermark: String,
    marker: String,
}

impl Classifier {
    pub fn new(watermark_selector: &str, marker: &str) -> Self {
        Self {
            watermark: watermark_selector.to_string(),
            marker: marker.to_string(),
        }
    }

    /// `Advertisement` only when the watermark exists and its text contains
    /// the marker (substring, case-sensitive). Anything else, including a
    /// failed lookup, is `Organic`.
    pub async fn classify<I: RenderedItem>(&self, item: &I) -> ListingType {
        match item.text(&self.watermark).await {
            Ok(Some(text)) if text.contains(&self.marker) => ListingType::Advertisement,
            Ok(_) => ListingType::Organic,
            Err(e) => {
                tracing::debug!("Watermark lookup failed, treating as organic: {e:#}");
                ListingType::Organic
            }
        }
    }
}
