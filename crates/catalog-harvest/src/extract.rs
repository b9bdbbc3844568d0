//! Field extraction from one rendered listing card.
//!
//! Every field resolves through an ordered chain of [`Rule`]s. The first rule
//! yielding a non-empty value wins; an exhausted chain leaves the field null.
//! A rule that fails to read the DOM is logged and skipped, so one bad field
//! never affects the others.

use crate::browser::RenderedItem;
use crate::classify::Classifier;
use crate::config::CardSelectors;
use crate::types::{CategoryKind, Field, ProductRecord};

/// Where a rule reads its raw value from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// An attribute of the card element itself.
    Attribute(String),
    /// Rendered text of the first matching descendant.
    Text(String),
    /// An attribute of the first matching descendant.
    DescendantAttribute { selector: String, name: String },
}

/// How a raw value is cleaned before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refine {
    Trim,
    /// Text before the first whitespace, e.g. the URL of a `srcset` candidate.
    FirstToken,
    /// Remove every occurrence of the delimiter, then trim.
    StripDelimiter(char),
}

impl Refine {
    /// Apply to a raw value; empty results are `None`.
    pub fn apply(&self, raw: &str) -> Option<String> {
        let refined = match self {
            Refine::Trim => raw.trim().to_string(),
            Refine::FirstToken => raw.split_whitespace().next().unwrap_or_default().to_string(),
            Refine::StripDelimiter(delim) => raw.replace(*delim, "").trim().to_string(),
        };
        (!refined.is_empty()).then_some(refined)
    }
}

/// One extraction step in a field's fallback chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub source: Source,
    pub refine: Refine,
}

impl Rule {
    pub fn attribute(name: &str) -> Self {
        Self {
            source: Source::Attribute(name.to_string()),
            refine: Refine::Trim,
        }
    }

    pub fn text(selector: &str) -> Self {
        Self {
            source: Source::Text(selector.to_string()),
            refine: Refine::Trim,
        }
    }

    pub fn descendant_attribute(selector: &str, name: &str) -> Self {
        Self {
            source: Source::DescendantAttribute {
                selector: selector.to_string(),
                name: name.to_string(),
            },
            refine: Refine::Trim,
        }
    }

    pub fn refined(mut self, refine: Refine) -> Self {
        self.refine = refine;
        self
    }

    /// Evaluate against one item. Read failures propagate to the chain.
    pub async fn evaluate<I: RenderedItem>(&self, item: &I) -> anyhow::Result<Option<String>> {
        let raw = match &self.source {
            Source::Attribute(name) => item.attribute(name).await?,
            Source::Text(selector) => item.text(selector).await?,
            Source::DescendantAttribute { selector, name } => {
                item.descendant_attribute(selector, name).await?
            }
        };
        Ok(raw.and_then(|r| self.refine.apply(&r)))
    }
}

/// Resolve a chain: first non-empty value, or `None`.
pub async fn resolve<I: RenderedItem>(item: &I, field: Field, rules: &[Rule]) -> Option<String> {
    for rule in rules {
        match rule.evaluate(item).await {
            Ok(Some(value)) => return Some(value),
            Ok(None) => {}
            Err(e) => tracing::debug!("{} rule {:?} failed: {e:#}", field.name(), rule.source),
        }
    }
    None
}

/// Builds product records from rendered cards.
#[derive(Debug, Clone)]
pub struct Extractor {
    chains: Vec<(Field, Vec<Rule>)>,
    classifier: Classifier,
}

impl Extractor {
    pub fn new(selectors: &CardSelectors) -> Self {
        let s = selectors;
        let chains = Field::ALL
            .iter()
            .map(|field| {
                let rules = match field {
                    Field::ProductId => vec![Rule::attribute(&s.id_attribute)],
                    Field::Brand => vec![Rule::text(&s.brand)],
                    Field::ProductName => vec![Rule::text(&s.name)],
                    Field::ImageUrl => vec![
                        Rule::descendant_attribute(&s.picture_source, "srcset")
                            .refined(Refine::FirstToken),
                        Rule::descendant_attribute(&s.image, "src"),
                        Rule::descendant_attribute(&s.image, "data-src"),
                        Rule::descendant_attribute(&s.image, "data-srcset"),
                    ],
                    Field::SellingPrice => {
                        vec![Rule::text(&s.discounted_price), Rule::text(&s.list_price)]
                    }
                    Field::MrpPrice => vec![Rule::text(&s.mrp)],
                    Field::DiscountPercent => vec![Rule::text(&s.discount)],
                    Field::Rating => vec![Rule::text(&s.rating)],
                    Field::CommentCount => vec![Rule::text(&s.comment_count)
                        .refined(Refine::StripDelimiter(s.comment_delimiter))],
                };
                (*field, rules)
            })
            .collect();

        Self {
            chains,
            classifier: Classifier::new(&s.watermark, &s.ad_marker),
        }
    }

    /// The fallback chain configured for `field`.
    pub fn rules(&self, field: Field) -> &[Rule] {
        self.chains
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, rules)| rules.as_slice())
            .unwrap_or_default()
    }

    /// Extract one record. Never fails: unreadable fields are left null.
    pub async fn extract<I: RenderedItem>(
        &self,
        item: &I,
        source_page: CategoryKind,
    ) -> ProductRecord {
        let listing_type = self.classifier.classify(item).await;
        let mut record = ProductRecord::empty(listing_type, source_page);
        for (field, rules) in &self.chains {
            record.set(*field, resolve(item, *field, rules).await);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fixture::{FixtureCard, FixtureItem, FixtureNode};
    use crate::types::ListingType;

    fn extractor() -> Extractor {
        Extractor::new(&CardSelectors::default())
    }

    fn full_card() -> FixtureCard {
        FixtureCard::new()
            .with_attr("id", "30125114")
            .with_text(".product-brand", "  Nike ")
            .with_text(".product-product", "Men Revolution 7 Running Shoes")
            .with_node(
                "picture source",
                FixtureNode::attr(
                    "srcset",
                    "https://img.test/w_210/shoe.webp 1x, https://img.test/w_420/shoe.webp 2x",
                ),
            )
            .with_node("img", FixtureNode::attr("src", "https://img.test/plain.jpg"))
            .with_text(".product-discountedPrice", "Rs. 2796")
            .with_text(".product-strike", "Rs. 3995")
            .with_text(".product-discountPercentage", "(30% OFF)")
            .with_text(".product-ratingsContainer span", "4.3")
            .with_text(".product-ratingsCount", "| 1.2k")
    }

    #[test]
    fn test_refine() {
        assert_eq!(Refine::Trim.apply("  a b "), Some("a b".into()));
        assert_eq!(Refine::Trim.apply("   "), None);
        assert_eq!(
            Refine::FirstToken.apply("https://x.test/a.jpg 1x, https://x.test/b.jpg 2x"),
            Some("https://x.test/a.jpg".into())
        );
        assert_eq!(Refine::FirstToken.apply(""), None);
        assert_eq!(Refine::StripDelimiter('|').apply("| 57"), Some("57".into()));
        assert_eq!(Refine::StripDelimiter('|').apply("|"), None);
    }

    #[tokio::test]
    async fn test_full_card() {
        let record = extractor().extract(&FixtureItem::new(full_card()), CategoryKind::Brand).await;

        assert_eq!(record.product_id.as_deref(), Some("30125114"));
        assert_eq!(record.brand.as_deref(), Some("Nike"));
        assert_eq!(record.product_name.as_deref(), Some("Men Revolution 7 Running Shoes"));
        assert_eq!(record.selling_price.as_deref(), Some("Rs. 2796"));
        assert_eq!(record.mrp_price.as_deref(), Some("Rs. 3995"));
        assert_eq!(record.discount_percent.as_deref(), Some("(30% OFF)"));
        assert_eq!(record.rating.as_deref(), Some("4.3"));
        assert_eq!(record.comment_count.as_deref(), Some("1.2k"));
        assert_eq!(record.listing_type, ListingType::Organic);
        assert_eq!(record.source_page, CategoryKind::Brand);
    }

    #[tokio::test]
    async fn test_srcset_wins_over_plain_src() {
        let record = extractor().extract(&FixtureItem::new(full_card()), CategoryKind::Brand).await;
        assert_eq!(record.image_url.as_deref(), Some("https://img.test/w_210/shoe.webp"));
    }

    #[tokio::test]
    async fn test_image_fallback_order() {
        let ex = extractor();

        let lazy = FixtureCard::new().with_node(
            "img",
            FixtureNode::attr("data-src", "https://img.test/lazy.jpg")
                .with_attr("data-srcset", "https://img.test/lazyset.jpg 1x"),
        );
        let record = ex.extract(&FixtureItem::new(lazy), CategoryKind::Keyword).await;
        assert_eq!(record.image_url.as_deref(), Some("https://img.test/lazy.jpg"));

        let srcset_only = FixtureCard::new()
            .with_node("img", FixtureNode::attr("data-srcset", "https://img.test/lazyset.jpg 1x"));
        let record = ex.extract(&FixtureItem::new(srcset_only), CategoryKind::Keyword).await;
        assert_eq!(record.image_url.as_deref(), Some("https://img.test/lazyset.jpg 1x"));

        // Empty srcset falls through to the plain image
        let empty_source = FixtureCard::new()
            .with_node("picture source", FixtureNode::attr("srcset", " "))
            .with_node("img", FixtureNode::attr("src", "https://img.test/plain.jpg"));
        let record = ex.extract(&FixtureItem::new(empty_source), CategoryKind::Keyword).await;
        assert_eq!(record.image_url.as_deref(), Some("https://img.test/plain.jpg"));
    }

    #[tokio::test]
    async fn test_list_price_when_not_discounted() {
        let card = FixtureCard::new().with_text(".product-price", "Rs. 999");
        let record = extractor().extract(&FixtureItem::new(card), CategoryKind::Keyword).await;
        assert_eq!(record.selling_price.as_deref(), Some("Rs. 999"));
        assert_eq!(record.mrp_price, None);
        assert_eq!(record.discount_percent, None);
    }

    #[tokio::test]
    async fn test_bare_card_is_all_null() {
        let record = extractor()
            .extract(&FixtureItem::new(FixtureCard::new()), CategoryKind::Keyword)
            .await;
        assert!(Field::ALL.iter().all(|f| record.get(*f).is_none()));
        assert_eq!(record.listing_type, ListingType::Organic);
        assert_eq!(record.source_page, CategoryKind::Keyword);
    }

    #[tokio::test]
    async fn test_broken_field_does_not_spread() {
        let card = full_card()
            .with_node(".product-brand", FixtureNode::broken())
            .with_node("picture source", FixtureNode::broken());
        let record = extractor().extract(&FixtureItem::new(card), CategoryKind::Brand).await;

        assert_eq!(record.brand, None);
        // Broken source element falls back to the plain image
        assert_eq!(record.image_url.as_deref(), Some("https://img.test/plain.jpg"));
        assert_eq!(record.product_name.as_deref(), Some("Men Revolution 7 Running Shoes"));
        assert_eq!(record.product_id.as_deref(), Some("30125114"));
    }

    #[test]
    fn test_chain_shapes() {
        let ex = extractor();
        assert_eq!(ex.rules(Field::ImageUrl).len(), 4);
        assert_eq!(ex.rules(Field::SellingPrice).len(), 2);
        assert_eq!(ex.rules(Field::ProductId), &[Rule::attribute("id")]);
    }
}
