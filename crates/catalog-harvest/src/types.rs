//! Core data types for harvest targets and product records.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which kind of listing page a target points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Brand,
    Keyword,
}

impl CategoryKind {
    /// Every kind, in harvest order.
    pub const ALL: [CategoryKind; 2] = [CategoryKind::Brand, CategoryKind::Keyword];

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKind::Brand => "brand",
            CategoryKind::Keyword => "keyword",
        }
    }

    /// Parse `brand` / `keyword` (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "brand" => Some(CategoryKind::Brand),
            "keyword" => Some(CategoryKind::Keyword),
            _ => None,
        }
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One listing page to harvest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub kind: CategoryKind,
    pub label: String,
    pub url: String,
}

impl Target {
    pub fn new(kind: CategoryKind, label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
            url: url.into(),
        }
    }

    /// Deterministic output file stem, e.g. `brand_nike`.
    pub fn file_stem(&self) -> String {
        format!("{}_{}", self.kind.as_str(), self.label)
    }
}

/// Sponsored vs organic placement of a listing card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListingType {
    Organic,
    Advertisement,
}

impl ListingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingType::Organic => "Organic",
            ListingType::Advertisement => "Advertisement",
        }
    }
}

/// The extractable fields of a product record, in output column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    ProductId,
    Brand,
    ProductName,
    ImageUrl,
    SellingPrice,
    MrpPrice,
    DiscountPercent,
    Rating,
    CommentCount,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::ProductId,
        Field::Brand,
        Field::ProductName,
        Field::ImageUrl,
        Field::SellingPrice,
        Field::MrpPrice,
        Field::DiscountPercent,
        Field::Rating,
        Field::CommentCount,
    ];

    /// Column name as written to the output header.
    pub fn name(&self) -> &'static str {
        match self {
            Field::ProductId => "product_id",
            Field::Brand => "brand",
            Field::ProductName => "product_name",
            Field::ImageUrl => "image_url",
            Field::SellingPrice => "selling_price",
            Field::MrpPrice => "mrp_price",
            Field::DiscountPercent => "discount_percent",
            Field::Rating => "rating",
            Field::CommentCount => "comment_count",
        }
    }
}

/// Full output column order.
pub const COLUMNS: [&str; 11] = [
    "product_id",
    "brand",
    "product_name",
    "image_url",
    "selling_price",
    "mrp_price",
    "discount_percent",
    "rating",
    "comment_count",
    "listing_type",
    "source_page",
];

/// One harvested listing card. Every extractable field may be absent.
///
/// Field declaration order is the output column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub product_id: Option<String>,
    pub brand: Option<String>,
    pub product_name: Option<String>,
    pub image_url: Option<String>,
    pub selling_price: Option<String>,
    pub mrp_price: Option<String>,
    pub discount_percent: Option<String>,
    pub rating: Option<String>,
    pub comment_count: Option<String>,
    pub listing_type: ListingType,
    pub source_page: CategoryKind,
}

impl ProductRecord {
    /// A record with every extractable field null.
    pub fn empty(listing_type: ListingType, source_page: CategoryKind) -> Self {
        Self {
            product_id: None,
            brand: None,
            product_name: None,
            image_url: None,
            selling_price: None,
            mrp_price: None,
            discount_percent: None,
            rating: None,
            comment_count: None,
            listing_type,
            source_page,
        }
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.slot(field).as_deref()
    }

    pub fn set(&mut self, field: Field, value: Option<String>) {
        *self.slot_mut(field) = value;
    }

    fn slot(&self, field: Field) -> &Option<String> {
        match field {
            Field::ProductId => &self.product_id,
            Field::Brand => &self.brand,
            Field::ProductName => &self.product_name,
            Field::ImageUrl => &self.image_url,
            Field::SellingPrice => &self.selling_price,
            Field::MrpPrice => &self.mrp_price,
            Field::DiscountPercent => &self.discount_percent,
            Field::Rating => &self.rating,
            Field::CommentCount => &self.comment_count,
        }
    }

    fn slot_mut(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::ProductId => &mut self.product_id,
            Field::Brand => &mut self.brand,
            Field::ProductName => &mut self.product_name,
            Field::ImageUrl => &mut self.image_url,
            Field::SellingPrice => &mut self.selling_price,
            Field::MrpPrice => &mut self.mrp_price,
            Field::DiscountPercent => &mut self.discount_percent,
            Field::Rating => &mut self.rating,
            Field::CommentCount => &mut self.comment_count,
        }
    }
}

/// Errors that can occur while harvesting.
#[derive(thiserror::Error, Debug)]
pub enum HarvestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Sink error: {0}")]
    Sink(String),
}

/// Convenience result type.
pub type HarvestResult<T> = Result<T, HarvestError>;
