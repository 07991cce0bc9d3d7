//! Normalized product records.
//!
//! A `CanonicalProduct` is built fresh by every normalization pass and is
//! never mutated in place; a later fetch produces a new value that replaces
//! the cached one wholesale.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Category placement chosen from the vendor's browse nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInfo {
    /// Primary category name (empty when nothing usable was supplied).
    pub main: String,
    /// Secondary category name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Browse node backing `main`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browse_node_id: Option<String>,
}

/// Listing price in major currency units.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceInfo {
    pub amount: f64,
    pub currency: String,
    /// Vendor display string, e.g. "￥1,980".
    pub formatted: String,
}

impl PriceInfo {
    /// True when the vendor supplied no price at all.
    pub fn is_missing(&self) -> bool {
        self.amount == 0.0 && self.currency.is_empty() && self.formatted.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSet {
    pub primary: String,
    #[serde(default)]
    pub thumbnails: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub average: f64,
    pub count: u64,
}

/// Heuristic flags callers use to exclude undesirable catalog entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingEligibility {
    /// Listing looks like a mobile application rather than a physical product.
    pub mobile_app: bool,
    /// Listing or lowest offer price is exactly zero.
    pub zero_price: bool,
}

impl ListingEligibility {
    pub fn is_eligible(&self) -> bool {
        !self.mobile_app && !self.zero_price
    }
}

/// Stable internal representation of one catalog item.
///
/// Decoding fills absent fields with defaults so records written by older
/// versions still load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CanonicalProduct {
    pub asin: String,
    pub title: String,
    pub category: CategoryInfo,
    pub price: PriceInfo,
    pub images: ImageSet,
    /// Free-form specification map (brand, model, color, ...).
    pub specifications: BTreeMap<String, String>,
    pub availability: String,
    pub rating: Rating,
    pub brand: String,
    pub features: Vec<String>,
    pub detail_page_url: String,
    pub eligibility: ListingEligibility,
}

impl CanonicalProduct {
    pub fn is_eligible(&self) -> bool {
        self.eligibility.is_eligible()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_camel_case() {
        let product = CanonicalProduct {
            asin: "B0TEST0001".to_string(),
            category: CategoryInfo {
                main: "家電・PC・周辺機器".to_string(),
                sub: None,
                browse_node_id: Some("3210981".to_string()),
            },
            detail_page_url: "https://www.amazon.co.jp/dp/B0TEST0001".to_string(),
            ..Default::default()
        };

        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["category"]["browseNodeId"], "3210981");
        assert_eq!(
            json["detailPageUrl"],
            "https://www.amazon.co.jp/dp/B0TEST0001"
        );
        assert!(json["category"].get("sub").is_none());
    }

    #[test]
    fn test_decodes_record_without_eligibility() {
        let json = r#"{
            "asin": "B0TEST0001",
            "title": "Kettle",
            "category": {"main": "キッチン家電"},
            "price": {"amount": 19.8, "currency": "JPY", "formatted": "￥1,980"},
            "images": {"primary": "https://m.media-amazon.com/images/I/a.jpg"},
            "rating": {"average": 4.2, "count": 31}
        }"#;

        let product: CanonicalProduct = serde_json::from_str(json).unwrap();
        assert_eq!(product.eligibility, ListingEligibility::default());
        assert!(product.is_eligible());
        assert!(product.images.thumbnails.is_empty());
        assert!(product.specifications.is_empty());
    }

    #[test]
    fn test_missing_price() {
        assert!(PriceInfo::default().is_missing());
        let price = PriceInfo {
            amount: 0.0,
            currency: "JPY".to_string(),
            formatted: "￥0".to_string(),
        };
        assert!(!price.is_missing());
    }
}
