//! Serde model of the vendor response payload.
//!
//! Every field is optional: the vendor omits whole subtrees when a resource
//! was not requested or has no data for an item.

use serde::Deserialize;

/// Top-level GetItems / SearchItems response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct VendorEnvelope {
    pub items_result: Option<ItemsResult>,
    pub search_result: Option<SearchResult>,
    pub errors: Vec<VendorErrorDetail>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ItemsResult {
    pub items: Vec<VendorItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SearchResult {
    pub items: Vec<VendorItem>,
    pub total_result_count: Option<u64>,
    #[serde(rename = "SearchURL")]
    pub search_url: Option<String>,
}

/// One entry of the vendor `Errors` array.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase", default)]
pub struct VendorErrorDetail {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct VendorItem {
    #[serde(rename = "ASIN")]
    pub asin: String,
    #[serde(rename = "DetailPageURL")]
    pub detail_page_url: Option<String>,
    pub item_info: Option<ItemInfo>,
    pub images: Option<Images>,
    pub offers: Option<Offers>,
    pub browse_node_info: Option<BrowseNodeInfo>,
    pub customer_reviews: Option<CustomerReviews>,
}

impl VendorItem {
    pub fn title(&self) -> Option<&str> {
        self.item_info
            .as_ref()?
            .title
            .as_ref()?
            .display_value
            .as_deref()
    }

    pub fn browse_nodes(&self) -> &[BrowseNode] {
        self.browse_node_info
            .as_ref()
            .map(|info| info.browse_nodes.as_slice())
            .unwrap_or(&[])
    }

    /// First offer listing, if any.
    pub fn primary_listing(&self) -> Option<&Listing> {
        self.offers.as_ref()?.listings.first()
    }
}

/// `{"DisplayValue": ...}` wrapper used throughout `ItemInfo`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DisplayValue<T> {
    pub display_value: Option<T>,
    pub label: Option<String>,
}

pub type TextValue = DisplayValue<String>;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ItemInfo {
    pub title: Option<TextValue>,
    pub features: Option<MultiValue>,
    pub by_line_info: Option<ByLineInfo>,
    pub classifications: Option<Classifications>,
    pub product_info: Option<ProductInfo>,
    pub manufacture_info: Option<ManufactureInfo>,
    pub technical_info: Option<TechnicalInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MultiValue {
    pub display_values: Vec<String>,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ByLineInfo {
    pub brand: Option<TextValue>,
    pub manufacturer: Option<TextValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Classifications {
    pub binding: Option<TextValue>,
    pub product_group: Option<TextValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ProductInfo {
    pub color: Option<TextValue>,
    pub size: Option<TextValue>,
    pub item_dimensions: Option<ItemDimensions>,
    pub release_date: Option<TextValue>,
    pub unit_count: Option<DisplayValue<f64>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ItemDimensions {
    pub height: Option<Measurement>,
    pub length: Option<Measurement>,
    pub weight: Option<Measurement>,
    pub width: Option<Measurement>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Measurement {
    pub display_value: Option<f64>,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ManufactureInfo {
    pub model: Option<TextValue>,
    pub item_part_number: Option<TextValue>,
    pub warranty: Option<TextValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TechnicalInfo {
    pub formats: Option<MultiValue>,
    pub energy_efficiency_class: Option<TextValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Images {
    pub primary: Option<ImageSizes>,
    pub variants: Vec<ImageSizes>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ImageSizes {
    pub large: Option<Image>,
    pub medium: Option<Image>,
    pub small: Option<Image>,
}

impl ImageSizes {
    /// Largest available rendition URL.
    pub fn best_url(&self) -> Option<&str> {
        [&self.large, &self.medium, &self.small]
            .into_iter()
            .flatten()
            .map(|image| image.url.as_str())
            .find(|url| !url.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Image {
    #[serde(rename = "URL")]
    pub url: String,
    pub height: Option<u32>,
    pub width: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Offers {
    pub listings: Vec<Listing>,
    pub summaries: Vec<OfferSummary>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Listing {
    pub price: Option<Price>,
    pub availability: Option<Availability>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Price {
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub display_amount: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Availability {
    pub message: Option<String>,
    #[serde(rename = "Type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct OfferSummary {
    pub lowest_price: Option<Price>,
    pub condition: Option<TextValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct BrowseNodeInfo {
    pub browse_nodes: Vec<BrowseNode>,
}

/// A category node attached to an item.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct BrowseNode {
    pub id: String,
    pub display_name: Option<String>,
    pub context_free_name: Option<String>,
    pub is_root: Option<bool>,
    pub sales_rank: Option<u64>,
    pub ancestor: Option<Box<BrowseNode>>,
}

impl BrowseNode {
    pub fn name(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.context_free_name.as_deref())
            .unwrap_or("")
    }

    /// Ancestor chain, nearest first.
    pub fn ancestors(&self) -> Ancestors<'_> {
        Ancestors {
            next: self.ancestor.as_deref(),
        }
    }
}

pub struct Ancestors<'a> {
    next: Option<&'a BrowseNode>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a BrowseNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        self.next = node.ancestor.as_deref();
        Some(node)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CustomerReviews {
    pub count: Option<u64>,
    pub star_rating: Option<StarRating>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct StarRating {
    pub value: Option<f64>,
}
