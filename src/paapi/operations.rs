//! Vendor operation schemas: endpoints, targets and request bodies.

use serde::Serialize;

/// Maximum number of item identifiers per GetItems call.
pub const MAX_ITEMS_PER_REQUEST: usize = 10;

/// Maximum page size for SearchItems.
pub const MAX_SEARCH_ITEM_COUNT: u32 = 10;

/// Vendor API operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    GetItems,
    SearchItems,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetItems => "GetItems",
            Self::SearchItems => "SearchItems",
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Self::GetItems => "/paapi5/getitems",
            Self::SearchItems => "/paapi5/searchitems",
        }
    }

    pub fn target(&self) -> &'static str {
        match self {
            Self::GetItems => "com.amazon.paapi5.v1.ProductAdvertisingAPIv1.GetItems",
            Self::SearchItems => "com.amazon.paapi5.v1.ProductAdvertisingAPIv1.SearchItems",
        }
    }
}

/// Resources requested for full product normalization.
pub const PRODUCT_RESOURCES: &[&str] = &[
    "BrowseNodeInfo.BrowseNodes",
    "BrowseNodeInfo.BrowseNodes.Ancestor",
    "BrowseNodeInfo.BrowseNodes.SalesRank",
    "CustomerReviews.Count",
    "CustomerReviews.StarRating",
    "Images.Primary.Large",
    "Images.Variants.Large",
    "ItemInfo.ByLineInfo",
    "ItemInfo.Classifications",
    "ItemInfo.Features",
    "ItemInfo.ManufactureInfo",
    "ItemInfo.ProductInfo",
    "ItemInfo.TechnicalInfo",
    "ItemInfo.Title",
    "Offers.Listings.Availability.Message",
    "Offers.Listings.Price",
    "Offers.Summaries.LowestPrice",
];

/// Resources requested when only investigating category placement.
pub const BROWSE_NODE_RESOURCES: &[&str] = &[
    "ItemInfo.Title",
    "BrowseNodeInfo.BrowseNodes",
    "BrowseNodeInfo.BrowseNodes.Ancestor",
    "BrowseNodeInfo.BrowseNodes.SalesRank",
];

/// GetItems request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetItemsRequest {
    pub item_ids: Vec<String>,
    pub partner_tag: String,
    pub partner_type: &'static str,
    pub marketplace: String,
    pub resources: Vec<&'static str>,
}

impl GetItemsRequest {
    pub fn new(
        item_ids: Vec<String>,
        partner_tag: &str,
        marketplace: &str,
        resources: &[&'static str],
    ) -> Self {
        Self {
            item_ids,
            partner_tag: partner_tag.to_string(),
            partner_type: "Associates",
            marketplace: marketplace.to_string(),
            resources: resources.to_vec(),
        }
    }
}

/// Caller-facing search parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    pub keywords: String,
    /// Vendor search index, e.g. `All` or `HomeAndKitchen`.
    pub search_index: String,
    /// Results per page, clamped to 1..=10.
    pub item_count: u32,
    pub item_page: Option<u32>,
    pub browse_node_id: Option<String>,
    /// Minimum price in the vendor's minor unit.
    pub min_price: Option<u64>,
    /// Maximum price in the vendor's minor unit.
    pub max_price: Option<u64>,
    /// Vendor sort key, e.g. `Featured` or `AvgCustomerReviews`.
    pub sort_by: Option<String>,
    /// Drop mobile-app and zero-price listings from the results.
    pub exclude_ineligible: bool,
}

impl SearchParams {
    pub fn new(keywords: &str) -> Self {
        Self {
            keywords: keywords.to_string(),
            search_index: "All".to_string(),
            item_count: MAX_SEARCH_ITEM_COUNT,
            item_page: None,
            browse_node_id: None,
            min_price: None,
            max_price: None,
            sort_by: None,
            exclude_ineligible: true,
        }
    }

    pub fn with_search_index(mut self, index: &str) -> Self {
        self.search_index = index.to_string();
        self
    }

    pub fn with_item_count(mut self, count: u32) -> Self {
        self.item_count = count;
        self
    }

    pub fn with_browse_node(mut self, node_id: &str) -> Self {
        self.browse_node_id = Some(node_id.to_string());
        self
    }

    pub fn include_ineligible(mut self) -> Self {
        self.exclude_ineligible = false;
        self
    }
}

/// SearchItems request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SearchItemsRequest {
    pub keywords: String,
    pub partner_tag: String,
    pub partner_type: &'static str,
    pub marketplace: String,
    pub search_index: String,
    pub item_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browse_node_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    pub resources: Vec<&'static str>,
}

impl SearchItemsRequest {
    pub fn from_params(params: &SearchParams, partner_tag: &str, marketplace: &str) -> Self {
        Self {
            keywords: params.keywords.clone(),
            partner_tag: partner_tag.to_string(),
            partner_type: "Associates",
            marketplace: marketplace.to_string(),
            search_index: params.search_index.clone(),
            item_count: params.item_count.clamp(1, MAX_SEARCH_ITEM_COUNT),
            item_page: params.item_page,
            browse_node_id: params.browse_node_id.clone(),
            min_price: params.min_price,
            max_price: params.max_price,
            sort_by: params.sort_by.clone(),
            resources: PRODUCT_RESOURCES.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TARGET_PREFIX: &str = "com.amazon.paapi5.v1.ProductAdvertisingAPIv1";

    #[test]
    fn test_targets_share_prefix() {
        for op in [Operation::GetItems, Operation::SearchItems] {
            assert_eq!(op.target(), format!("{}.{}", TARGET_PREFIX, op.name()));
        }
    }

    #[test]
    fn test_get_items_body() {
        let req = GetItemsRequest::new(
            vec!["B06WRS9737".to_string()],
            "tag-22",
            "www.amazon.co.jp",
            &["ItemInfo.Title"],
        );
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["ItemIds"][0], "B06WRS9737");
        assert_eq!(json["PartnerTag"], "tag-22");
        assert_eq!(json["PartnerType"], "Associates");
        assert_eq!(json["Marketplace"], "www.amazon.co.jp");
        assert_eq!(json["Resources"][0], "ItemInfo.Title");
    }

    #[test]
    fn test_search_body_clamps_and_skips_unset() {
        let params = SearchParams::new("電気ケトル")
            .with_search_index("HomeAndKitchen")
            .with_item_count(50);
        let req = SearchItemsRequest::from_params(&params, "tag-22", "www.amazon.co.jp");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["Keywords"], "電気ケトル");
        assert_eq!(json["SearchIndex"], "HomeAndKitchen");
        assert_eq!(json["ItemCount"], 10);
        assert!(json.get("BrowseNodeId").is_none());
        assert!(json.get("MinPrice").is_none());
    }
}
