//! Category node validity and main/sub category selection.
//!
//! Vendor browse nodes mix real taxonomy labels with storefront artifacts
//! (sale pages, brand stores, rankings). Those are filtered out by a fixed
//! battery of structural and vocabulary signals before a main category is
//! picked.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::schema::{BrowseNode, VendorItem};
use crate::models::CategoryInfo;

/// Characters that never occur in a real taxonomy label.
const STRUCTURAL_CHARS: &[char] = &[
    '【', '】', '[', ']', '|', '｜', '(', ')', '（', '）', '_', '/', '／', '\u{3000}',
];

/// Storefront and administrative tokens, rejected wherever they appear.
const ADMIN_TOKENS: &[&str] = &[
    "ストア",
    "セール",
    "特集",
    "特選",
    "キャンペーン",
    "クーポン",
    "ポイント還元",
    "カテゴリー別",
    "おすすめ",
    "％OFF",
    "%OFF",
    "Categories",
    "Self Service",
];

/// Brand-page and ranking-page words. Real labels use them too
/// ("ブランド腕時計", "Amazonデバイス"), so they only reject alongside an ASCII space.
const SPACED_PAGE_TOKENS: &[&str] = &["ブランド", "ランキング", "Amazon", "Prime"];

/// Whole-label endings of brand and ranking pages ("売れ筋ランキング", "人気のブランド").
const PAGE_SUFFIXES: &[&str] = &["ランキング", "のブランド"];

/// Promotional vocabulary; only a rejection signal in labels with an ASCII space.
static PROMO_VOCABULARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(sale|sales|store|stores|shop|shops|deals?|coupons?|off|brands?|ranking|rankings|best ?sellers?|new arrivals?|featured|campaign)\b",
    )
    .unwrap()
});

/// Whether a browse node name looks like a real category.
///
/// The middle dot (`・`) is an ordinary separator and is accepted.
pub fn is_valid_category_node(name: &str) -> bool {
    let name = name.trim();
    if name.is_empty() {
        return false;
    }
    if name.contains(STRUCTURAL_CHARS) {
        return false;
    }
    if name.contains(' ')
        && (PROMO_VOCABULARY.is_match(name)
            || SPACED_PAGE_TOKENS.iter().any(|token| name.contains(token)))
    {
        return false;
    }
    if PAGE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
        return false;
    }
    !ADMIN_TOKENS.iter().any(|token| name.contains(token))
}

/// Pick main and secondary categories from an item's browse nodes.
///
/// Among valid nodes the first carrying a sales rank is main; the first other
/// valid node is sub. Without any rank the first two valid nodes are used in
/// vendor order. With no valid node at all, the nearest valid ancestor wins,
/// then `product_group`, then an empty category.
pub fn extract_category(nodes: &[BrowseNode], product_group: Option<&str>) -> CategoryInfo {
    let valid: Vec<&BrowseNode> = nodes
        .iter()
        .filter(|node| is_valid_category_node(node.name()))
        .collect();

    let main_idx = valid
        .iter()
        .position(|node| node.sales_rank.is_some())
        .or((!valid.is_empty()).then_some(0));

    if let Some(main_idx) = main_idx {
        let main = valid[main_idx];
        let sub = valid
            .iter()
            .enumerate()
            .find(|(i, _)| *i != main_idx)
            .map(|(_, node)| node.name().trim().to_string());
        return CategoryInfo {
            main: main.name().trim().to_string(),
            sub,
            browse_node_id: non_empty(&main.id),
        };
    }

    if let Some(ancestor) = nodes
        .iter()
        .flat_map(|node| node.ancestors())
        .find(|ancestor| is_valid_category_node(ancestor.name()))
    {
        return CategoryInfo {
            main: ancestor.name().trim().to_string(),
            sub: None,
            browse_node_id: non_empty(&ancestor.id),
        };
    }

    CategoryInfo {
        main: product_group.map(|g| g.trim().to_string()).unwrap_or_default(),
        sub: None,
        browse_node_id: None,
    }
}

fn non_empty(id: &str) -> Option<String> {
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

/// Diagnostic view of one browse node and its ancestor chain.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BrowseNodeReport {
    pub id: String,
    pub display_name: String,
    pub context_free_name: Option<String>,
    pub is_root: bool,
    pub sales_rank: Option<u64>,
    pub valid: bool,
    pub ancestors: Vec<AncestorReport>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AncestorReport {
    pub id: String,
    pub display_name: String,
    pub valid: bool,
}

/// Category diagnosis for one item: every node with its verdict and the
/// category that would be chosen.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BrowseNodeInvestigation {
    pub asin: String,
    pub title: String,
    pub chosen: CategoryInfo,
    pub nodes: Vec<BrowseNodeReport>,
}

impl BrowseNodeInvestigation {
    pub fn from_item(item: &VendorItem) -> Self {
        let product_group = item
            .item_info
            .as_ref()
            .and_then(|i| i.classifications.as_ref())
            .and_then(|c| c.product_group.as_ref())
            .and_then(|g| g.display_value.as_deref());
        Self {
            asin: item.asin.clone(),
            title: item.title().unwrap_or_default().to_string(),
            chosen: extract_category(item.browse_nodes(), product_group),
            nodes: report_nodes(item.browse_nodes()),
        }
    }
}

/// Flatten browse nodes into reports carrying each node's validity verdict.
pub fn report_nodes(nodes: &[BrowseNode]) -> Vec<BrowseNodeReport> {
    nodes
        .iter()
        .map(|node| BrowseNodeReport {
            id: node.id.clone(),
            display_name: node.name().to_string(),
            context_free_name: node.context_free_name.clone(),
            is_root: node.is_root.unwrap_or(false),
            sales_rank: node.sales_rank,
            valid: is_valid_category_node(node.name()),
            ancestors: node
                .ancestors()
                .map(|a| AncestorReport {
                    id: a.id.clone(),
                    display_name: a.name().to_string(),
                    valid: is_valid_category_node(a.name()),
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, name: &str, rank: Option<u64>) -> BrowseNode {
        BrowseNode {
            id: id.to_string(),
            display_name: Some(name.to_string()),
            sales_rank: rank,
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_category_names() {
        assert!(is_valid_category_node("家電・PC・周辺機器"));
        assert!(is_valid_category_node("コーヒー・ティー用品"));
        assert!(is_valid_category_node("電気ケトル"));
        assert!(is_valid_category_node("Home & Kitchen"));
        assert!(is_valid_category_node("Office Products"));
        assert!(is_valid_category_node("Amazonデバイス・アクセサリ"));
        assert!(is_valid_category_node("ブランド腕時計"));
    }

    #[test]
    fn test_brand_and_ranking_pages() {
        assert!(!is_valid_category_node("売れ筋ランキング"));
        assert!(!is_valid_category_node("人気のブランド"));
        assert!(!is_valid_category_node("海外 ブランド"));
        assert!(!is_valid_category_node("Amazon Exclusives"));
        assert!(!is_valid_category_node("Prime Video 対象"));
    }

    #[test]
    fn test_rejected_category_names() {
        assert!(!is_valid_category_node("【5％以上OFF】ホーム&キッチン用品"));
        assert!(!is_valid_category_node("ドラッグストア"));
        assert!(!is_valid_category_node("キッチン家電_特価"));
        assert!(!is_valid_category_node("食品｜飲料"));
        assert!(!is_valid_category_node("家電　セール"));
        assert!(!is_valid_category_node("Kitchen Sale"));
        assert!(!is_valid_category_node("Best Sellers in Coffee"));
        assert!(!is_valid_category_node("カテゴリー別ランキング"));
        assert!(!is_valid_category_node(""));
    }

    #[test]
    fn test_ranked_node_is_main() {
        let nodes = vec![
            node("1", "キッチン家電", None),
            node("2", "調理器具", None),
            node("3", "電気ケトル", Some(1)),
        ];
        let category = extract_category(&nodes, None);
        assert_eq!(category.main, "電気ケトル");
        assert_eq!(category.sub.as_deref(), Some("キッチン家電"));
        assert_eq!(category.browse_node_id.as_deref(), Some("3"));
    }

    #[test]
    fn test_vendor_order_without_rank() {
        let nodes = vec![
            node("1", "【タイムセール】", None),
            node("2", "コーヒー・ティー用品", None),
            node("3", "コーヒーメーカー", None),
        ];
        let category = extract_category(&nodes, None);
        assert_eq!(category.main, "コーヒー・ティー用品");
        assert_eq!(category.sub.as_deref(), Some("コーヒーメーカー"));
    }

    #[test]
    fn test_invalid_ranked_node_is_skipped() {
        let nodes = vec![
            node("1", "ドラッグストア", Some(5)),
            node("2", "ヘルスケア", None),
        ];
        let category = extract_category(&nodes, None);
        assert_eq!(category.main, "ヘルスケア");
        assert!(category.sub.is_none());
    }

    #[test]
    fn test_fallbacks() {
        let mut only_invalid = node("1", "【セール】", None);
        only_invalid.ancestor = Some(Box::new(node("9", "食品・飲料", None)));
        let category = extract_category(&[only_invalid], Some("Grocery"));
        assert_eq!(category.main, "食品・飲料");
        assert_eq!(category.browse_node_id.as_deref(), Some("9"));

        let category = extract_category(&[node("1", "ストア", None)], Some("Grocery"));
        assert_eq!(category.main, "Grocery");
        assert!(category.browse_node_id.is_none());

        assert_eq!(extract_category(&[], None), CategoryInfo::default());
    }

    #[test]
    fn test_investigation_from_item() {
        let item: VendorItem = serde_json::from_value(serde_json::json!({
            "ASIN": "B000000001",
            "ItemInfo": {"Title": {"DisplayValue": "ケトル"}},
            "BrowseNodeInfo": {"BrowseNodes": [
                {"Id": "1", "DisplayName": "【特集】キッチン"},
                {"Id": "2", "DisplayName": "電気ケトル", "SalesRank": 3}
            ]}
        }))
        .unwrap();
        let investigation = BrowseNodeInvestigation::from_item(&item);
        assert_eq!(investigation.title, "ケトル");
        assert_eq!(investigation.chosen.main, "電気ケトル");
        assert_eq!(investigation.nodes.len(), 2);
        assert!(!investigation.nodes[0].valid);
    }

    #[test]
    fn test_report_nodes() {
        let mut n = node("3", "電気ケトル", Some(12));
        n.ancestor = Some(Box::new(node("2", "【特集】", None)));
        let reports = report_nodes(&[n]);
        assert_eq!(reports.len(), 1);
        assert!(reports[0].valid);
        assert_eq!(reports[0].sales_rank, Some(12));
        assert_eq!(reports[0].ancestors.len(), 1);
        assert!(!reports[0].ancestors[0].valid);
    }
}
