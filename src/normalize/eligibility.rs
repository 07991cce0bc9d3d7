//! Listing eligibility heuristics: mobile-app listings and zero-price listings.

use std::sync::LazyLock;

use regex::Regex;

use super::schema::{Price, VendorItem};
use crate::models::ListingEligibility;

/// App-store category names as they appear on browse nodes or availability text.
const APP_STORE_NAMES: &[&str] = &[
    "Androidアプリ",
    "Android アプリ",
    "Amazonアプリストア",
    "Appstore",
    "App Store",
    "アプリ&ゲーム",
    "アプリ・ゲーム",
    "Google Play",
];

/// Continuations of "アプリ" that do not describe an app listing: unrelated
/// words (apricot, applicator) and devices that pair with a phone app.
const APP_COMPOUND_SUFFIXES: &[&str] = &["コット", "ケーター", "対応", "連携", "操作"];

/// Bracketed platform tag in a title, e.g. `【Android】` or `[iOS版]`.
///
/// The tag must name only the platform; `【アプリ対応】` is a device feature.
static PLATFORM_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)[【\[（(]\s*(android|ios|iphone|ipad|fire ?tv|アプリ|app)\s*(版|用|アプリ|app)?\s*[】\]）)]",
    )
    .unwrap()
});

/// Standalone "app"/"apps" in Latin text.
static APP_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(^|[^a-z])apps?($|[^a-z])").unwrap());

/// "App Control", "app-controlled", "App compatible": a device feature.
static APP_FEATURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(^|[^a-z])apps?[\s-]*(control(led)?|enabled|compatible|connected|supported)($|[^a-z])")
        .unwrap()
});

fn mentions_app(text: &str) -> bool {
    if APP_STORE_NAMES.iter().any(|name| text.contains(name)) {
        return true;
    }
    if APP_WORD.is_match(&APP_FEATURE.replace_all(text, " ")) {
        return true;
    }
    text.match_indices("アプリ").any(|(idx, m)| {
        let rest = &text[idx + m.len()..];
        !APP_COMPOUND_SUFFIXES.iter().any(|s| rest.starts_with(s))
    })
}

/// Whether the item looks like a mobile application listing.
///
/// Checks availability text, each browse node's display and context-free
/// names, and the title (which additionally matches bracketed platform tags).
pub fn is_mobile_app_listing(item: &VendorItem) -> bool {
    let availability = item
        .primary_listing()
        .and_then(|l| l.availability.as_ref())
        .and_then(|a| a.message.as_deref());
    if availability.is_some_and(mentions_app) {
        return true;
    }

    for node in item.browse_nodes() {
        if node.display_name.as_deref().is_some_and(mentions_app)
            || node.context_free_name.as_deref().is_some_and(mentions_app)
        {
            return true;
        }
    }

    item.title()
        .is_some_and(|title| PLATFORM_TAG.is_match(title) || mentions_app(title))
}

fn is_zero(price: Option<&Price>) -> bool {
    price.and_then(|p| p.amount) == Some(0.0)
}

/// Whether the primary listing price or any lowest summarized price is exactly zero.
///
/// Items with no price information at all are not flagged.
pub fn is_zero_price_listing(item: &VendorItem) -> bool {
    let Some(offers) = item.offers.as_ref() else {
        return false;
    };
    if is_zero(offers.listings.first().and_then(|l| l.price.as_ref())) {
        return true;
    }
    offers
        .summaries
        .iter()
        .any(|s| is_zero(s.lowest_price.as_ref()))
}

/// Evaluate both heuristics.
pub fn evaluate(item: &VendorItem) -> ListingEligibility {
    ListingEligibility {
        mobile_app: is_mobile_app_listing(item),
        zero_price: is_zero_price_listing(item),
    }
}
