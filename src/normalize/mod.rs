//! Vendor payload to `CanonicalProduct` normalization.
//!
//! Normalization is total: every optional vendor field degrades to an empty
//! string, zero, or an empty collection.

pub mod category;
pub mod eligibility;
pub mod schema;

use std::collections::BTreeMap;

pub use category::{
    extract_category, is_valid_category_node, report_nodes, BrowseNodeInvestigation,
    BrowseNodeReport,
};
pub use eligibility::{is_mobile_app_listing, is_zero_price_listing};
pub use schema::{VendorEnvelope, VendorErrorDetail, VendorItem};

use crate::models::{CanonicalProduct, ImageSet, PriceInfo, Rating};
use schema::{Measurement, Price, TextValue};

/// Vendor amounts are in minor units.
const MINOR_UNITS_PER_MAJOR: f64 = 100.0;

fn text(value: &Option<TextValue>) -> Option<&str> {
    value
        .as_ref()
        .and_then(|v| v.display_value.as_deref())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn measurement(value: &Option<Measurement>) -> Option<String> {
    let m = value.as_ref()?;
    let amount = m.display_value?;
    Some(match m.unit.as_deref() {
        Some(unit) if !unit.is_empty() => format!("{} {}", amount, unit),
        _ => amount.to_string(),
    })
}

fn price_info(price: &Price) -> PriceInfo {
    PriceInfo {
        amount: price.amount.unwrap_or(0.0) / MINOR_UNITS_PER_MAJOR,
        currency: price.currency.clone().unwrap_or_default(),
        formatted: price.display_amount.clone().unwrap_or_default(),
    }
}

fn extract_price(item: &VendorItem) -> PriceInfo {
    let Some(offers) = item.offers.as_ref() else {
        return PriceInfo::default();
    };
    offers
        .listings
        .iter()
        .find_map(|l| l.price.as_ref())
        .or_else(|| offers.summaries.iter().find_map(|s| s.lowest_price.as_ref()))
        .map(price_info)
        .unwrap_or_default()
}

fn extract_images(item: &VendorItem) -> ImageSet {
    let Some(images) = item.images.as_ref() else {
        return ImageSet::default();
    };
    ImageSet {
        primary: images
            .primary
            .as_ref()
            .and_then(|p| p.best_url())
            .unwrap_or_default()
            .to_string(),
        thumbnails: images
            .variants
            .iter()
            .filter_map(|v| v.best_url())
            .map(str::to_string)
            .collect(),
    }
}

fn extract_specifications(item: &VendorItem) -> BTreeMap<String, String> {
    let mut specs = BTreeMap::new();
    let Some(info) = item.item_info.as_ref() else {
        return specs;
    };

    let mut put = |key: &str, value: Option<&str>| {
        if let Some(value) = value {
            specs.insert(key.to_string(), value.to_string());
        }
    };

    if let Some(by_line) = &info.by_line_info {
        put("brand", text(&by_line.brand));
        put("manufacturer", text(&by_line.manufacturer));
    }
    if let Some(classifications) = &info.classifications {
        put("binding", text(&classifications.binding));
        put("productGroup", text(&classifications.product_group));
    }
    if let Some(manufacture) = &info.manufacture_info {
        put("model", text(&manufacture.model));
        put("partNumber", text(&manufacture.item_part_number));
        put("warranty", text(&manufacture.warranty));
    }
    if let Some(technical) = &info.technical_info {
        put("energyEfficiencyClass", text(&technical.energy_efficiency_class));
        if let Some(formats) = &technical.formats {
            if !formats.display_values.is_empty() {
                put("formats", Some(formats.display_values.join(", ").as_str()));
            }
        }
    }
    if let Some(product) = &info.product_info {
        put("color", text(&product.color));
        put("size", text(&product.size));
        put("releaseDate", text(&product.release_date));
        if let Some(dims) = &product.item_dimensions {
            put("height", measurement(&dims.height).as_deref());
            put("length", measurement(&dims.length).as_deref());
            put("width", measurement(&dims.width).as_deref());
            put("weight", measurement(&dims.weight).as_deref());
        }
    }

    specs
}

fn extract_rating(item: &VendorItem) -> Rating {
    let Some(reviews) = item.customer_reviews.as_ref() else {
        return Rating::default();
    };
    Rating {
        average: reviews
            .star_rating
            .as_ref()
            .and_then(|r| r.value)
            .unwrap_or(0.0),
        count: reviews.count.unwrap_or(0),
    }
}

/// Map one vendor item into a `CanonicalProduct`. Never fails.
pub fn normalize_item(item: &VendorItem) -> CanonicalProduct {
    let info = item.item_info.as_ref();
    let product_group = info
        .and_then(|i| i.classifications.as_ref())
        .and_then(|c| text(&c.product_group));
    let brand = info
        .and_then(|i| i.by_line_info.as_ref())
        .and_then(|b| text(&b.brand).or(text(&b.manufacturer)))
        .unwrap_or_default()
        .to_string();
    let features = info
        .and_then(|i| i.features.as_ref())
        .map(|f| {
            f.display_values
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();
    let availability = item
        .primary_listing()
        .and_then(|l| l.availability.as_ref())
        .and_then(|a| a.message.clone())
        .unwrap_or_default();

    CanonicalProduct {
        asin: item.asin.clone(),
        title: item.title().unwrap_or_default().trim().to_string(),
        category: extract_category(item.browse_nodes(), product_group),
        price: extract_price(item),
        images: extract_images(item),
        specifications: extract_specifications(item),
        availability,
        rating: extract_rating(item),
        brand,
        features,
        detail_page_url: item.detail_page_url.clone().unwrap_or_default(),
        eligibility: eligibility::evaluate(item),
    }
}
