//! Data models for the product access layer.

mod asin;
mod product;

pub use asin::{Asin, ASIN_LEN};
pub use product::{
    CanonicalProduct, CategoryInfo, ImageSet, ListingEligibility, PriceInfo, Rating,
};
