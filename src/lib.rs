//! Signed, rate-limited, cached access to the Product Advertising API.
//!
//! Every outbound call is signed, queued behind a single dispatcher that
//! enforces the vendor's request ceiling, retried with exponential backoff,
//! normalized into a [`models::CanonicalProduct`], and recorded in a
//! persistent cache that remembers both hits and confirmed absences.

pub mod cache;
pub mod cli;
pub mod config;
pub mod models;
pub mod normalize;
pub mod paapi;
pub mod utils;

pub use cache::ProductCache;
pub use models::{Asin, CanonicalProduct};
pub use paapi::{PaapiClient, PaapiError, PaapiResult, SearchParams};
