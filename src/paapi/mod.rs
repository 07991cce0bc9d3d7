//! Product Advertising API access.
//!
//! - `credentials`: validated key triple
//! - `signer`: request signing (HMAC-SHA256 key derivation chain)
//! - `dispatcher`: serialized, rate-limited call queue
//! - `retry`: exponential backoff executor
//! - `transport`: HTTP seam (reqwest in production, scripted in tests)
//! - `response`: status/error-code classification
//! - `client`: the composed cache-first client

mod client;
mod credentials;
mod dispatcher;
mod error;
mod operations;
mod response;
mod retry;
mod signer;
mod transport;

pub use client::{ClientOptions, PaapiClient};
pub use credentials::Credentials;
pub use dispatcher::{interval_for_rate, Dispatcher};
pub use error::{redact, PaapiError, PaapiResult};
pub use operations::{
    GetItemsRequest, Operation, SearchItemsRequest, SearchParams, BROWSE_NODE_RESOURCES,
    MAX_ITEMS_PER_REQUEST, MAX_SEARCH_ITEM_COUNT, PRODUCT_RESOURCES,
};
pub use response::{classify, is_not_found, VendorOutcome};
pub use retry::{backoff_delay, execute_with_retry, RetryPolicy, MAX_BACKOFF};
pub use signer::{amz_date, SignedRequest, Signer};
pub use transport::{parse_retry_after, ReqwestTransport, Transport, VendorResponse, USER_AGENT};
