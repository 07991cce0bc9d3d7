//! Shared utility functions.
//!
//! - `text`: invisible-character stripping for persisted strings

mod text;

pub use text::{is_invisible, sanitize_value, strip_invisible};
