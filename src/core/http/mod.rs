//! HTTP client adapter
//!
//! One `ApiClient` per backend; clones share the same bearer header.

mod client;

pub use client::{ApiClient, ApiError};
