//! Back-office upstream API
//!
//! The proxy both forwards raw back-office traffic to the upstream host and
//! calls a handful of its entity endpoints directly (fetching start node
//! entities for tree rendering and list-view replacement, deleting rejected
//! media). [`BackendClient`] covers both concerns over one `reqwest` client.

pub mod client;
pub mod types;

pub use client::BackendClient;
pub use types::NodeSummary;
