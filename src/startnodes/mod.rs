//! Start node resolution
//!
//! Answers "which hierarchy nodes may this user see" with a cache-first
//! lookup over an injected [`AssignmentStore`]. The cache is process-wide
//! shared state read by every concurrent request; entries are inserted fully
//! constructed behind an `Arc`, so a race may compute the same collection
//! twice but can never surface a torn value. Assignment changes take effect
//! for new requests once the entry is invalidated; staleness is otherwise
//! unbounded by design.

pub mod cache;
pub mod resolver;
pub mod store;

pub use cache::KeyedCache;
pub use resolver::StartNodeResolver;
pub use store::{AssignmentStore, HttpAssignmentStore, MemoryAssignmentStore};
