//! Hierarchy model
//!
//! The back-office exposes two independent tree structures, content and
//! media. Every node belongs to exactly one of them and carries an ancestor
//! path from the synthetic root (`-1`) down to itself. A user's visibility
//! into a hierarchy is expressed as a set of start nodes: the nodes that act
//! as effective roots of the subtrees the user may see.

pub mod path;
pub mod types;

pub use path::{HierarchyPath, ROOT_ID};
pub use types::{Hierarchy, StartNodeCollection, StartNodeSet};
