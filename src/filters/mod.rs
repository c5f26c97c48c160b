//! Tree and menu filtering for back-office navigation.
//!
//! The rewrite dispatcher handles item-level responses; this module covers
//! the tree render, context menu, and media save notification points. Each
//! concern is a handler trait registered with an [`EventRegistry`], so the
//! server can dispatch every registered handler in order at the matching
//! notification point.

pub mod events;
pub mod menu;
pub mod tree;

pub use events::{
    EventRegistry, MediaSaveHandler, MenuRenderHandler, TreeRenderHandler, default_registry,
};
pub use menu::{MenuItem, MenuRenderArgs, StartNodeMenuFilter};
pub use tree::{StartNodeTreeFilter, TreeNode, TreeRenderArgs};
