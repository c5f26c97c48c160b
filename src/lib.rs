//! Back-office start node gate
//!
//! A reverse proxy that enforces per-user start node restrictions over a
//! CMS back-office API. Each restricted user is assigned subtrees of the
//! content and media hierarchies; the proxy rewrites intercepted responses
//! so everything above those subtrees disappears, filters navigation trees
//! and context menus, and blocks media uploads outside them.
//!
//! ## Pieces
//!
//! - **Response rewriting** - a declarative route table maps back-office
//!   endpoints to rewrite rules; a two-phase dispatcher plans before the
//!   upstream call and rewrites the returned body
//! - **Tree and menu filters** - the root level of a section tree becomes
//!   the user's start nodes; destructive menu actions are stripped on the
//!   start nodes themselves
//! - **Upload guard** - media saves targeting folders outside the user's
//!   subtrees are cancelled and rolled back
//!
//! ## Example Configuration
//!
//! ```toml
//! [upstream]
//! url = "https://cms.example.com"
//! # token from BACKOFFICE_API_TOKEN env var
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8750
//!
//! [access]
//! limit_pickers_to_start_nodes = true
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod filters;
pub mod guard;
pub mod hierarchy;
pub mod rewrite;
pub mod server;
pub mod session;
pub mod startnodes;
pub mod util;

// Re-export main types
pub use config::{AppConfig, load_config};
pub use error::{AppError, Result};
pub use hierarchy::{Hierarchy, HierarchyPath, StartNodeCollection, StartNodeSet};
pub use server::AppState;
