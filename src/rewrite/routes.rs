//! Declarative routing table for intercepted endpoints
//!
//! Dispatch is keyed by an exact match on the normalized lowercase request
//! path. The HTTP method is implied by each endpoint and not discriminated
//! on, mirroring the host's own routing.

use crate::hierarchy::Hierarchy;
use std::collections::HashMap;

/// Rewrite strategy to apply to a recognized endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteRule {
    /// Single item fetch/save: mark forbidden when outside the subtree,
    /// truncate the returned ancestor path either way
    ItemPath(Hierarchy),
    /// Breadcrumb ancestors: drop or hide entries outside the subtree
    AncestorBreadcrumbs,
    /// Global search: filter the content and media buckets independently
    GlobalSearch,
    /// Content-scoped search used by the move/copy pickers
    ScopedContentSearch,
    /// Media list view: replace the synthetic root page with the start nodes
    MediaListView,
    /// Media grid view root: only folder-typed start nodes
    MediaRootFolders,
    /// Post-move/copy raw path response: truncate ancestors
    MovedPath(Hierarchy),
}

/// Exact-match table from normalized path to rewrite rule
pub struct RouteTable {
    routes: HashMap<String, RewriteRule>,
}

impl RouteTable {
    /// Build the table of intercepted back-office endpoints under `prefix`
    /// (e.g. `/backoffice/api`).
    pub fn backoffice(prefix: &str) -> Self {
        use Hierarchy::{Content, Media};
        use RewriteRule::*;

        let prefix = prefix.trim_end_matches('/').to_ascii_lowercase();
        let entries: [(&str, RewriteRule); 12] = [
            // single item fetch and save
            ("/content/getbyid", ItemPath(Content)),
            ("/content/postsave", ItemPath(Content)),
            ("/media/getbyid", ItemPath(Media)),
            ("/media/postsave", ItemPath(Media)),
            // edit view footer and media picker
            ("/entity/getancestors", AncestorBreadcrumbs),
            // primary back-office search
            ("/entity/searchall", GlobalSearch),
            // copy/move dialogs
            ("/entity/search", ScopedContentSearch),
            // media section and picker list view
            ("/media/getchildren", MediaListView),
            // media section grid view
            ("/media/getchildfolders", MediaRootFolders),
            ("/content/postmove", MovedPath(Content)),
            ("/content/postcopy", MovedPath(Content)),
            ("/media/postmove", MovedPath(Media)),
        ];

        Self {
            routes: entries
                .into_iter()
                .map(|(path, rule)| (format!("{}{}", prefix, path), rule))
                .collect(),
        }
    }

    /// Look up the rewrite rule for a request path, if any
    pub fn resolve(&self, path: &str) -> Option<RewriteRule> {
        self.routes.get(&path.to_ascii_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
