//! Hierarchy path utilities
//!
//! A [`HierarchyPath`] is the root-to-node ancestor chain of a back-office
//! item, serialized at the API boundary as a comma-joined id list
//! (`"-1,1054,2001"`). The containment test and ancestor truncation here are
//! the single source of truth for every filtering decision in the crate.

use crate::error::PathError;
use crate::hierarchy::types::StartNodeSet;
use std::fmt;
use std::str::FromStr;

/// Synthetic root id of both hierarchies
pub const ROOT_ID: i64 = -1;

/// Root-to-leaf ancestor chain of node ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyPath(Vec<i64>);

impl HierarchyPath {
    pub fn new(ids: Vec<i64>) -> Self {
        Self(ids)
    }

    pub fn ids(&self) -> &[i64] {
        &self.0
    }

    /// Position of the first path element (root to leaf) that is a member
    /// of `allowed`. Id `0` never matches: it is not a valid node id and is
    /// reserved as a "not found" sentinel by the host.
    fn first_start_node(&self, allowed: &StartNodeSet) -> Option<usize> {
        self.0.iter().position(|&id| id != 0 && allowed.contains(id))
    }

    /// True iff the path passes through one of the allowed start nodes.
    ///
    /// An unset start node set matches nothing; call sites that treat unset
    /// as "bypass filtering" must short-circuit before getting here.
    pub fn contains_start_node(&self, allowed: &StartNodeSet) -> bool {
        self.first_start_node(allowed).is_some()
    }

    /// Collapse the ancestors between the synthetic root and the first
    /// matched start node, so the path reads root -> start node -> ... ->
    /// leaf. This is what makes breadcrumbs and move dialogs present the
    /// start node as if it were the tree root.
    ///
    /// Elements at positions `[remove_from, i)` are removed, where `i` is
    /// the position of the first match. If no element matches, or the match
    /// sits at or before `remove_from`, the path is returned unchanged.
    /// Idempotent: after one truncation the match sits at `remove_from`.
    pub fn truncate_above(&self, allowed: &StartNodeSet, remove_from: usize) -> HierarchyPath {
        match self.first_start_node(allowed) {
            Some(i) if i > remove_from => {
                let mut ids = self.0.clone();
                ids.drain(remove_from..i);
                HierarchyPath(ids)
            }
            _ => self.clone(),
        }
    }
}

impl FromStr for HierarchyPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut ids = Vec::new();
        for token in s.split(',') {
            let id = token.trim().parse::<i64>().map_err(|_| PathError {
                path: s.to_string(),
                token: token.to_string(),
            })?;
            ids.push(id);
        }
        Ok(HierarchyPath(ids))
    }
}

impl fmt::Display for HierarchyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for id in &self.0 {
            if !first {
                write!(f, ",")?;
            }
            write!(f, "{}", id)?;
            first = false;
        }
        Ok(())
    }
}
