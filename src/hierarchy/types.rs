//! Start node set and collection types

use crate::hierarchy::path::ROOT_ID;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// One of the two back-office hierarchies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hierarchy {
    Content,
    Media,
}

impl Hierarchy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Hierarchy::Content => "content",
            Hierarchy::Media => "media",
        }
    }

    /// Entity type discriminator used on the wire by the host API
    pub fn entity_type(&self) -> &'static str {
        match self {
            Hierarchy::Content => "Document",
            Hierarchy::Media => "Media",
        }
    }
}

impl fmt::Display for Hierarchy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user's start nodes for one hierarchy.
///
/// Three meaningful states:
/// - `Unset`: no restriction has been configured for the user. Tree
///   rendering and the upload guard treat this as deny-all; the response
///   rewrite endpoints treat it as "bypass filtering" (see the dispatcher).
/// - `Nodes` containing [`ROOT_ID`]: unrestricted, the user may see the
///   whole hierarchy.
/// - `Nodes` without the sentinel: restricted to the listed nodes and
///   their descendants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartNodeSet {
    Unset,
    Nodes(BTreeSet<i64>),
}

impl StartNodeSet {
    pub fn unset() -> Self {
        StartNodeSet::Unset
    }

    pub fn from_ids<I: IntoIterator<Item = i64>>(ids: I) -> Self {
        StartNodeSet::Nodes(ids.into_iter().collect())
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, StartNodeSet::Unset)
    }

    /// True when the set contains the root sentinel, i.e. the user is
    /// unrestricted in this hierarchy.
    pub fn grants_root(&self) -> bool {
        match self {
            StartNodeSet::Unset => false,
            StartNodeSet::Nodes(ids) => ids.contains(&ROOT_ID),
        }
    }

    pub fn contains(&self, id: i64) -> bool {
        match self {
            StartNodeSet::Unset => false,
            StartNodeSet::Nodes(ids) => ids.contains(&id),
        }
    }

    /// The configured node ids, or `None` when unset
    pub fn ids(&self) -> Option<&BTreeSet<i64>> {
        match self {
            StartNodeSet::Unset => None,
            StartNodeSet::Nodes(ids) => Some(ids),
        }
    }
}

impl From<Option<Vec<i64>>> for StartNodeSet {
    fn from(ids: Option<Vec<i64>>) -> Self {
        match ids {
            None => StartNodeSet::Unset,
            Some(ids) => StartNodeSet::from_ids(ids),
        }
    }
}

/// A user's start node sets for both hierarchies.
///
/// One instance per user, lazily computed and held behind an `Arc` in the
/// resolver cache so concurrent readers never observe a half-built value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartNodeCollection {
    pub content: StartNodeSet,
    pub media: StartNodeSet,
}

impl StartNodeCollection {
    pub fn new(content: StartNodeSet, media: StartNodeSet) -> Self {
        Self { content, media }
    }

    /// Both hierarchies unset, i.e. no assignment configured at all
    pub fn empty() -> Self {
        Self {
            content: StartNodeSet::Unset,
            media: StartNodeSet::Unset,
        }
    }

    pub fn for_hierarchy(&self, hierarchy: Hierarchy) -> &StartNodeSet {
        match hierarchy {
            Hierarchy::Content => &self.content,
            Hierarchy::Media => &self.media,
        }
    }
}
