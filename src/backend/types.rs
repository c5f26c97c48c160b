//! Back-office entity types
//!
//! Only the fields the filters actually consult are modelled; everything
//! else the host sends is preserved through the flattened `extra` map.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Summary of a content or media node as returned by the host's entity
/// service (`getbyids`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSummary {
    pub id: i64,
    pub name: String,
    /// Comma-joined ancestor path, root first
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type_alias: Option<String>,
    #[serde(default)]
    pub has_children: bool,
    #[serde(default)]
    pub is_container: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NodeSummary {
    /// Whether the node's underlying type is folder-like. The host marks
    /// folder types by suffixing the type alias.
    pub fn is_folder_type(&self) -> bool {
        self.content_type_alias
            .as_deref()
            .is_some_and(|alias| alias.ends_with("Folder"))
    }
}
