//! Wire shapes of the rewritten response bodies
//!
//! Each shape models only the fields the dispatcher touches; the rest of
//! the host's payload flows through untouched via flattened maps, so a
//! rewritten response is byte-for-byte faithful for everything we did not
//! change.

use crate::backend::NodeSummary;
use crate::hierarchy::ROOT_ID;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata key used to flag hidden breadcrumb entries for the client
pub const HIDDEN_FLAG: &str = "Hidden";

/// Single content/media item as returned by fetch/save endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDisplay {
    pub path: String,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// Entry of a breadcrumb or search response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityBasic {
    pub path: String,
    /// Side-channel metadata the host attaches to entities
    #[serde(default)]
    pub meta_data: Map<String, Value>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl EntityBasic {
    pub fn set_hidden(&mut self, hidden: bool) {
        self.meta_data
            .insert(HIDDEN_FLAG.to_string(), Value::Bool(hidden));
    }
}

/// One entity-type bucket of the global search response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchGroup {
    pub entity_type: String,
    #[serde(default)]
    pub results: Vec<EntityBasic>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// List-view row in the host's item shape, built from a node summary
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    pub id: i64,
    pub parent_id: i64,
    pub name: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type_alias: Option<String>,
}

impl From<NodeSummary> for ListItem {
    fn from(node: NodeSummary) -> Self {
        Self {
            id: node.id,
            // start nodes are presented as if parented by the synthetic root
            parent_id: ROOT_ID,
            name: node.name,
            path: node.path,
            icon: node.icon,
            content_type_alias: node.content_type_alias,
        }
    }
}

/// Paged list-view response replacing the host's root page
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedItems {
    pub page_number: u64,
    pub page_size: u64,
    pub total_items: u64,
    pub total_pages: u64,
    pub items: Vec<ListItem>,
}

impl PagedItems {
    /// Single page holding exactly `items`
    pub fn single_page(items: Vec<ListItem>) -> Self {
        let count = items.len() as u64;
        Self {
            page_number: 1,
            page_size: count,
            total_items: count,
            total_pages: 1,
            items,
        }
    }
}
