//! Start node tree rendering.
//!
//! When a restricted user opens a section tree, the root-level listing is
//! replaced with their start nodes so the tree anchors at the subtrees they
//! may reach. An unset assignment here means deny-all and empties the tree;
//! whereas an assignment containing the root sentinel leaves the host's own
//! rendering untouched.

use crate::backend::{BackendClient, NodeSummary};
use crate::error::FilterError;
use crate::filters::events::TreeRenderHandler;
use crate::hierarchy::{Hierarchy, ROOT_ID};
use crate::session::UserContext;
use crate::startnodes::StartNodeResolver;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// One rendered tree node on the wire
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub id: String,
    pub parent_id: String,
    pub name: String,
    pub icon: String,
    pub has_children: bool,
    pub route_path: String,
    #[serde(default)]
    pub css_classes: Vec<String>,
    #[serde(default)]
    pub additional_data: Map<String, Value>,
}

/// Mutable arguments for a tree render notification: the request query
/// strings and the root-level node collection being returned.
#[derive(Debug, Clone, Default)]
pub struct TreeRenderArgs {
    pub query: HashMap<String, String>,
    pub nodes: Vec<TreeNode>,
}

/// Replaces the root-level nodes of a section tree with the user's start
/// nodes, fetched from the entity service.
pub struct StartNodeTreeFilter {
    hierarchy: Hierarchy,
    resolver: Arc<StartNodeResolver>,
    backend: Arc<BackendClient>,
}

impl StartNodeTreeFilter {
    pub fn new(
        hierarchy: Hierarchy,
        resolver: Arc<StartNodeResolver>,
        backend: Arc<BackendClient>,
    ) -> Self {
        Self {
            hierarchy,
            resolver,
            backend,
        }
    }

    fn build_node(&self, summary: NodeSummary, query: &HashMap<String, String>) -> TreeNode {
        let default_icon = match self.hierarchy {
            Hierarchy::Content => "icon-document",
            Hierarchy::Media => "icon-picture",
        };

        let mut node = TreeNode {
            id: summary.id.to_string(),
            parent_id: ROOT_ID.to_string(),
            name: summary.name.clone(),
            icon: summary.icon.clone().unwrap_or_else(|| default_icon.to_string()),
            // containers page their children through the list view instead
            has_children: summary.has_children && !summary.is_container,
            route_path: format!(
                "{0}/{0}/edit/{1}",
                self.hierarchy.as_str(),
                summary.id
            ),
            css_classes: Vec::new(),
            additional_data: Map::new(),
        };

        if self.hierarchy == Hierarchy::Media {
            if let Some(alias) = &summary.content_type_alias {
                node.additional_data
                    .insert("contentType".to_string(), json!(alias));
            }
            if summary.is_container {
                node.css_classes.push("is-container".to_string());
                node.additional_data
                    .insert("isContainer".to_string(), json!(true));
            }
        }

        // carry request query strings through so the client-side tree can
        // keep state such as the active culture
        for (key, value) in query {
            if !node.additional_data.contains_key(key) {
                node.additional_data.insert(key.clone(), json!(value));
            }
        }

        // picker dialogs navigate by selection, not by route
        if query.get("isDialog").map(String::as_str) == Some("true") {
            node.route_path = "#".to_string();
        }

        node
    }
}

#[async_trait]
impl TreeRenderHandler for StartNodeTreeFilter {
    async fn on_tree_rendered(
        &self,
        user: &UserContext,
        args: &mut TreeRenderArgs,
    ) -> Result<(), FilterError> {
        if user.admin {
            return Ok(());
        }

        let collection = self.resolver.start_nodes(user.id).await?;
        let nodes = collection.for_hierarchy(self.hierarchy);

        if nodes.is_unset() {
            debug!(user = user.id, hierarchy = %self.hierarchy, "no assignment, emptying tree");
            args.nodes.clear();
            return Ok(());
        }
        if nodes.grants_root() {
            return Ok(());
        }

        let ids: Vec<i64> = nodes
            .ids()
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        let summaries = self.backend.entities_by_ids(self.hierarchy, &ids).await?;

        let mut replacement: Vec<TreeNode> = summaries
            .into_iter()
            .map(|summary| self.build_node(summary, &args.query))
            .collect();

        // content trees list alphabetically; media keeps entity service order
        if self.hierarchy == Hierarchy::Content {
            replacement.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        }

        args.nodes = replacement;
        Ok(())
    }
}
