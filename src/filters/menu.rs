//! Context menu restriction for start nodes.
//!
//! A start node is the anchor of a user's subtree; letting the user delete
//! or move it would detach their own access. Those actions are stripped
//! from the node's context menu instead of being rejected at commit time.

use crate::error::FilterError;
use crate::filters::events::MenuRenderHandler;
use crate::hierarchy::Hierarchy;
use crate::session::UserContext;
use crate::startnodes::StartNodeResolver;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Menu action aliases blocked on content start nodes
const CONTENT_BLOCKED: &[&str] = &["delete", "move", "copy"];
/// Menu action aliases blocked on media start nodes
const MEDIA_BLOCKED: &[&str] = &["delete", "move"];

/// A single context menu action
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MenuItem {
    pub alias: String,
    pub name: String,
}

/// Mutable arguments for a menu render notification
#[derive(Debug, Clone, Default)]
pub struct MenuRenderArgs {
    /// Tree node id as the client sent it; non-numeric ids belong to
    /// virtual nodes and are never start nodes
    pub node_id: String,
    pub items: Vec<MenuItem>,
}

/// Strips destructive actions from the context menu of a start node
pub struct StartNodeMenuFilter {
    hierarchy: Hierarchy,
    resolver: Arc<StartNodeResolver>,
}

impl StartNodeMenuFilter {
    pub fn new(hierarchy: Hierarchy, resolver: Arc<StartNodeResolver>) -> Self {
        Self {
            hierarchy,
            resolver,
        }
    }

    fn blocked_aliases(&self) -> &'static [&'static str] {
        match self.hierarchy {
            Hierarchy::Content => CONTENT_BLOCKED,
            Hierarchy::Media => MEDIA_BLOCKED,
        }
    }
}

#[async_trait]
impl MenuRenderHandler for StartNodeMenuFilter {
    async fn on_menu_rendered(
        &self,
        user: &UserContext,
        args: &mut MenuRenderArgs,
    ) -> Result<(), FilterError> {
        if user.admin {
            return Ok(());
        }
        let Ok(node_id) = args.node_id.parse::<i64>() else {
            return Ok(());
        };

        let collection = self.resolver.start_nodes(user.id).await?;
        let nodes = collection.for_hierarchy(self.hierarchy);
        if !nodes.contains(node_id) {
            return Ok(());
        }

        let blocked = self.blocked_aliases();
        args.items
            .retain(|item| !blocked.contains(&item.alias.as_str()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::{StartNodeCollection, StartNodeSet};
    use crate::startnodes::MemoryAssignmentStore;

    fn menu() -> Vec<MenuItem> {
        ["create", "delete", "move", "copy", "sort"]
            .iter()
            .map(|alias| MenuItem {
                alias: alias.to_string(),
                name: alias.to_uppercase(),
            })
            .collect()
    }

    async fn filter_for(hierarchy: Hierarchy, content: &[i64], media: &[i64]) -> StartNodeMenuFilter {
        let store = MemoryAssignmentStore::new();
        store
            .set(
                7,
                StartNodeCollection::new(
                    StartNodeSet::from_ids(content.iter().copied()),
                    StartNodeSet::from_ids(media.iter().copied()),
                ),
            )
            .await;
        StartNodeMenuFilter::new(hierarchy, Arc::new(StartNodeResolver::new(Arc::new(store))))
    }

    #[tokio::test]
    async fn test_content_start_node_loses_destructive_actions() {
        let filter = filter_for(Hierarchy::Content, &[5], &[]).await;
        let mut args = MenuRenderArgs {
            node_id: "5".to_string(),
            items: menu(),
        };
        filter
            .on_menu_rendered(&UserContext::new(7), &mut args)
            .await
            .unwrap();

        let aliases: Vec<&str> = args.items.iter().map(|i| i.alias.as_str()).collect();
        assert_eq!(aliases, vec!["create", "sort"]);
    }

    #[tokio::test]
    async fn test_media_start_node_keeps_copy() {
        let filter = filter_for(Hierarchy::Media, &[], &[40]).await;
        let mut args = MenuRenderArgs {
            node_id: "40".to_string(),
            items: menu(),
        };
        filter
            .on_menu_rendered(&UserContext::new(7), &mut args)
            .await
            .unwrap();

        let aliases: Vec<&str> = args.items.iter().map(|i| i.alias.as_str()).collect();
        assert_eq!(aliases, vec!["create", "copy", "sort"]);
    }

    #[tokio::test]
    async fn test_non_start_node_menu_is_untouched() {
        let filter = filter_for(Hierarchy::Content, &[5], &[]).await;
        let mut args = MenuRenderArgs {
            node_id: "12".to_string(),
            items: menu(),
        };
        filter
            .on_menu_rendered(&UserContext::new(7), &mut args)
            .await
            .unwrap();
        assert_eq!(args.items.len(), 5);
    }

    #[tokio::test]
    async fn test_virtual_node_id_is_ignored() {
        let filter = filter_for(Hierarchy::Content, &[5], &[]).await;
        let mut args = MenuRenderArgs {
            node_id: "recycle-bin".to_string(),
            items: menu(),
        };
        filter
            .on_menu_rendered(&UserContext::new(7), &mut args)
            .await
            .unwrap();
        assert_eq!(args.items.len(), 5);
    }
}
