//! Two-phase response rewrite dispatcher
//!
//! `plan` decides before the underlying call whether a response will need
//! rewriting; `apply` mutates the completed body. The admin and
//! no-restriction checks are replicated in every endpoint arm rather than
//! centralized: each decision point owns its bypass, mirroring the
//! host-side extension model this replaces.

use crate::backend::{BackendClient, NodeSummary};
use crate::error::{LookupError, PathError, RewriteError};
use crate::hierarchy::{Hierarchy, HierarchyPath, StartNodeSet};
use crate::rewrite::QueryParams;
use crate::rewrite::routes::RewriteRule;
use crate::rewrite::shapes::{EntityBasic, ItemDisplay, ListItem, PagedItems, SearchGroup};
use crate::session::UserContext;
use crate::startnodes::StartNodeResolver;
use std::sync::Arc;
use tracing::{debug, error};

/// Index of the first removable ancestor when truncating: position 0 is the
/// synthetic root and always survives.
const TRUNCATE_FROM: usize = 1;

/// Decision produced by [`RewriteDispatcher::plan`], carrying everything
/// `apply` needs so the post-call phase never consults the cache again.
#[derive(Debug, Clone)]
pub enum RewritePlan {
    ItemPath {
        nodes: StartNodeSet,
    },
    Ancestors {
        nodes: StartNodeSet,
        /// Strict pickers drop foreign ancestors; otherwise they are only
        /// flagged hidden for the client
        strict: bool,
    },
    GlobalSearch {
        /// `None` means that bucket is not filtered for this user
        content: Option<StartNodeSet>,
        media: Option<StartNodeSet>,
    },
    ContentSearch {
        nodes: StartNodeSet,
    },
    MediaListView {
        nodes: StartNodeSet,
    },
    MediaRootFolders {
        nodes: StartNodeSet,
    },
    MovedPath {
        nodes: StartNodeSet,
    },
}

/// Result of applying a rewrite plan to a response body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOutcome {
    pub body: Vec<u8>,
    /// The item lies outside the user's subtrees; the response should be
    /// surfaced with a forbidden status
    pub forbidden: bool,
}

impl RewriteOutcome {
    fn rewritten(body: Vec<u8>) -> Self {
        Self {
            body,
            forbidden: false,
        }
    }

    fn passthrough(original: &[u8]) -> Self {
        Self {
            body: original.to_vec(),
            forbidden: false,
        }
    }
}

/// Response rewrite dispatcher
pub struct RewriteDispatcher {
    resolver: Arc<StartNodeResolver>,
    backend: Arc<BackendClient>,
    /// The "limit pickers to start nodes" configuration flag
    limit_pickers: bool,
}

impl RewriteDispatcher {
    pub fn new(
        resolver: Arc<StartNodeResolver>,
        backend: Arc<BackendClient>,
        limit_pickers: bool,
    ) -> Self {
        Self {
            resolver,
            backend,
            limit_pickers,
        }
    }

    /// Decide, before the underlying call is made, whether its response
    /// will be rewritten. `Ok(None)` means pass through untouched.
    pub async fn plan(
        &self,
        rule: RewriteRule,
        user: &UserContext,
        query: &QueryParams,
    ) -> Result<Option<RewritePlan>, LookupError> {
        match rule {
            RewriteRule::ItemPath(hierarchy) => self.plan_item_path(hierarchy, user).await,
            RewriteRule::AncestorBreadcrumbs => self.plan_ancestors(user, query).await,
            RewriteRule::GlobalSearch => self.plan_global_search(user).await,
            RewriteRule::ScopedContentSearch => self.plan_content_search(user, query).await,
            RewriteRule::MediaListView => self.plan_media_list_view(user, query).await,
            RewriteRule::MediaRootFolders => self.plan_media_root_folders(user, query).await,
            RewriteRule::MovedPath(hierarchy) => self.plan_moved_path(hierarchy, user).await,
        }
    }

    /// Fetch the user's set for one hierarchy, `None` when it is unset.
    ///
    /// An unset set bypasses response rewriting entirely; tree rendering
    /// and the upload guard treat the same state as deny-all. The asymmetry
    /// is inherited host behavior and is preserved deliberately.
    async fn restriction(
        &self,
        user: &UserContext,
        hierarchy: Hierarchy,
    ) -> Result<Option<StartNodeSet>, LookupError> {
        let collection = self.resolver.start_nodes(user.id).await?;
        let nodes = collection.for_hierarchy(hierarchy);
        if nodes.is_unset() {
            debug!(user = user.id, %hierarchy, "no restriction configured, passing through");
            return Ok(None);
        }
        Ok(Some(nodes.clone()))
    }

    async fn plan_item_path(
        &self,
        hierarchy: Hierarchy,
        user: &UserContext,
    ) -> Result<Option<RewritePlan>, LookupError> {
        if user.admin {
            return Ok(None);
        }
        Ok(self
            .restriction(user, hierarchy)
            .await?
            .map(|nodes| RewritePlan::ItemPath { nodes }))
    }

    async fn plan_ancestors(
        &self,
        user: &UserContext,
        query: &QueryParams,
    ) -> Result<Option<RewritePlan>, LookupError> {
        let hierarchy = if query.is("type", "document") {
            Hierarchy::Content
        } else if query.is("type", "media") {
            Hierarchy::Media
        } else {
            return Ok(None);
        };

        if user.admin {
            return Ok(None);
        }
        Ok(self
            .restriction(user, hierarchy)
            .await?
            .map(|nodes| RewritePlan::Ancestors {
                nodes,
                strict: self.limit_pickers,
            }))
    }

    async fn plan_global_search(
        &self,
        user: &UserContext,
    ) -> Result<Option<RewritePlan>, LookupError> {
        if user.admin {
            return Ok(None);
        }

        let collection = self.resolver.start_nodes(user.id).await?;
        let content = (!collection.content.is_unset()).then(|| collection.content.clone());
        let media = (!collection.media.is_unset()).then(|| collection.media.clone());

        if content.is_none() && media.is_none() {
            return Ok(None);
        }
        Ok(Some(RewritePlan::GlobalSearch { content, media }))
    }

    async fn plan_content_search(
        &self,
        user: &UserContext,
        query: &QueryParams,
    ) -> Result<Option<RewritePlan>, LookupError> {
        // only content-scoped searches are filtered here
        if !query.is("type", "document") {
            return Ok(None);
        }
        if user.admin {
            return Ok(None);
        }
        Ok(self
            .restriction(user, Hierarchy::Content)
            .await?
            .map(|nodes| RewritePlan::ContentSearch { nodes }))
    }

    async fn plan_media_list_view(
        &self,
        user: &UserContext,
        query: &QueryParams,
    ) -> Result<Option<RewritePlan>, LookupError> {
        // only the synthetic root listing is replaced, and only its first
        // page unless pickers are strictly limited
        if !query.is("id", "-1") || !(query.is("pageNumber", "1") || self.limit_pickers) {
            return Ok(None);
        }
        if user.admin {
            return Ok(None);
        }
        match self.restriction(user, Hierarchy::Media).await? {
            Some(nodes) if !nodes.grants_root() => {
                Ok(Some(RewritePlan::MediaListView { nodes }))
            }
            _ => Ok(None),
        }
    }

    async fn plan_media_root_folders(
        &self,
        user: &UserContext,
        query: &QueryParams,
    ) -> Result<Option<RewritePlan>, LookupError> {
        if !query.is("id", "-1") {
            return Ok(None);
        }
        if user.admin {
            return Ok(None);
        }
        match self.restriction(user, Hierarchy::Media).await? {
            Some(nodes) if !nodes.grants_root() => {
                Ok(Some(RewritePlan::MediaRootFolders { nodes }))
            }
            _ => Ok(None),
        }
    }

    async fn plan_moved_path(
        &self,
        hierarchy: Hierarchy,
        user: &UserContext,
    ) -> Result<Option<RewritePlan>, LookupError> {
        if user.admin {
            return Ok(None);
        }
        Ok(self
            .restriction(user, hierarchy)
            .await?
            .map(|nodes| RewritePlan::MovedPath { nodes }))
    }

    /// Apply a plan to a completed response body.
    ///
    /// Never fails: a malformed path, unexpected body shape, or entity
    /// fetch error is logged and the original body returned, so a rewrite
    /// failure cannot turn a successful upstream response into an error.
    pub async fn apply(&self, plan: &RewritePlan, original: &[u8]) -> RewriteOutcome {
        match self.try_apply(plan, original).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "could not rewrite response, returning original body");
                RewriteOutcome::passthrough(original)
            }
        }
    }

    async fn try_apply(
        &self,
        plan: &RewritePlan,
        original: &[u8],
    ) -> Result<RewriteOutcome, RewriteError> {
        match plan {
            RewritePlan::ItemPath { nodes } => {
                let mut item: ItemDisplay = serde_json::from_slice(original)?;
                let path: HierarchyPath = item.path.parse()?;

                let forbidden = !path.contains_start_node(nodes);
                item.path = path.truncate_above(nodes, TRUNCATE_FROM).to_string();

                Ok(RewriteOutcome {
                    body: serde_json::to_vec(&item)?,
                    forbidden,
                })
            }

            RewritePlan::Ancestors { nodes, strict } => {
                let entities: Vec<EntityBasic> = serde_json::from_slice(original)?;
                let entities = if *strict {
                    retain_contained(entities, nodes)?
                } else {
                    let mut flagged = Vec::with_capacity(entities.len());
                    for mut entity in entities {
                        let path: HierarchyPath = entity.path.parse()?;
                        entity.set_hidden(!path.contains_start_node(nodes));
                        flagged.push(entity);
                    }
                    flagged
                };
                Ok(RewriteOutcome::rewritten(serde_json::to_vec(&entities)?))
            }

            RewritePlan::GlobalSearch { content, media } => {
                let mut groups: Vec<SearchGroup> = serde_json::from_slice(original)?;
                for group in &mut groups {
                    let nodes = if group.entity_type == Hierarchy::Content.entity_type() {
                        content.as_ref()
                    } else if group.entity_type == Hierarchy::Media.entity_type() {
                        media.as_ref()
                    } else {
                        // other entity types are untouched
                        None
                    };
                    if let Some(nodes) = nodes {
                        group.results = retain_contained(std::mem::take(&mut group.results), nodes)?;
                    }
                }
                Ok(RewriteOutcome::rewritten(serde_json::to_vec(&groups)?))
            }

            RewritePlan::ContentSearch { nodes } => {
                let entities: Vec<EntityBasic> = serde_json::from_slice(original)?;
                let entities = retain_contained(entities, nodes)?;
                Ok(RewriteOutcome::rewritten(serde_json::to_vec(&entities)?))
            }

            RewritePlan::MediaListView { nodes } => {
                let summaries = self.fetch_start_nodes(nodes).await?;
                let items: Vec<ListItem> = summaries.into_iter().map(ListItem::from).collect();
                let page = PagedItems::single_page(items);
                Ok(RewriteOutcome::rewritten(serde_json::to_vec(&page)?))
            }

            RewritePlan::MediaRootFolders { nodes } => {
                let mut summaries = self.fetch_start_nodes(nodes).await?;
                summaries.retain(NodeSummary::is_folder_type);
                let items: Vec<ListItem> = summaries.into_iter().map(ListItem::from).collect();
                Ok(RewriteOutcome::rewritten(serde_json::to_vec(&items)?))
            }

            RewritePlan::MovedPath { nodes } => {
                let text = std::str::from_utf8(original).map_err(|_| RewriteError::NotText)?;
                let path: HierarchyPath = text.trim().parse()?;
                let truncated = path.truncate_above(nodes, TRUNCATE_FROM).to_string();
                Ok(RewriteOutcome::rewritten(truncated.into_bytes()))
            }
        }
    }

    /// Fetch the user's media start node entities
    async fn fetch_start_nodes(
        &self,
        nodes: &StartNodeSet,
    ) -> Result<Vec<NodeSummary>, RewriteError> {
        let ids: Vec<i64> = nodes.ids().map(|set| set.iter().copied().collect()).unwrap_or_default();
        Ok(self.backend.entities_by_ids(Hierarchy::Media, &ids).await?)
    }
}

/// Keep only entities whose path passes through an allowed start node
fn retain_contained(
    entities: Vec<EntityBasic>,
    nodes: &StartNodeSet,
) -> Result<Vec<EntityBasic>, PathError> {
    let mut kept = Vec::with_capacity(entities.len());
    for entity in entities {
        let path: HierarchyPath = entity.path.parse()?;
        if path.contains_start_node(nodes) {
            kept.push(entity);
        }
    }
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpstreamConfig;
    use crate::hierarchy::StartNodeCollection;
    use crate::startnodes::MemoryAssignmentStore;
    use serde_json::json;

    const USER: UserContext = UserContext { id: 7, admin: false };
    const ADMIN: UserContext = UserContext { id: 1, admin: true };

    /// Dispatcher over an in-memory store; the backend client points at an
    /// unused address and is only reached by the list-view variants.
    async fn dispatcher(collection: StartNodeCollection, limit_pickers: bool) -> RewriteDispatcher {
        let store = MemoryAssignmentStore::new();
        store.set(USER.id, collection).await;

        let backend = BackendClient::new(&UpstreamConfig {
            url: "http://127.0.0.1:9".to_string(),
            ..Default::default()
        })
        .unwrap();

        RewriteDispatcher::new(
            Arc::new(StartNodeResolver::new(Arc::new(store))),
            Arc::new(backend),
            limit_pickers,
        )
    }

    fn content_only(ids: &[i64]) -> StartNodeCollection {
        StartNodeCollection::new(
            StartNodeSet::from_ids(ids.iter().copied()),
            StartNodeSet::unset(),
        )
    }

    #[tokio::test]
    async fn test_admin_always_passes_through() {
        let d = dispatcher(content_only(&[5]), false).await;
        let query = QueryParams::parse(Some("id=-1&pageNumber=1&type=document"));

        for rule in [
            RewriteRule::ItemPath(Hierarchy::Content),
            RewriteRule::AncestorBreadcrumbs,
            RewriteRule::GlobalSearch,
            RewriteRule::ScopedContentSearch,
            RewriteRule::MediaListView,
            RewriteRule::MediaRootFolders,
            RewriteRule::MovedPath(Hierarchy::Media),
        ] {
            assert!(
                d.plan(rule, &ADMIN, &query).await.unwrap().is_none(),
                "admin must bypass {rule:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_unset_restriction_bypasses_rewrite() {
        // unset means bypass on the rewrite side, unlike tree rendering
        let d = dispatcher(StartNodeCollection::empty(), false).await;
        let plan = d
            .plan(RewriteRule::ItemPath(Hierarchy::Content), &USER, &QueryParams::default())
            .await
            .unwrap();
        assert!(plan.is_none());
    }

    #[tokio::test]
    async fn test_item_path_inside_subtree_is_truncated() {
        let d = dispatcher(content_only(&[5]), false).await;
        let plan = d
            .plan(RewriteRule::ItemPath(Hierarchy::Content), &USER, &QueryParams::default())
            .await
            .unwrap()
            .unwrap();

        let body = json!({"id": 12, "name": "Page", "path": "-1,1,5,12"});
        let outcome = d.apply(&plan, &serde_json::to_vec(&body).unwrap()).await;

        assert!(!outcome.forbidden);
        let out: serde_json::Value = serde_json::from_slice(&outcome.body).unwrap();
        assert_eq!(out["path"], "-1,5,12");
        assert_eq!(out["name"], "Page");
    }

    #[tokio::test]
    async fn test_item_path_outside_subtree_is_forbidden() {
        let d = dispatcher(content_only(&[99]), false).await;
        let plan = d
            .plan(RewriteRule::ItemPath(Hierarchy::Content), &USER, &QueryParams::default())
            .await
            .unwrap()
            .unwrap();

        let body = json!({"path": "-1,1,5,12"});
        let outcome = d.apply(&plan, &serde_json::to_vec(&body).unwrap()).await;

        assert!(outcome.forbidden);
        let out: serde_json::Value = serde_json::from_slice(&outcome.body).unwrap();
        assert_eq!(out["path"], "-1,1,5,12");
    }

    #[tokio::test]
    async fn test_malformed_path_returns_original_body() {
        let d = dispatcher(content_only(&[5]), false).await;
        let plan = d
            .plan(RewriteRule::ItemPath(Hierarchy::Content), &USER, &QueryParams::default())
            .await
            .unwrap()
            .unwrap();

        let original = br#"{"path": "-1,oops,12"}"#;
        let outcome = d.apply(&plan, original).await;
        assert!(!outcome.forbidden);
        assert_eq!(outcome.body, original.to_vec());
    }

    #[tokio::test]
    async fn test_unexpected_shape_returns_original_body() {
        let d = dispatcher(content_only(&[5]), false).await;
        let plan = d
            .plan(RewriteRule::ItemPath(Hierarchy::Content), &USER, &QueryParams::default())
            .await
            .unwrap()
            .unwrap();

        let original = b"not json at all";
        let outcome = d.apply(&plan, original).await;
        assert_eq!(outcome.body, original.to_vec());
    }

    #[tokio::test]
    async fn test_ancestors_hidden_flags_when_not_strict() {
        let d = dispatcher(content_only(&[5]), false).await;
        let query = QueryParams::parse(Some("type=document"));
        let plan = d
            .plan(RewriteRule::AncestorBreadcrumbs, &USER, &query)
            .await
            .unwrap()
            .unwrap();

        let body = json!([
            {"id": 1, "path": "-1,1", "metaData": {}},
            {"id": 5, "path": "-1,1,5", "metaData": {}}
        ]);
        let outcome = d.apply(&plan, &serde_json::to_vec(&body).unwrap()).await;
        let out: serde_json::Value = serde_json::from_slice(&outcome.body).unwrap();

        assert_eq!(out.as_array().unwrap().len(), 2);
        assert_eq!(out[0]["metaData"]["Hidden"], true);
        assert_eq!(out[1]["metaData"]["Hidden"], false);
    }

    #[tokio::test]
    async fn test_ancestors_dropped_when_strict() {
        let d = dispatcher(content_only(&[5]), true).await;
        let query = QueryParams::parse(Some("type=document"));
        let plan = d
            .plan(RewriteRule::AncestorBreadcrumbs, &USER, &query)
            .await
            .unwrap()
            .unwrap();

        let body = json!([
            {"id": 1, "path": "-1,1", "metaData": {}},
            {"id": 5, "path": "-1,1,5", "metaData": {}}
        ]);
        let outcome = d.apply(&plan, &serde_json::to_vec(&body).unwrap()).await;
        let out: serde_json::Value = serde_json::from_slice(&outcome.body).unwrap();

        assert_eq!(out.as_array().unwrap().len(), 1);
        assert_eq!(out[0]["id"], 5);
    }

    #[tokio::test]
    async fn test_ancestors_without_type_discriminator_pass_through() {
        let d = dispatcher(content_only(&[5]), false).await;
        let plan = d
            .plan(RewriteRule::AncestorBreadcrumbs, &USER, &QueryParams::default())
            .await
            .unwrap();
        assert!(plan.is_none());
    }

    #[tokio::test]
    async fn test_global_search_filters_buckets_independently() {
        let collection = StartNodeCollection::new(
            StartNodeSet::from_ids([5]),
            StartNodeSet::unset(), // media bucket must be left alone
        );
        let d = dispatcher(collection, false).await;
        let plan = d
            .plan(RewriteRule::GlobalSearch, &USER, &QueryParams::default())
            .await
            .unwrap()
            .unwrap();

        let body = json!([
            {"entityType": "Document", "results": [
                {"id": 12, "path": "-1,1,5,12"},
                {"id": 30, "path": "-1,2,30"}
            ]},
            {"entityType": "Media", "results": [
                {"id": 40, "path": "-1,40"}
            ]},
            {"entityType": "Member", "results": [
                {"id": 50, "path": "-1,50"}
            ]}
        ]);
        let outcome = d.apply(&plan, &serde_json::to_vec(&body).unwrap()).await;
        let out: serde_json::Value = serde_json::from_slice(&outcome.body).unwrap();

        assert_eq!(out[0]["results"].as_array().unwrap().len(), 1);
        assert_eq!(out[0]["results"][0]["id"], 12);
        assert_eq!(out[1]["results"].as_array().unwrap().len(), 1);
        assert_eq!(out[2]["results"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_scoped_search_only_applies_to_content() {
        let d = dispatcher(content_only(&[5]), false).await;

        let media_query = QueryParams::parse(Some("type=media&query=x"));
        assert!(
            d.plan(RewriteRule::ScopedContentSearch, &USER, &media_query)
                .await
                .unwrap()
                .is_none()
        );

        let content_query = QueryParams::parse(Some("type=document&query=x"));
        let plan = d
            .plan(RewriteRule::ScopedContentSearch, &USER, &content_query)
            .await
            .unwrap()
            .unwrap();

        let body = json!([
            {"id": 12, "path": "-1,1,5,12"},
            {"id": 30, "path": "-1,2,30"}
        ]);
        let outcome = d.apply(&plan, &serde_json::to_vec(&body).unwrap()).await;
        let out: serde_json::Value = serde_json::from_slice(&outcome.body).unwrap();
        assert_eq!(out.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_media_list_view_plan_conditions() {
        let collection = StartNodeCollection::new(
            StartNodeSet::unset(),
            StartNodeSet::from_ids([40, 41]),
        );
        let d = dispatcher(collection.clone(), false).await;

        // root listing, first page: replaced
        let query = QueryParams::parse(Some("id=-1&pageNumber=1"));
        assert!(d.plan(RewriteRule::MediaListView, &USER, &query).await.unwrap().is_some());

        // later pages untouched unless pickers are strict
        let query = QueryParams::parse(Some("id=-1&pageNumber=2"));
        assert!(d.plan(RewriteRule::MediaListView, &USER, &query).await.unwrap().is_none());

        let strict = dispatcher(collection.clone(), true).await;
        assert!(strict.plan(RewriteRule::MediaListView, &USER, &query).await.unwrap().is_some());

        // non-root listings are never replaced
        let query = QueryParams::parse(Some("id=40&pageNumber=1"));
        assert!(d.plan(RewriteRule::MediaListView, &USER, &query).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_media_root_sentinel_disables_list_view_replacement() {
        let collection = StartNodeCollection::new(
            StartNodeSet::unset(),
            StartNodeSet::from_ids([-1]),
        );
        let d = dispatcher(collection, false).await;

        let query = QueryParams::parse(Some("id=-1&pageNumber=1"));
        assert!(d.plan(RewriteRule::MediaListView, &USER, &query).await.unwrap().is_none());
        assert!(d.plan(RewriteRule::MediaRootFolders, &USER, &query).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_moved_path_is_truncated_as_text() {
        let d = dispatcher(content_only(&[5]), false).await;
        let plan = d
            .plan(RewriteRule::MovedPath(Hierarchy::Content), &USER, &QueryParams::default())
            .await
            .unwrap()
            .unwrap();

        let outcome = d.apply(&plan, b"-1,1,5,12").await;
        assert_eq!(outcome.body, b"-1,5,12".to_vec());

        // no match leaves the path unchanged
        let outcome = d.apply(&plan, b"-1,2,30").await;
        assert_eq!(outcome.body, b"-1,2,30".to_vec());
    }
}
