//! Tree filter and upload guard integration tests with mock entity service

use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use treegate::backend::BackendClient;
use treegate::config::UpstreamConfig;
use treegate::filters::{TreeNode, TreeRenderArgs, default_registry};
use treegate::filters::{MenuItem, MenuRenderArgs};
use treegate::guard::{MediaSaveArgs, PendingMedia};
use treegate::hierarchy::{Hierarchy, StartNodeCollection, StartNodeSet};
use treegate::session::UserContext;
use treegate::startnodes::{MemoryAssignmentStore, StartNodeResolver};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn registry_for(
    mock_server: &MockServer,
    collection: StartNodeCollection,
) -> treegate::filters::EventRegistry {
    let backend = Arc::new(
        BackendClient::new(&UpstreamConfig {
            url: mock_server.uri(),
            max_retries: 0,
            ..Default::default()
        })
        .unwrap(),
    );
    let store = MemoryAssignmentStore::new();
    store.set(7, collection).await;
    default_registry(Arc::new(StartNodeResolver::new(Arc::new(store))), backend)
}

fn placeholder_nodes(count: usize) -> Vec<TreeNode> {
    (0..count).map(|_| TreeNode::default()).collect()
}

#[tokio::test]
async fn test_content_tree_root_becomes_start_nodes() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/backoffice/api/entity/getbyids"))
        .and(query_param("type", "Document"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 2001, "name": "Zoo", "path": "-1,2001", "icon": "icon-home", "hasChildren": true},
            {"id": 1054, "name": "About", "path": "-1,1054", "hasChildren": false}
        ])))
        .mount(&mock_server)
        .await;

    let registry = registry_for(
        &mock_server,
        StartNodeCollection::new(
            StartNodeSet::from_ids([1054, 2001]),
            StartNodeSet::unset(),
        ),
    )
    .await;

    let mut args = TreeRenderArgs {
        query: HashMap::new(),
        nodes: placeholder_nodes(5),
    };
    registry
        .tree_rendered(Hierarchy::Content, &UserContext::new(7), &mut args)
        .await
        .unwrap();

    // sorted by name, rooted at the synthetic root
    assert_eq!(args.nodes.len(), 2);
    assert_eq!(args.nodes[0].name, "About");
    assert_eq!(args.nodes[1].name, "Zoo");
    assert_eq!(args.nodes[0].parent_id, "-1");
    assert!(args.nodes[1].has_children);
    assert_eq!(args.nodes[1].icon, "icon-home");
}

#[tokio::test]
async fn test_unassigned_user_sees_empty_tree() {
    let mock_server = MockServer::start().await;
    let registry = registry_for(&mock_server, StartNodeCollection::empty()).await;

    let mut args = TreeRenderArgs {
        query: HashMap::new(),
        nodes: placeholder_nodes(3),
    };
    registry
        .tree_rendered(Hierarchy::Media, &UserContext::new(7), &mut args)
        .await
        .unwrap();

    assert!(args.nodes.is_empty());
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_menu_on_start_node_loses_destructive_actions() {
    let mock_server = MockServer::start().await;
    let registry = registry_for(
        &mock_server,
        StartNodeCollection::new(StartNodeSet::from_ids([1054]), StartNodeSet::unset()),
    )
    .await;

    let mut args = MenuRenderArgs {
        node_id: "1054".to_string(),
        items: ["create", "delete", "move", "copy", "publish"]
            .iter()
            .map(|alias| MenuItem {
                alias: alias.to_string(),
                name: alias.to_uppercase(),
            })
            .collect(),
    };
    registry
        .menu_rendered(Hierarchy::Content, &UserContext::new(7), &mut args)
        .await
        .unwrap();

    let aliases: Vec<&str> = args.items.iter().map(|i| i.alias.as_str()).collect();
    assert_eq!(aliases, vec!["create", "publish"]);
}

#[tokio::test]
async fn test_blocked_upload_is_cancelled_and_rolled_back() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/backoffice/api/media/deletebyid"))
        .and(query_param("id", "56"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let registry = registry_for(
        &mock_server,
        StartNodeCollection::new(StartNodeSet::unset(), StartNodeSet::from_ids([40])),
    )
    .await;

    // batch targeting a folder outside the subtree; the second item was
    // already persisted by the host and must be removed again
    let mut args = MediaSaveArgs {
        items: vec![
            PendingMedia {
                id: None,
                name: "a.jpg".to_string(),
                path: "-1,90,95".to_string(),
            },
            PendingMedia {
                id: Some(56),
                name: "b.jpg".to_string(),
                path: "-1,90,56".to_string(),
            },
        ],
        cancellation: None,
    };
    registry
        .media_saving(&UserContext::new(7), &mut args)
        .await
        .unwrap();

    assert!(args.is_cancelled());
    let cancel = args.cancellation.unwrap();
    assert_eq!(cancel.category, "Permission denied");
}

#[tokio::test]
async fn test_allowed_upload_is_untouched() {
    let mock_server = MockServer::start().await;
    let registry = registry_for(
        &mock_server,
        StartNodeCollection::new(StartNodeSet::unset(), StartNodeSet::from_ids([40])),
    )
    .await;

    let mut args = MediaSaveArgs {
        items: vec![PendingMedia {
            id: None,
            name: "a.jpg".to_string(),
            path: "-1,40,95".to_string(),
        }],
        cancellation: None,
    };
    registry
        .media_saving(&UserContext::new(7), &mut args)
        .await
        .unwrap();

    assert!(!args.is_cancelled());
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}
