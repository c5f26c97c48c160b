//! Assignment store
//!
//! Persistence of per-user start node assignments lives outside this crate;
//! [`AssignmentStore`] is the lookup interface it is consumed through. The
//! HTTP-backed implementation talks to the back-office plugin API; the
//! in-memory implementation backs tests and embedded use.

use crate::backend::BackendClient;
use crate::error::LookupError;
use crate::hierarchy::{StartNodeCollection, StartNodeSet};
// async_trait required for dyn-compatibility with Arc<dyn AssignmentStore>
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Lookup service for per-user start node assignments
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    /// Fetch the user's start node sets for both hierarchies.
    ///
    /// A user with no assignment row at all yields an unset collection;
    /// the distinction between "no row" and "row with empty sets" matters
    /// to the filters and must be preserved.
    async fn start_nodes_by_user(&self, user_id: i64) -> Result<StartNodeCollection, LookupError>;
}

/// Wire shape of an assignment row as served by the back-office plugin API.
///
/// `null` (or an absent field) means unset, distinct from an empty list.
#[derive(Debug, Deserialize)]
struct AssignmentRow {
    #[serde(default)]
    content: Option<Vec<i64>>,
    #[serde(default)]
    media: Option<Vec<i64>>,
}

impl From<AssignmentRow> for StartNodeCollection {
    fn from(row: AssignmentRow) -> Self {
        StartNodeCollection::new(StartNodeSet::from(row.content), StartNodeSet::from(row.media))
    }
}

/// Assignment store backed by the back-office plugin API
pub struct HttpAssignmentStore {
    backend: Arc<BackendClient>,
    /// Path under the back-office API prefix, e.g. `/startnodes/users`
    base_path: String,
}

impl HttpAssignmentStore {
    pub fn new(backend: Arc<BackendClient>, base_path: impl Into<String>) -> Self {
        Self {
            backend,
            base_path: base_path.into(),
        }
    }
}

#[async_trait]
impl AssignmentStore for HttpAssignmentStore {
    async fn start_nodes_by_user(&self, user_id: i64) -> Result<StartNodeCollection, LookupError> {
        let row: AssignmentRow = self
            .backend
            .get(&format!("{}/{}", self.base_path, user_id))
            .await?;
        Ok(row.into())
    }
}

/// In-memory assignment store for tests and embedded hosts
#[derive(Default)]
pub struct MemoryAssignmentStore {
    assignments: RwLock<HashMap<i64, StartNodeCollection>>,
}

impl MemoryAssignmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, user_id: i64, collection: StartNodeCollection) {
        self.assignments.write().await.insert(user_id, collection);
    }
}

#[async_trait]
impl AssignmentStore for MemoryAssignmentStore {
    async fn start_nodes_by_user(&self, user_id: i64) -> Result<StartNodeCollection, LookupError> {
        Ok(self
            .assignments
            .read()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_else(StartNodeCollection::empty))
    }
}
