//! Media upload guard.
//!
//! Drag-and-drop uploads bypass the tree, so a restricted user could drop
//! files into a folder their tree never shows. The guard inspects the save
//! batch at the media save notification point, cancels it when the target
//! folder is outside the user's media subtrees, and deletes any items the
//! host already persisted for the batch.
//!
//! The guard fails closed: an unset media assignment or an unparseable
//! item path both deny the upload.

use crate::backend::BackendClient;
use crate::error::FilterError;
use crate::filters::MediaSaveHandler;
use crate::hierarchy::HierarchyPath;
use crate::session::UserContext;
use crate::startnodes::StartNodeResolver;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

const CANCEL_CATEGORY: &str = "Permission denied";
const CANCEL_MESSAGE: &str = "You do not have permission to upload files to this folder.";

/// One media item in a pending save batch
#[derive(Debug, Clone)]
pub struct PendingMedia {
    /// `None` until the host assigns an id during the save
    pub id: Option<i64>,
    pub name: String,
    /// Comma-joined ancestor path including the item itself
    pub path: String,
}

/// Client-facing message attached to a cancelled save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelMessage {
    pub category: String,
    pub message: String,
}

/// Mutable arguments for a media save notification. Setting `cancellation`
/// aborts the save and surfaces the message to the client.
#[derive(Debug, Clone, Default)]
pub struct MediaSaveArgs {
    pub items: Vec<PendingMedia>,
    pub cancellation: Option<CancelMessage>,
}

impl MediaSaveArgs {
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_some()
    }
}

/// Cancels media saves that target folders outside the user's subtrees
pub struct UploadGuard {
    resolver: Arc<StartNodeResolver>,
    backend: Arc<BackendClient>,
}

impl UploadGuard {
    pub fn new(resolver: Arc<StartNodeResolver>, backend: Arc<BackendClient>) -> Self {
        Self { resolver, backend }
    }

    /// Remove items the host persisted before the batch was cancelled
    async fn delete_persisted(&self, args: &MediaSaveArgs) {
        for item in &args.items {
            let Some(id) = item.id else { continue };
            if let Err(e) = self.backend.delete_media(id).await {
                warn!(media = id, error = %e, "could not delete blocked upload");
            }
        }
    }
}

#[async_trait]
impl MediaSaveHandler for UploadGuard {
    async fn on_media_saving(
        &self,
        user: &UserContext,
        args: &mut MediaSaveArgs,
    ) -> Result<(), FilterError> {
        if user.admin {
            return Ok(());
        }
        // edits to existing items are covered by the response rewrites;
        // only fresh uploads are guarded here
        let Some(first) = args.items.first() else {
            return Ok(());
        };
        if first.id.is_some() {
            return Ok(());
        }

        let collection = self.resolver.start_nodes(user.id).await?;
        let nodes = &collection.media;
        if nodes.grants_root() {
            return Ok(());
        }

        let inside = !nodes.is_unset()
            && first
                .path
                .parse::<HierarchyPath>()
                .map(|path| path.contains_start_node(nodes))
                .unwrap_or(false);

        if inside {
            return Ok(());
        }

        debug!(user = user.id, path = %first.path, "blocking upload outside start nodes");
        args.cancellation = Some(CancelMessage {
            category: CANCEL_CATEGORY.to_string(),
            message: CANCEL_MESSAGE.to_string(),
        });
        self.delete_persisted(args).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpstreamConfig;
    use crate::hierarchy::{ROOT_ID, StartNodeCollection, StartNodeSet};
    use crate::startnodes::MemoryAssignmentStore;

    fn pending(path: &str) -> PendingMedia {
        PendingMedia {
            id: None,
            name: "photo.jpg".to_string(),
            path: path.to_string(),
        }
    }

    async fn guard_for(media: StartNodeSet) -> UploadGuard {
        let store = MemoryAssignmentStore::new();
        store
            .set(7, StartNodeCollection::new(StartNodeSet::unset(), media))
            .await;
        let backend = BackendClient::new(&UpstreamConfig {
            url: "http://127.0.0.1:9".to_string(),
            ..Default::default()
        })
        .unwrap();
        UploadGuard::new(
            Arc::new(StartNodeResolver::new(Arc::new(store))),
            Arc::new(backend),
        )
    }

    #[tokio::test]
    async fn test_upload_inside_subtree_is_allowed() {
        let guard = guard_for(StartNodeSet::from_ids([40])).await;
        let mut args = MediaSaveArgs {
            items: vec![pending("-1,40,55")],
            cancellation: None,
        };
        guard
            .on_media_saving(&UserContext::new(7), &mut args)
            .await
            .unwrap();
        assert!(!args.is_cancelled());
    }

    #[tokio::test]
    async fn test_upload_outside_subtree_is_cancelled() {
        let guard = guard_for(StartNodeSet::from_ids([40])).await;
        let mut args = MediaSaveArgs {
            items: vec![pending("-1,90,95")],
            cancellation: None,
        };
        guard
            .on_media_saving(&UserContext::new(7), &mut args)
            .await
            .unwrap();

        let cancel = args.cancellation.unwrap();
        assert_eq!(cancel.category, CANCEL_CATEGORY);
        assert_eq!(cancel.message, CANCEL_MESSAGE);
    }

    #[tokio::test]
    async fn test_unset_assignment_denies_upload() {
        let guard = guard_for(StartNodeSet::unset()).await;
        let mut args = MediaSaveArgs {
            items: vec![pending("-1,40,55")],
            cancellation: None,
        };
        guard
            .on_media_saving(&UserContext::new(7), &mut args)
            .await
            .unwrap();
        assert!(args.is_cancelled());
    }

    #[tokio::test]
    async fn test_malformed_path_denies_upload() {
        let guard = guard_for(StartNodeSet::from_ids([40])).await;
        let mut args = MediaSaveArgs {
            items: vec![pending("-1,forty,55")],
            cancellation: None,
        };
        guard
            .on_media_saving(&UserContext::new(7), &mut args)
            .await
            .unwrap();
        assert!(args.is_cancelled());
    }

    #[tokio::test]
    async fn test_root_sentinel_allows_everything() {
        let guard = guard_for(StartNodeSet::from_ids([ROOT_ID])).await;
        let mut args = MediaSaveArgs {
            items: vec![pending("-1,90,95")],
            cancellation: None,
        };
        guard
            .on_media_saving(&UserContext::new(7), &mut args)
            .await
            .unwrap();
        assert!(!args.is_cancelled());
    }

    #[tokio::test]
    async fn test_existing_items_are_not_guarded() {
        let guard = guard_for(StartNodeSet::from_ids([40])).await;
        let mut args = MediaSaveArgs {
            items: vec![PendingMedia {
                id: Some(55),
                name: "photo.jpg".to_string(),
                path: "-1,90,55".to_string(),
            }],
            cancellation: None,
        };
        guard
            .on_media_saving(&UserContext::new(7), &mut args)
            .await
            .unwrap();
        assert!(!args.is_cancelled());
    }

    #[tokio::test]
    async fn test_empty_batch_is_ignored() {
        let guard = guard_for(StartNodeSet::unset()).await;
        let mut args = MediaSaveArgs::default();
        guard
            .on_media_saving(&UserContext::new(7), &mut args)
            .await
            .unwrap();
        assert!(!args.is_cancelled());
    }
}
