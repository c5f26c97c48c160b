//! Notification-point handler traits and their registry

use crate::backend::BackendClient;
use crate::error::FilterError;
use crate::filters::menu::{MenuRenderArgs, StartNodeMenuFilter};
use crate::filters::tree::{StartNodeTreeFilter, TreeRenderArgs};
use crate::guard::{MediaSaveArgs, UploadGuard};
use crate::hierarchy::Hierarchy;
use crate::session::UserContext;
use crate::startnodes::StartNodeResolver;
use async_trait::async_trait;
use std::sync::Arc;

/// Mutates a rendered navigation tree before it is returned to the client
#[async_trait]
pub trait TreeRenderHandler: Send + Sync {
    async fn on_tree_rendered(
        &self,
        user: &UserContext,
        args: &mut TreeRenderArgs,
    ) -> Result<(), FilterError>;
}

/// Mutates a node's context menu before it is returned to the client
#[async_trait]
pub trait MenuRenderHandler: Send + Sync {
    async fn on_menu_rendered(
        &self,
        user: &UserContext,
        args: &mut MenuRenderArgs,
    ) -> Result<(), FilterError>;
}

/// Inspects a media save batch before it is committed and may cancel it
#[async_trait]
pub trait MediaSaveHandler: Send + Sync {
    async fn on_media_saving(
        &self,
        user: &UserContext,
        args: &mut MediaSaveArgs,
    ) -> Result<(), FilterError>;
}

/// Ordered collection of handlers per notification point.
///
/// Handlers run in registration order; a failing handler aborts the
/// remainder of its point so a later handler never sees a half-filtered
/// argument set.
#[derive(Default)]
pub struct EventRegistry {
    tree: Vec<(Hierarchy, Box<dyn TreeRenderHandler>)>,
    menu: Vec<(Hierarchy, Box<dyn MenuRenderHandler>)>,
    save: Vec<Box<dyn MediaSaveHandler>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_tree(&mut self, hierarchy: Hierarchy, handler: Box<dyn TreeRenderHandler>) {
        self.tree.push((hierarchy, handler));
    }

    pub fn register_menu(&mut self, hierarchy: Hierarchy, handler: Box<dyn MenuRenderHandler>) {
        self.menu.push((hierarchy, handler));
    }

    pub fn register_save(&mut self, handler: Box<dyn MediaSaveHandler>) {
        self.save.push(handler);
    }

    pub async fn tree_rendered(
        &self,
        hierarchy: Hierarchy,
        user: &UserContext,
        args: &mut TreeRenderArgs,
    ) -> Result<(), FilterError> {
        for (registered, handler) in &self.tree {
            if *registered == hierarchy {
                handler.on_tree_rendered(user, args).await?;
            }
        }
        Ok(())
    }

    pub async fn menu_rendered(
        &self,
        hierarchy: Hierarchy,
        user: &UserContext,
        args: &mut MenuRenderArgs,
    ) -> Result<(), FilterError> {
        for (registered, handler) in &self.menu {
            if *registered == hierarchy {
                handler.on_menu_rendered(user, args).await?;
            }
        }
        Ok(())
    }

    pub async fn media_saving(
        &self,
        user: &UserContext,
        args: &mut MediaSaveArgs,
    ) -> Result<(), FilterError> {
        for handler in &self.save {
            handler.on_media_saving(user, args).await?;
        }
        Ok(())
    }
}

/// Registry with the full start node handler set wired in: tree and menu
/// filters for both hierarchies plus the media upload guard.
pub fn default_registry(
    resolver: Arc<StartNodeResolver>,
    backend: Arc<BackendClient>,
) -> EventRegistry {
    let mut registry = EventRegistry::new();
    for hierarchy in [Hierarchy::Content, Hierarchy::Media] {
        registry.register_tree(
            hierarchy,
            Box::new(StartNodeTreeFilter::new(
                hierarchy,
                Arc::clone(&resolver),
                Arc::clone(&backend),
            )),
        );
        registry.register_menu(
            hierarchy,
            Box::new(StartNodeMenuFilter::new(hierarchy, Arc::clone(&resolver))),
        );
    }
    registry.register_save(Box::new(UploadGuard::new(resolver, backend)));
    registry
}
