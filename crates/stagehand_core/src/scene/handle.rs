//! # Scene Node Handles
//!
//! [`SceneNode`] is the scene's implementation of the entity and transform
//! contracts. It holds a weak reference to the scene plus a generational
//! id, so it never keeps the scene alive and goes stale when its node is
//! destroyed.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::component::Position;
use super::entity::NodeId;
use super::world::{Scene, SharedScene};
use crate::deactivation::{EntityHandle, TransformHandle};

/// Non-owning handle to a node in a [`Scene`].
#[derive(Clone, Debug)]
pub struct SceneNode {
    id: NodeId,
    scene: Weak<RefCell<Scene>>,
}

impl SceneNode {
    /// Creates a handle for `id` in `scene`.
    #[must_use]
    pub fn new(scene: &SharedScene, id: NodeId) -> Self {
        Self {
            id,
            scene: Rc::downgrade(scene),
        }
    }

    /// Spawns a node and returns a handle to it.
    #[must_use]
    pub fn spawn(scene: &SharedScene, position: Position) -> Self {
        let id = scene.borrow_mut().spawn(position);
        Self::new(scene, id)
    }

    /// The node's id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// Destroys the node. Returns `false` if it or the scene is gone.
    pub fn destroy(&self) -> bool {
        self.with_scene(|scene| scene.destroy(self.id))
            .unwrap_or(false)
    }

    fn with_scene<R>(&self, f: impl FnOnce(&mut Scene) -> R) -> Option<R> {
        let scene = self.scene.upgrade()?;
        let mut guard = scene.borrow_mut();
        Some(f(&mut guard))
    }
}

impl EntityHandle for SceneNode {
    type Key = NodeId;

    fn key(&self) -> NodeId {
        self.id
    }

    fn is_alive(&self) -> bool {
        self.with_scene(|scene| scene.is_alive(self.id))
            .unwrap_or(false)
    }

    fn is_active(&self) -> bool {
        self.with_scene(|scene| scene.is_active(self.id))
            .unwrap_or(false)
    }

    fn set_active(&self, active: bool) {
        self.with_scene(|scene| scene.set_active(self.id, active));
    }
}

impl TransformHandle for SceneNode {
    fn position(&self) -> Position {
        self.with_scene(|scene| scene.position(self.id))
            .flatten()
            .unwrap_or_default()
    }

    fn set_position(&self, position: Position) {
        self.with_scene(|scene| scene.set_position(self.id, position));
    }
}
