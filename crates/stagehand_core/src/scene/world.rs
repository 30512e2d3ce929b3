//! # Scene
//!
//! A minimal host scene: a slot/generation store of nodes with a position
//! and an engine-level active flag. It stands in for whatever engine owns
//! the real entities and is what the tests and benchmarks drive.

use std::cell::RefCell;
use std::rc::Rc;

use super::component::Position;
use super::entity::NodeId;

/// A scene shared between its owner and non-owning node handles.
pub type SharedScene = Rc<RefCell<Scene>>;

/// One node slot.
#[derive(Clone, Copy, Debug)]
struct NodeSlot {
    id: NodeId,
    alive: bool,
    active: bool,
    position: Position,
}

impl NodeSlot {
    const fn vacant() -> Self {
        Self {
            id: NodeId::new(0, 0),
            alive: false,
            active: false,
            position: Position::ZERO,
        }
    }
}

/// Slot storage for scene nodes.
///
/// Destroyed slots are recycled with a bumped generation so stale
/// [`NodeId`]s never alias a newer node.
#[derive(Debug, Default)]
pub struct Scene {
    slots: Vec<NodeSlot>,
    free_indices: Vec<u32>,
    alive_count: usize,
    /// Engine-level active flag flips, counted because they are the
    /// expensive operation the deactivation pool rations.
    activation_changes: u64,
}

impl Scene {
    /// Creates an empty scene with room for `capacity` nodes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_indices: Vec::new(),
            alive_count: 0,
            activation_changes: 0,
        }
    }

    /// Creates an empty scene wrapped for sharing with node handles.
    #[must_use]
    pub fn shared(capacity: usize) -> SharedScene {
        Rc::new(RefCell::new(Self::with_capacity(capacity)))
    }

    /// Number of live nodes.
    #[inline]
    #[must_use]
    pub const fn alive_count(&self) -> usize {
        self.alive_count
    }

    /// Number of engine-level active flag changes so far.
    #[inline]
    #[must_use]
    pub const fn activation_changes(&self) -> u64 {
        self.activation_changes
    }

    /// Spawns an active node at `position`.
    ///
    /// # Panics
    ///
    /// Panics if the scene already holds `u32::MAX` slots.
    pub fn spawn(&mut self, position: Position) -> NodeId {
        let index = if let Some(index) = self.free_indices.pop() {
            index
        } else {
            let index = u32::try_from(self.slots.len()).expect("scene slot count exceeds u32");
            self.slots.push(NodeSlot::vacant());
            index
        };

        let slot = &mut self.slots[index as usize];
        // Increment generation to invalidate old handles
        let generation = slot.id.generation().wrapping_add(1);
        let id = NodeId::new(index, generation);
        *slot = NodeSlot {
            id,
            alive: true,
            active: true,
            position,
        };
        self.alive_count += 1;
        id
    }

    /// Destroys a node. Returns `false` if it was already gone.
    pub fn destroy(&mut self, id: NodeId) -> bool {
        let Some(slot) = self.slot_mut(id) else {
            return false;
        };
        slot.alive = false;
        slot.active = false;
        self.alive_count -= 1;
        self.free_indices.push(id.index());
        true
    }

    /// Checks if a node is alive (not destroyed, generation matches).
    #[inline]
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.slot(id).is_some()
    }

    /// Returns the node's active flag, `false` for dead nodes.
    #[must_use]
    pub fn is_active(&self, id: NodeId) -> bool {
        self.slot(id).is_some_and(|slot| slot.active)
    }

    /// Sets the node's active flag. Returns `false` for dead nodes.
    pub fn set_active(&mut self, id: NodeId, active: bool) -> bool {
        let Some(slot) = self.slot_mut(id) else {
            return false;
        };
        if slot.active != active {
            slot.active = active;
            self.activation_changes += 1;
        }
        true
    }

    /// Returns the node's position.
    #[must_use]
    pub fn position(&self, id: NodeId) -> Option<Position> {
        self.slot(id).map(|slot| slot.position)
    }

    /// Moves a node. Returns `false` for dead nodes.
    pub fn set_position(&mut self, id: NodeId, position: Position) -> bool {
        let Some(slot) = self.slot_mut(id) else {
            return false;
        };
        slot.position = position;
        true
    }

    fn slot(&self, id: NodeId) -> Option<&NodeSlot> {
        if id.is_null() {
            return None;
        }
        self.slots
            .get(id.index() as usize)
            .filter(|slot| slot.alive && slot.id == id)
    }

    fn slot_mut(&mut self, id: NodeId) -> Option<&mut NodeSlot> {
        if id.is_null() {
            return None;
        }
        self.slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.alive && slot.id == id)
    }
}
