//! # Entity Contracts
//!
//! What the deactivation pool needs from the host engine. Handles are
//! non-owning: holding one must not keep the entity alive, and a handle
//! whose entity was destroyed reports `is_alive() == false` instead of
//! failing.

use std::fmt::Debug;
use std::hash::Hash;

use crate::scene::Position;

/// A non-owning reference to a host entity.
pub trait EntityHandle: Clone {
    /// Identity of the entity, stable for its lifetime.
    type Key: Copy + Eq + Hash + Debug;

    /// Returns the entity's identity.
    fn key(&self) -> Self::Key;

    /// Liveness check. `false` once the host destroyed the entity.
    fn is_alive(&self) -> bool;

    /// Engine-level active flag.
    fn is_active(&self) -> bool;

    /// Sets the engine-level active flag. This is the expensive operation.
    fn set_active(&self, active: bool);
}

/// A non-owning reference to an entity's world transform.
pub trait TransformHandle: Clone {
    /// Reads the world position.
    fn position(&self) -> Position;

    /// Writes the world position. Cheap compared to toggling activity.
    fn set_position(&self, position: Position);
}
