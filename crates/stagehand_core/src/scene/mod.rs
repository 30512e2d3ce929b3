//! # Scene Host
//!
//! A small in-memory scene implementing the entity and transform
//! contracts the deactivation pool works against.
//!
//! ## Design Philosophy
//!
//! - Nodes live in slots with generation counters
//! - Handles are weak and generational, never owning
//! - Toggling a node's active flag is counted, because that is the cost
//!   the deactivation pool exists to ration

mod component;
mod entity;
mod handle;
mod world;

pub use component::Position;
pub use entity::NodeId;
pub use handle::SceneNode;
pub use world::{Scene, SharedScene};
