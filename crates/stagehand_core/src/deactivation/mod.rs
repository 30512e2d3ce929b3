//! # Deferred Deactivation
//!
//! Hides entities immediately and spreads the expensive engine-level
//! deactivation over later frames.
//!
//! ## Design Philosophy
//!
//! Toggling an entity's active flag can cost a frame spike when many
//! entities go at once. The pool:
//! - Makes the visible change synchronously by moving the entity away
//! - Performs the real deactivation only after a delay
//! - Caps how many real deactivations one frame may perform

mod handle;
mod pool;
mod record;

pub use handle::{EntityHandle, TransformHandle};
pub use pool::{DeactivationPool, TickReport};
