//! # Memory Management
//!
//! Record recycling for zero-allocation frames.
//!
//! ## Design Philosophy
//!
//! Bookkeeping records are created on first demand and then live forever:
//! - Released records are cleared, not freed
//! - The next acquire reuses them before constructing anything
//! - Steady-state frames perform no heap allocation

mod pool;

pub use pool::{PoolHandle, RecordPool, Recycle};
