//! # STAGEHAND
//!
//! Frame driver for the STAGEHAND scheduling core.
//!
//! ## Architecture Rules
//!
//! 1. **One tick per frame** - every system is advanced exactly once
//! 2. **Explicit context** - the [`Runtime`] is created and torn down by
//!    the host; there is no global instance
//! 3. **Bounded deltas** - long stalls are clamped before they reach game
//!    systems
//!
//! ## Example
//!
//! ```rust,ignore
//! use stagehand::{Runtime, RuntimeConfig};
//! use stagehand_core::{SceneNode, TimerCallback, TimerOptions};
//!
//! let mut runtime: Runtime<SceneNode, SceneNode> = Runtime::init(RuntimeConfig::default())?;
//! runtime.timers_mut().add(TimerCallback::from_fn(|| println!("tick")), None,
//!                          TimerOptions::interval(1.0).forever())?;
//! loop {
//!     runtime.frame();
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod frame_loop;
pub mod runtime;

pub use frame_loop::{FrameClock, FrameDelta, FrameLoop, FrameLoopConfig, FrameStats, LoopStats};
pub use runtime::{Runtime, RuntimeConfig, ShutdownReport};
