//! # STAGEHAND Core
//!
//! Deferred scheduling and record pooling for frame-driven engines:
//! - Repeating and one-shot timers advanced once per frame
//! - Deferred entity deactivation, capped per frame
//! - Zero heap allocation once the pools are warm
//!
//! ## Architecture Rules
//!
//! 1. **Records are pooled** - created on first demand, then reused forever
//! 2. **Soft deletes** - removal sets a flag, compaction reclaims later
//! 3. **Single-threaded** - everything runs on the frame driver's thread
//!
//! ## Example
//!
//! ```rust,ignore
//! use stagehand_core::{Timers, TimerCallback, TimerOptions};
//!
//! let mut timers = Timers::new();
//! timers.add(TimerCallback::from_fn(|| spawn_wave()), None,
//!            TimerOptions::interval(30.0).forever().scaled())?;
//!
//! // Every frame
//! timers.advance(dt * time_scale, dt);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod clock;
pub mod config;
pub mod deactivation;
pub mod error;
pub mod frame;
pub mod memory;
pub mod scene;
pub mod timer;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{DeactivationConfig, SchedulerConfig, StagehandConfig};
pub use deactivation::{DeactivationPool, EntityHandle, TickReport, TransformHandle};
pub use error::{StagehandError, StagehandResult};
pub use frame::FrameUpdate;
pub use memory::{PoolHandle, RecordPool, Recycle};
pub use scene::{NodeId, Position, Scene, SceneNode, SharedScene};
pub use timer::{
    AdvanceReport, TimeSource, TimerCallback, TimerContext, TimerId, TimerOptions,
    TimerScheduler, TimerStatus, Timers,
};
