//! # Timer Scheduler
//!
//! Repeating and one-shot timers advanced by the frame driver.
//!
//! ## Design Philosophy
//!
//! - Records are pooled and reused; ids stay with the record
//! - Removal is a soft-delete flag, reclaimed by the next compaction
//! - Callbacks mutate the scheduler only through [`TimerContext`], which
//!   defers every change so the active-list walk is never disturbed

mod callback;
mod context;
mod record;
mod scheduler;

pub use callback::TimerCallback;
pub use context::TimerContext;
pub use record::{TimeSource, TimerId, TimerOptions, TimerStatus};
pub use scheduler::{AdvanceReport, TimerScheduler, Timers};
