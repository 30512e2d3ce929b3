//! # Per-Frame Update Contract
//!
//! Anything the frame driver ticks exactly once per frame.

/// A system driven once per frame by the host loop.
///
/// Both deltas are non-negative seconds since the previous frame. The
/// scaled delta follows the game's time scale (slow motion, pause); the
/// unscaled delta is wall time.
pub trait FrameUpdate {
    /// Short name used in frame statistics and logs.
    fn name(&self) -> &'static str;

    /// Advances the system by one frame.
    fn update(&mut self, dt_scaled: f32, dt_unscaled: f32);
}
