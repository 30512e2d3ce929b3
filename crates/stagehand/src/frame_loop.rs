//! # Frame Loop
//!
//! Variable-timestep frame driver.
//!
//! ## Design
//!
//! Each frame:
//! - Samples wall time once and clamps the delta (a debugger pause or a
//!   long load must not arrive as one giant step)
//! - Derives the scaled delta from the unscaled one via the time scale
//! - Drives every registered system exactly once, in order
//! - Records timing and warns about slow frames

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use stagehand_core::{FrameUpdate, StagehandError, StagehandResult};

/// Frame driver settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameLoopConfig {
    /// Multiplier from unscaled to scaled time. `0.0` pauses game time.
    pub time_scale: f32,
    /// Longest unscaled delta a single frame may report, in seconds.
    pub max_delta_secs: f32,
    /// Frames whose systems take longer than this are logged, in ms.
    pub slow_frame_ms: f32,
}

impl Default for FrameLoopConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            max_delta_secs: 0.25,
            slow_frame_ms: 33.0,
        }
    }
}

impl FrameLoopConfig {
    /// Headless hosts (servers, tools): tolerant of long frames.
    #[must_use]
    pub const fn headless() -> Self {
        Self {
            time_scale: 1.0,
            max_delta_secs: 1.0,
            slow_frame_ms: 250.0,
        }
    }

    /// Checks ranges.
    ///
    /// # Errors
    ///
    /// Returns [`StagehandError::InvalidConfig`] for a negative or
    /// non-finite time scale, a non-positive delta cap, or a slow-frame
    /// threshold that is not positive or too large for a [`Duration`].
    pub fn validate(&self) -> StagehandResult<()> {
        if !self.time_scale.is_finite() || self.time_scale < 0.0 {
            return Err(StagehandError::InvalidConfig {
                field: "frame.time_scale",
                reason: format!("{} is not a finite, non-negative scale", self.time_scale),
            });
        }
        if !self.max_delta_secs.is_finite() || self.max_delta_secs <= 0.0 {
            return Err(StagehandError::InvalidConfig {
                field: "frame.max_delta_secs",
                reason: format!("{} is not a positive duration", self.max_delta_secs),
            });
        }
        self.slow_frame().map(|_| ())
    }

    /// The slow-frame threshold as a [`Duration`].
    ///
    /// # Errors
    ///
    /// Returns [`StagehandError::InvalidConfig`] if the threshold is not
    /// positive or does not fit in a [`Duration`].
    pub fn slow_frame(&self) -> StagehandResult<Duration> {
        let invalid = || StagehandError::InvalidConfig {
            field: "frame.slow_frame_ms",
            reason: format!("{} is not a representable, positive duration", self.slow_frame_ms),
        };
        if self.slow_frame_ms.is_nan() || self.slow_frame_ms <= 0.0 {
            return Err(invalid());
        }
        Duration::try_from_secs_f32(self.slow_frame_ms / 1000.0).map_err(|_| invalid())
    }
}

/// The two deltas handed to every system.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameDelta {
    /// Game time since the previous frame.
    pub scaled: f32,
    /// Wall time since the previous frame.
    pub unscaled: f32,
}

/// Turns wall time into per-frame deltas.
#[derive(Clone, Debug)]
pub struct FrameClock {
    last: Option<Instant>,
    time_scale: f32,
    max_delta_secs: f32,
}

impl FrameClock {
    /// Creates a clock; the first sample reports a zero delta.
    #[must_use]
    pub fn new(config: &FrameLoopConfig) -> Self {
        Self {
            last: None,
            time_scale: config.time_scale,
            max_delta_secs: config.max_delta_secs,
        }
    }

    /// Measures the wall time since the previous sample.
    pub fn sample(&mut self) -> FrameDelta {
        let now = Instant::now();
        let raw = self
            .last
            .map_or(0.0, |last| now.duration_since(last).as_secs_f32());
        self.last = Some(now);
        self.delta_for(raw)
    }

    /// Clamps an externally measured wall delta and scales it.
    #[must_use]
    pub fn delta_for(&self, raw_secs: f32) -> FrameDelta {
        let unscaled = if raw_secs.is_finite() && raw_secs > 0.0 {
            raw_secs.min(self.max_delta_secs)
        } else {
            0.0
        };
        FrameDelta {
            scaled: unscaled * self.time_scale,
            unscaled,
        }
    }

    /// Current time scale.
    #[inline]
    #[must_use]
    pub const fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Changes the time scale. Negative or non-finite values are ignored.
    pub fn set_time_scale(&mut self, scale: f32) {
        if scale.is_finite() && scale >= 0.0 {
            self.time_scale = scale;
        } else {
            tracing::warn!(scale, "ignored invalid time scale");
        }
    }

    /// Forgets the previous sample, so the next frame reports zero.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// What one frame did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameStats {
    /// Frame number, starting at 1.
    pub frame: u64,
    /// Deltas passed to the systems.
    pub delta: FrameDelta,
    /// Time spent inside the systems.
    pub busy: Duration,
    /// Number of systems driven.
    pub systems: usize,
    /// Busy time exceeded the slow-frame threshold.
    pub slow: bool,
}

/// Running timing statistics over many frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Shortest busy time observed, in microseconds.
    pub min_frame_us: u64,
    /// Longest busy time observed, in microseconds.
    pub max_frame_us: u64,
    /// Rolling average busy time, in microseconds.
    pub avg_frame_us: u64,
    /// Frames over the slow threshold.
    pub slow_frames: u64,
    /// Frames measured.
    pub total_frames: u64,
}

impl LoopStats {
    const fn empty() -> Self {
        Self {
            min_frame_us: u64::MAX,
            max_frame_us: 0,
            avg_frame_us: 0,
            slow_frames: 0,
            total_frames: 0,
        }
    }

    fn record(&mut self, busy: Duration, slow: bool) {
        let busy_us = u64::try_from(busy.as_micros()).unwrap_or(u64::MAX);
        self.min_frame_us = self.min_frame_us.min(busy_us);
        self.max_frame_us = self.max_frame_us.max(busy_us);
        self.avg_frame_us = if self.total_frames == 0 {
            busy_us
        } else {
            // Rolling average
            self.avg_frame_us.saturating_mul(15).saturating_add(busy_us) / 16
        };
        self.total_frames += 1;
        if slow {
            self.slow_frames += 1;
        }
    }
}

/// Drives a set of [`FrameUpdate`] systems once per frame.
///
/// # Example
///
/// ```rust,ignore
/// let mut frame_loop = FrameLoop::new(FrameLoopConfig::default())?;
/// loop {
///     frame_loop.run_frame(&mut [&mut timers, &mut deactivation]);
///     render();
/// }
/// ```
#[derive(Debug)]
pub struct FrameLoop {
    clock: FrameClock,
    slow_frame: Duration,
    frame_count: u64,
    stats: LoopStats,
}

impl FrameLoop {
    /// Creates a frame loop.
    ///
    /// # Errors
    ///
    /// Returns [`StagehandError::InvalidConfig`] if `config` does not
    /// validate.
    pub fn new(config: &FrameLoopConfig) -> StagehandResult<Self> {
        config.validate()?;
        Ok(Self {
            clock: FrameClock::new(config),
            slow_frame: config.slow_frame()?,
            frame_count: 0,
            stats: LoopStats::empty(),
        })
    }

    /// Runs one frame timed by the wall clock.
    pub fn run_frame(&mut self, systems: &mut [&mut dyn FrameUpdate]) -> FrameStats {
        let delta = self.clock.sample();
        self.drive(delta, systems)
    }

    /// Runs one frame with an externally measured unscaled delta, for
    /// hosts that own their own timing (and for tests).
    pub fn run_frame_with(
        &mut self,
        dt_unscaled: f32,
        systems: &mut [&mut dyn FrameUpdate],
    ) -> FrameStats {
        let delta = self.clock.delta_for(dt_unscaled);
        self.drive(delta, systems)
    }

    fn drive(&mut self, delta: FrameDelta, systems: &mut [&mut dyn FrameUpdate]) -> FrameStats {
        self.frame_count += 1;
        let start = Instant::now();
        let mut slowest: Option<(&'static str, Duration)> = None;

        for system in systems.iter_mut() {
            let system_start = Instant::now();
            system.update(delta.scaled, delta.unscaled);
            let took = system_start.elapsed();
            if slowest.map_or(true, |(_, worst)| took > worst) {
                slowest = Some((system.name(), took));
            }
        }

        let busy = start.elapsed();
        let slow = busy > self.slow_frame;
        self.stats.record(busy, slow);

        if slow {
            let (system, system_time) = slowest.unwrap_or(("none", Duration::ZERO));
            tracing::warn!(
                frame = self.frame_count,
                busy_ms = busy.as_secs_f64() * 1000.0,
                slowest = system,
                slowest_ms = system_time.as_secs_f64() * 1000.0,
                "slow frame"
            );
        }

        FrameStats {
            frame: self.frame_count,
            delta,
            busy,
            systems: systems.len(),
            slow,
        }
    }

    /// Frames run so far.
    #[inline]
    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Timing statistics.
    #[must_use]
    pub const fn stats(&self) -> &LoopStats {
        &self.stats
    }

    /// Resets timing statistics.
    pub fn reset_stats(&mut self) {
        self.stats = LoopStats::empty();
    }

    /// The frame clock.
    #[must_use]
    pub const fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// Mutable access to the frame clock, e.g. to change the time scale.
    pub fn clock_mut(&mut self) -> &mut FrameClock {
        &mut self.clock
    }
}
