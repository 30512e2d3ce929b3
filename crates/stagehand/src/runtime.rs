//! # Runtime Context
//!
//! One timer scheduler, one deactivation pool and one frame loop, owned by
//! whoever owns the game loop. Created with [`Runtime::init`], torn down
//! with [`Runtime::shutdown`]; nothing is global.

use std::path::Path;

use serde::{Deserialize, Serialize};
use stagehand_core::{
    Clock, DeactivationPool, EntityHandle, FrameUpdate, MonotonicClock, StagehandConfig,
    StagehandResult, TimerScheduler, TransformHandle,
};

use crate::frame_loop::{FrameLoop, FrameLoopConfig, FrameStats};

/// Everything a [`Runtime`] is built from.
///
/// ```toml
/// [core.scheduler]
/// active_capacity = 256
///
/// [core.deactivation]
/// delay_secs = 5.0
/// max_per_tick = 2
///
/// [frame]
/// time_scale = 1.0
/// max_delta_secs = 0.25
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Scheduler and deactivation settings.
    pub core: StagehandConfig,
    /// Frame driver settings.
    pub frame: FrameLoopConfig,
}

impl RuntimeConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns a parse error for malformed TOML and
    /// [`StagehandError::InvalidConfig`](stagehand_core::StagehandError::InvalidConfig)
    /// for out-of-range values.
    pub fn from_toml_str(source: &str) -> StagehandResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, plus everything
    /// [`from_toml_str`](Self::from_toml_str) can return.
    pub fn load(path: impl AsRef<Path>) -> StagehandResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&source)?;
        tracing::info!(path = %path.display(), "loaded runtime config");
        Ok(config)
    }

    /// Checks every section.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field found.
    pub fn validate(&self) -> StagehandResult<()> {
        self.core.validate()?;
        self.frame.validate()
    }
}

/// What [`Runtime::shutdown`] released.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Timers that were still pending or active.
    pub timers_released: usize,
    /// Deactivations that were still queued.
    pub deactivations_released: usize,
    /// Frames run over the runtime's lifetime.
    pub frames: u64,
}

/// Process-wide scheduling context.
///
/// `E`/`X` are the host's entity and transform handles, `P` the timer
/// payload and `C` the clock the deactivation delay is measured against.
///
/// # Example
///
/// ```rust,ignore
/// let mut runtime: Runtime<SceneNode, SceneNode> = Runtime::init(RuntimeConfig::load("stagehand.toml")?)?;
///
/// while running {
///     runtime.frame();
///     game_logic(&mut runtime);
/// }
/// runtime.shutdown();
/// ```
pub struct Runtime<E, X, P = (), C = MonotonicClock>
where
    E: EntityHandle,
{
    timers: TimerScheduler<P>,
    deactivation: DeactivationPool<E, X, C>,
    frame_loop: FrameLoop,
}

impl<E, X, P> Runtime<E, X, P, MonotonicClock>
where
    E: EntityHandle,
    X: TransformHandle,
    P: Clone,
{
    /// Builds the runtime, measuring deactivation delays in real time.
    ///
    /// # Errors
    ///
    /// Returns [`StagehandError::InvalidConfig`](stagehand_core::StagehandError::InvalidConfig)
    /// if any section does not validate.
    pub fn init(config: RuntimeConfig) -> StagehandResult<Self> {
        Self::with_clock(config, MonotonicClock::new())
    }
}

impl<E, X, P, C> Runtime<E, X, P, C>
where
    E: EntityHandle,
    X: TransformHandle,
    P: Clone,
    C: Clock,
{
    /// Builds the runtime with a custom deactivation clock.
    ///
    /// # Errors
    ///
    /// Returns [`StagehandError::InvalidConfig`](stagehand_core::StagehandError::InvalidConfig)
    /// if any section does not validate.
    pub fn with_clock(config: RuntimeConfig, clock: C) -> StagehandResult<Self> {
        config.validate()?;
        let RuntimeConfig { core, frame } = config;

        let runtime = Self {
            timers: TimerScheduler::with_config(&core.scheduler),
            deactivation: DeactivationPool::with_clock(core.deactivation, clock)?,
            frame_loop: FrameLoop::new(&frame)?,
        };
        tracing::info!(
            delay_secs = runtime.deactivation.config().delay_secs,
            max_per_tick = runtime.deactivation.config().max_per_tick,
            time_scale = frame.time_scale,
            "stagehand runtime initialized"
        );
        Ok(runtime)
    }

    /// Runs one frame timed by the wall clock: advances the timers, then
    /// ticks the deactivation pool.
    pub fn frame(&mut self) -> FrameStats {
        let mut systems: [&mut dyn FrameUpdate; 2] = [&mut self.timers, &mut self.deactivation];
        self.frame_loop.run_frame(&mut systems)
    }

    /// Runs one frame with an explicit unscaled delta.
    pub fn step(&mut self, dt_unscaled: f32) -> FrameStats {
        let mut systems: [&mut dyn FrameUpdate; 2] = [&mut self.timers, &mut self.deactivation];
        self.frame_loop.run_frame_with(dt_unscaled, &mut systems)
    }

    /// The timer scheduler.
    #[must_use]
    pub const fn timers(&self) -> &TimerScheduler<P> {
        &self.timers
    }

    /// Mutable access to the timer scheduler.
    pub fn timers_mut(&mut self) -> &mut TimerScheduler<P> {
        &mut self.timers
    }

    /// The deactivation pool.
    #[must_use]
    pub const fn deactivation(&self) -> &DeactivationPool<E, X, C> {
        &self.deactivation
    }

    /// Mutable access to the deactivation pool.
    pub fn deactivation_mut(&mut self) -> &mut DeactivationPool<E, X, C> {
        &mut self.deactivation
    }

    /// The frame loop.
    #[must_use]
    pub const fn frame_loop(&self) -> &FrameLoop {
        &self.frame_loop
    }

    /// Mutable access to the frame loop, e.g. to change the time scale.
    pub fn frame_loop_mut(&mut self) -> &mut FrameLoop {
        &mut self.frame_loop
    }

    /// Releases every outstanding timer and deactivation record.
    ///
    /// Queued entities are left where they are (hidden, still active).
    pub fn shutdown(mut self) -> ShutdownReport {
        let report = ShutdownReport {
            timers_released: self.timers.clear(),
            deactivations_released: self.deactivation.clear(),
            frames: self.frame_loop.frame_count(),
        };
        tracing::info!(
            timers = report.timers_released,
            deactivations = report.deactivations_released,
            frames = report.frames,
            "stagehand runtime shut down"
        );
        report
    }
}
