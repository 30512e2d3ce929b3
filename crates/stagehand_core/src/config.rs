//! # Configuration
//!
//! Tuning for the scheduler and the deactivation pool, loadable from TOML.
//! Every table is optional; missing keys fall back to the defaults below.
//!
//! ```toml
//! [scheduler]
//! active_capacity = 1000
//! pending_capacity = 100
//!
//! [deactivation]
//! delay_secs = 5.0
//! max_per_tick = 2
//! hidden_position = [99999.0, 0.0, 0.0]
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{StagehandError, StagehandResult};
use crate::scene::Position;

/// List pre-allocation for the timer scheduler.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Reserved slots in the active list.
    pub active_capacity: usize,
    /// Reserved slots in the pending-add list.
    pub pending_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            active_capacity: 1000,
            pending_capacity: 100,
        }
    }
}

impl SchedulerConfig {
    /// Small footprint for tools and tests.
    #[must_use]
    pub const fn compact() -> Self {
        Self {
            active_capacity: 16,
            pending_capacity: 8,
        }
    }
}

/// Timing and throughput of the deferred deactivation pool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeactivationConfig {
    /// Seconds an entity stays hidden before it is fully deactivated.
    pub delay_secs: f32,
    /// Maximum full deactivations performed by one tick.
    pub max_per_tick: usize,
    /// Where hidden entities are parked.
    pub hidden_position: [f32; 3],
    /// Records reserved up front.
    pub initial_capacity: usize,
}

impl Default for DeactivationConfig {
    fn default() -> Self {
        Self {
            delay_secs: 5.0,
            max_per_tick: 2,
            hidden_position: [99_999.0, 0.0, 0.0],
            initial_capacity: 64,
        }
    }
}

impl DeactivationConfig {
    /// Immediate deactivation, one per tick. Useful when stepping frames by hand.
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            delay_secs: 0.0,
            max_per_tick: 1,
            hidden_position: [99_999.0, 0.0, 0.0],
            initial_capacity: 16,
        }
    }

    /// The delay as a [`Duration`], saturating at [`Duration::MAX`].
    ///
    /// Only meaningful after [`validate`](Self::validate) succeeded.
    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::try_from_secs_f32(self.delay_secs.max(0.0)).unwrap_or(Duration::MAX)
    }

    /// The parking spot as a [`Position`].
    #[must_use]
    pub fn hidden(&self) -> Position {
        Position::from_array(self.hidden_position)
    }

    /// Checks ranges.
    ///
    /// # Errors
    ///
    /// Returns [`StagehandError::InvalidConfig`] if the delay is negative,
    /// not finite or too large for a [`Duration`], if the per-tick cap is
    /// zero, or if the hidden position is not finite.
    pub fn validate(&self) -> StagehandResult<()> {
        if self.delay_secs < 0.0 || Duration::try_from_secs_f32(self.delay_secs).is_err() {
            return Err(StagehandError::InvalidConfig {
                field: "deactivation.delay_secs",
                reason: format!("{} is not a representable, non-negative duration", self.delay_secs),
            });
        }
        if self.max_per_tick == 0 {
            return Err(StagehandError::InvalidConfig {
                field: "deactivation.max_per_tick",
                reason: "must be at least 1".to_owned(),
            });
        }
        if self.hidden_position.iter().any(|c| !c.is_finite()) {
            return Err(StagehandError::InvalidConfig {
                field: "deactivation.hidden_position",
                reason: format!("{:?} is not finite", self.hidden_position),
            });
        }
        Ok(())
    }
}

/// Top-level configuration for the core components.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StagehandConfig {
    /// Timer scheduler settings.
    pub scheduler: SchedulerConfig,
    /// Deactivation pool settings.
    pub deactivation: DeactivationConfig,
}

impl StagehandConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`StagehandError::ConfigParse`] for malformed TOML and
    /// [`StagehandError::InvalidConfig`] for out-of-range values.
    pub fn from_toml_str(source: &str) -> StagehandResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`StagehandError::ConfigIo`] if the file cannot be read, plus
    /// everything [`from_toml_str`](Self::from_toml_str) can return.
    pub fn load(path: impl AsRef<Path>) -> StagehandResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&source)?;
        tracing::info!(path = %path.display(), "loaded stagehand config");
        Ok(config)
    }

    /// Checks every section.
    ///
    /// # Errors
    ///
    /// Returns the first [`StagehandError::InvalidConfig`] found.
    pub fn validate(&self) -> StagehandResult<()> {
        self.deactivation.validate()
    }
}
