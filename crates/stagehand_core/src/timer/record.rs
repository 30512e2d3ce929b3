//! # Timer Records
//!
//! Pooled bookkeeping for one timer, plus the public option and id types.

use std::fmt;

use super::callback::TimerCallback;
use crate::memory::Recycle;

/// Identity of a timer.
///
/// Assigned once when a record is first created and kept for the record's
/// whole pool lifetime. A reused record keeps its id, so an id is only
/// unique among timers that are alive at the same time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TimerId(u32);

impl TimerId {
    /// Wraps a raw id.
    #[inline]
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw id (always positive for ids handed out by a scheduler).
    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Which per-frame delta drives a timer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimeSource {
    /// Game time: follows time scale, stops while paused.
    Scaled,
    /// Wall time: ignores time scale.
    #[default]
    Unscaled,
}

/// Interval, repeat count and time source of a timer.
///
/// ```rust,ignore
/// // Fire every 0.5s of game time, 10 times
/// let options = TimerOptions::interval(0.5).repeat(10).scaled();
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimerOptions {
    /// Seconds between firings. Must be finite and positive.
    pub interval: f32,
    /// Number of firings; `<= 0` repeats until removed.
    pub repeat: i32,
    /// Delta that drives this timer.
    pub time_source: TimeSource,
}

impl Default for TimerOptions {
    fn default() -> Self {
        Self {
            interval: 1.0,
            repeat: 1,
            time_source: TimeSource::Unscaled,
        }
    }
}

impl TimerOptions {
    /// One firing after `secs`.
    #[must_use]
    pub fn interval(secs: f32) -> Self {
        Self {
            interval: secs,
            ..Self::default()
        }
    }

    /// Sets the repeat count.
    #[must_use]
    pub const fn repeat(mut self, times: i32) -> Self {
        self.repeat = times;
        self
    }

    /// Repeats until removed.
    #[must_use]
    pub const fn forever(mut self) -> Self {
        self.repeat = 0;
        self
    }

    /// Driven by the scaled delta.
    #[must_use]
    pub const fn scaled(mut self) -> Self {
        self.time_source = TimeSource::Scaled;
        self
    }

    /// Driven by the unscaled delta.
    #[must_use]
    pub const fn unscaled(mut self) -> Self {
        self.time_source = TimeSource::Unscaled;
        self
    }
}

/// Which list a record currently belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Membership {
    Pending,
    Active,
    Pooled,
}

/// A snapshot of one live timer, for diagnostics.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimerStatus {
    /// Timer id.
    pub id: TimerId,
    /// Firings so far.
    pub act_times: u32,
    /// Time accumulated since the last firing.
    pub elapsed: f32,
    /// Seconds between firings.
    pub interval: f32,
    /// Marked for removal, reclaimed by the next compaction.
    pub pending_removal: bool,
}

pub(crate) struct TimerRecord<T> {
    pub(crate) id: TimerId,
    pub(crate) on_update: Option<(TimerCallback<T>, T)>,
    pub(crate) on_complete: Option<(TimerCallback<T>, T)>,
    pub(crate) interval: f32,
    pub(crate) repeat: i32,
    pub(crate) elapsed: f32,
    pub(crate) act_times: u32,
    pub(crate) pending_removal: bool,
    pub(crate) time_source: TimeSource,
    pub(crate) membership: Membership,
}

impl<T> TimerRecord<T> {
    pub(crate) const fn new(id: TimerId) -> Self {
        Self {
            id,
            on_update: None,
            on_complete: None,
            interval: 0.0,
            repeat: 0,
            elapsed: 0.0,
            act_times: 0,
            pending_removal: false,
            time_source: TimeSource::Unscaled,
            membership: Membership::Pooled,
        }
    }

    /// True once a bounded timer has fired its full count.
    #[inline]
    pub(crate) fn is_exhausted(&self) -> bool {
        self.repeat > 0 && i64::from(self.act_times) >= i64::from(self.repeat)
    }

    pub(crate) fn status(&self) -> TimerStatus {
        TimerStatus {
            id: self.id,
            act_times: self.act_times,
            elapsed: self.elapsed,
            interval: self.interval,
            pending_removal: self.pending_removal,
        }
    }
}

impl<T> Recycle for TimerRecord<T> {
    fn recycle(&mut self) {
        // Drop callbacks and payloads; keep the id
        self.on_update = None;
        self.on_complete = None;
        self.interval = 0.0;
        self.repeat = 0;
        self.elapsed = 0.0;
        self.act_times = 0;
        self.pending_removal = false;
        self.time_source = TimeSource::Unscaled;
        self.membership = Membership::Pooled;
    }
}
