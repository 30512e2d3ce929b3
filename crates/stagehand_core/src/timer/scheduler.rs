//! # Timer Scheduler
//!
//! Frame-driven repeating and one-shot timers.
//!
//! ## Advance
//!
//! ```text
//! advance(dt_scaled, dt_unscaled)
//!   1. PROMOTE  pending-add list ──> active list   (removed-before-start ──> pool)
//!   2. FIRE     walk active[0..len at start]       (callbacks may add / flag)
//!   3. COMPACT  stable in-place sweep              (flagged ──> pool, truncate)
//! ```
//!
//! Outside of an advance every record is in exactly one of: the pending-add
//! list, the active list, or the pool. After an advance the active list
//! holds no flagged record.

use std::fmt;

use super::callback::TimerCallback;
use super::context::TimerContext;
use super::record::{Membership, TimeSource, TimerId, TimerOptions, TimerRecord, TimerStatus};
use crate::config::SchedulerConfig;
use crate::error::{StagehandError, StagehandResult};
use crate::frame::FrameUpdate;
use crate::memory::{PoolHandle, RecordPool};

/// Payload-less scheduler.
pub type Timers = TimerScheduler<()>;

/// Counters from one [`TimerScheduler::advance`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AdvanceReport {
    /// Pending timers moved into the active list.
    pub promoted: usize,
    /// Pending timers removed before they ever ran.
    pub discarded: usize,
    /// Update callbacks invoked.
    pub fired: usize,
    /// Timers that reached their repeat count.
    pub completed: usize,
    /// Records returned to the pool by compaction.
    pub recycled: usize,
}

/// Repeating / one-shot timer scheduler, generic over the callback payload.
///
/// Records are pooled: once the scheduler has seen its peak number of
/// concurrent timers, adding and completing timers allocates nothing.
///
/// # Thread Safety
///
/// Single-threaded. Callbacks are not `Send` and run on the thread that
/// calls [`advance`](Self::advance).
///
/// # Example
///
/// ```rust,ignore
/// let mut timers = Timers::new();
/// let id = timers.add(TimerCallback::from_fn(|| println!("tick")), None,
///                     TimerOptions::interval(1.0).repeat(3))?;
///
/// // Once per frame
/// timers.advance(dt_scaled, dt_unscaled);
/// ```
pub struct TimerScheduler<T> {
    /// Every record ever created. Slot `n` holds the record with id `n + 1`.
    records: RecordPool<TimerRecord<T>>,
    /// Registered since the last advance; not firing yet.
    pending: Vec<PoolHandle>,
    /// Live timers in insertion order.
    active: Vec<PoolHandle>,
    /// Last id handed to a freshly created record.
    next_id: u32,
}

impl<T> TimerScheduler<T> {
    /// Creates a scheduler with the default list reservations.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&SchedulerConfig::default())
    }

    /// Creates a scheduler with the given list reservations.
    #[must_use]
    pub fn with_config(config: &SchedulerConfig) -> Self {
        Self {
            records: RecordPool::with_capacity(config.active_capacity + config.pending_capacity),
            pending: Vec::with_capacity(config.pending_capacity),
            active: Vec::with_capacity(config.active_capacity),
            next_id: 0,
        }
    }

    /// Registers a timer and returns its id.
    ///
    /// The timer joins the pending-add list and starts counting on the next
    /// [`advance`](Self::advance); nothing fires synchronously. `arg` is
    /// passed to every `on_update` call, the paired payload to the single
    /// `on_complete` call.
    ///
    /// # Errors
    ///
    /// Returns [`StagehandError::InvalidInterval`] if the interval is not
    /// finite and strictly positive.
    pub fn add_timer(
        &mut self,
        on_update: TimerCallback<T>,
        arg: T,
        on_complete: Option<(TimerCallback<T>, T)>,
        options: TimerOptions,
    ) -> StagehandResult<TimerId> {
        if !(options.interval.is_finite() && options.interval > 0.0) {
            tracing::warn!(interval = options.interval, "rejected timer with invalid interval");
            return Err(StagehandError::InvalidInterval(options.interval));
        }

        let next_id = &mut self.next_id;
        let handle = self.records.acquire(|| {
            *next_id += 1;
            TimerRecord::new(TimerId::new(*next_id))
        });

        let record = &mut self.records[handle];
        record.on_update = Some((on_update, arg));
        record.on_complete = on_complete;
        record.interval = options.interval;
        record.repeat = options.repeat;
        record.time_source = options.time_source;
        record.elapsed = 0.0;
        record.act_times = 0;
        record.pending_removal = false;
        record.membership = Membership::Pending;
        let id = record.id;

        self.pending.push(handle);
        tracing::trace!(
            timer = %id,
            interval = options.interval,
            repeat = options.repeat,
            "timer added"
        );
        Ok(id)
    }

    /// Removes the first timer whose update callback is `callback`
    /// (identity, not equality). Active timers are searched before pending
    /// ones. Returns whether a timer was newly removed.
    ///
    /// The first match is the same timer until the next advance drops it, so
    /// calling this again before then returns `false` and removes nothing,
    /// even when later timers share the callback.
    pub fn remove_first_timer_by_callback(&mut self, callback: &TimerCallback<T>) -> bool {
        let first = self
            .active
            .iter()
            .chain(&self.pending)
            .copied()
            .find(|&handle| calls(&self.records[handle], callback));
        let Some(handle) = first else {
            return false;
        };
        let record = &mut self.records[handle];
        if record.pending_removal {
            return false;
        }
        record.pending_removal = true;
        true
    }

    /// Removes every live timer whose update callback is `callback`.
    /// Returns how many were removed.
    pub fn remove_all_timers_by_callback(&mut self, callback: &TimerCallback<T>) -> usize {
        let mut removed = 0;
        for &handle in self.active.iter().chain(&self.pending) {
            let record = &mut self.records[handle];
            if is_live_match(record, callback) {
                record.pending_removal = true;
                removed += 1;
            }
        }
        removed
    }

    /// Removes a timer by id. Returns `false` if no live timer has that id.
    ///
    /// A timer removed before its first advance never fires. A timer removed
    /// from inside a callback does not fire later in the same pass.
    pub fn remove_timer_by_id(&mut self, id: TimerId) -> bool {
        let Some(handle) = self.live_handle(id) else {
            return false;
        };
        let record = &mut self.records[handle];
        if record.pending_removal {
            return false;
        }
        record.pending_removal = true;
        true
    }

    /// True if `id` names a timer that is pending or active and not removed.
    #[must_use]
    pub fn contains(&self, id: TimerId) -> bool {
        self.live_handle(id)
            .is_some_and(|handle| !self.records[handle].pending_removal)
    }

    /// Snapshot of a live timer.
    #[must_use]
    pub fn status(&self, id: TimerId) -> Option<TimerStatus> {
        self.live_handle(id).map(|handle| self.records[handle].status())
    }

    /// Live timers in firing order.
    pub fn active_timers(&self) -> impl Iterator<Item = TimerStatus> + '_ {
        self.active.iter().map(|&handle| self.records[handle].status())
    }

    /// Timers waiting for the next advance.
    pub fn pending_timers(&self) -> impl Iterator<Item = TimerStatus> + '_ {
        self.pending.iter().map(|&handle| self.records[handle].status())
    }

    /// Length of the active list.
    #[inline]
    #[must_use]
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Length of the pending-add list.
    #[inline]
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Records parked in the pool.
    #[inline]
    #[must_use]
    pub fn pooled_len(&self) -> usize {
        self.records.free_count()
    }

    /// Records ever created.
    #[inline]
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Returns every pending and active record to the pool. Used on teardown.
    /// Returns how many records were released.
    pub fn clear(&mut self) -> usize {
        let mut released = 0;
        for &handle in self.active.iter().chain(&self.pending) {
            if self.records.release(handle) {
                released += 1;
            }
        }
        self.active.clear();
        self.pending.clear();
        tracing::debug!(released, "timer scheduler cleared");
        released
    }

    /// Id lookup in O(1): ids are handed out in record creation order.
    fn live_handle(&self, id: TimerId) -> Option<PoolHandle> {
        let index = usize::try_from(id.get()).ok()?.checked_sub(1)?;
        let handle = PoolHandle::from_index(index);
        let record = self.records.get(handle)?;
        (record.id == id && record.membership != Membership::Pooled).then_some(handle)
    }

    fn promote(&mut self, report: &mut AdvanceReport) {
        for &handle in &self.pending {
            let record = &mut self.records[handle];
            if record.pending_removal {
                // Removed before it ever ran
                self.records.release(handle);
                report.discarded += 1;
            } else {
                record.membership = Membership::Active;
                self.active.push(handle);
                report.promoted += 1;
            }
        }
        self.pending.clear();
    }

    fn compact(&mut self, report: &mut AdvanceReport) {
        let count = self.active.len();
        let mut kept = 0;
        for i in 0..count {
            let handle = self.active[i];
            if self.records[handle].pending_removal {
                self.records.release(handle);
                report.recycled += 1;
            } else {
                self.active[kept] = handle;
                kept += 1;
            }
        }
        self.active.truncate(kept);
    }
}

impl<T: Clone> TimerScheduler<T> {
    /// Advances every timer by one frame. Call exactly once per frame.
    ///
    /// Negative or non-finite deltas count as zero. A timer fires at most
    /// once per call no matter how many intervals the delta spans; the
    /// remainder is carried over. Panics raised by callbacks propagate to
    /// the caller; the scheduler stays consistent and the next advance
    /// picks up where this one stopped.
    pub fn advance(&mut self, dt_scaled: f32, dt_unscaled: f32) -> AdvanceReport {
        let mut report = AdvanceReport::default();

        self.promote(&mut report);
        self.fire(sanitize_delta(dt_scaled), sanitize_delta(dt_unscaled), &mut report);
        self.compact(&mut report);

        if report != AdvanceReport::default() {
            tracing::trace!(
                promoted = report.promoted,
                discarded = report.discarded,
                fired = report.fired,
                completed = report.completed,
                recycled = report.recycled,
                active = self.active.len(),
                "timers advanced"
            );
        }
        report
    }

    fn fire(&mut self, dt_scaled: f32, dt_unscaled: f32, report: &mut AdvanceReport) {
        // Callbacks only append to `pending` or set flags, so the length
        // taken here stays valid for the whole walk.
        let count = self.active.len();
        for i in 0..count {
            let handle = self.active[i];
            let record = &mut self.records[handle];
            if record.pending_removal {
                continue;
            }
            if record.is_exhausted() {
                self.complete(handle, report);
                continue;
            }

            record.elapsed += match record.time_source {
                TimeSource::Scaled => dt_scaled,
                TimeSource::Unscaled => dt_unscaled,
            };
            if record.elapsed < record.interval {
                continue;
            }

            // Keep the remainder, fire once
            record.elapsed %= record.interval;
            record.act_times = record.act_times.saturating_add(1);
            report.fired += 1;

            let (id, act_times) = (record.id, record.act_times);
            let update = record
                .on_update
                .as_ref()
                .map(|(callback, arg)| (callback.clone(), arg.clone()));
            if let Some((callback, arg)) = update {
                callback.invoke(&mut TimerContext::new(self, id, act_times), arg);
            }

            let record = &self.records[handle];
            if !record.pending_removal && record.is_exhausted() {
                self.complete(handle, report);
            }
        }
    }

    fn complete(&mut self, handle: PoolHandle, report: &mut AdvanceReport) {
        let record = &mut self.records[handle];
        record.pending_removal = true;
        report.completed += 1;

        let (id, act_times) = (record.id, record.act_times);
        tracing::debug!(timer = %id, fired = act_times, "timer completed");

        let completion = record
            .on_complete
            .as_ref()
            .map(|(callback, arg)| (callback.clone(), arg.clone()));
        if let Some((callback, arg)) = completion {
            callback.invoke(&mut TimerContext::new(self, id, act_times), arg);
        }
    }
}

impl TimerScheduler<()> {
    /// Registers a payload-less timer. See [`add_timer`](Self::add_timer).
    ///
    /// # Errors
    ///
    /// Returns [`StagehandError::InvalidInterval`] for a non-positive or
    /// non-finite interval.
    pub fn add(
        &mut self,
        on_update: TimerCallback<()>,
        on_complete: Option<TimerCallback<()>>,
        options: TimerOptions,
    ) -> StagehandResult<TimerId> {
        self.add_timer(on_update, (), on_complete.map(|callback| (callback, ())), options)
    }
}

impl<T> Default for TimerScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for TimerScheduler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerScheduler")
            .field("active", &self.active.len())
            .field("pending", &self.pending.len())
            .field("pooled", &self.records.free_count())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl<T: Clone> FrameUpdate for TimerScheduler<T> {
    fn name(&self) -> &'static str {
        "timers"
    }

    fn update(&mut self, dt_scaled: f32, dt_unscaled: f32) {
        self.advance(dt_scaled, dt_unscaled);
    }
}

fn calls<T>(record: &TimerRecord<T>, callback: &TimerCallback<T>) -> bool {
    record
        .on_update
        .as_ref()
        .is_some_and(|(candidate, _)| candidate.same_as(callback))
}

#[inline]
fn is_live_match<T>(record: &TimerRecord<T>, callback: &TimerCallback<T>) -> bool {
    !record.pending_removal && calls(record, callback)
}

#[inline]
fn sanitize_delta(dt: f32) -> f32 {
    if dt.is_finite() && dt > 0.0 {
        dt
    } else {
        0.0
    }
}
