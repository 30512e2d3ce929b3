//! # Timer Context
//!
//! What a firing callback may do to its scheduler. Additions land in the
//! pending-add list and start on the next advance; removals only set the
//! soft-delete flag, so the active-list walk in progress is never
//! disturbed. Advancing the scheduler from inside a callback is not
//! expressible.

use super::callback::TimerCallback;
use super::record::{TimerId, TimerOptions};
use super::scheduler::TimerScheduler;
use crate::error::StagehandResult;

/// Re-entrant handle to the scheduler, passed to every callback.
pub struct TimerContext<'a, T> {
    scheduler: &'a mut TimerScheduler<T>,
    current: TimerId,
    act_times: u32,
}

impl<'a, T> TimerContext<'a, T> {
    pub(crate) fn new(scheduler: &'a mut TimerScheduler<T>, current: TimerId, act_times: u32) -> Self {
        Self {
            scheduler,
            current,
            act_times,
        }
    }

    /// Id of the timer whose callback is running.
    #[inline]
    #[must_use]
    pub const fn timer_id(&self) -> TimerId {
        self.current
    }

    /// Number of times the running timer has fired, including this firing.
    #[inline]
    #[must_use]
    pub const fn act_times(&self) -> u32 {
        self.act_times
    }

    /// Removes the running timer. Returns `false` if it is already removed.
    pub fn cancel(&mut self) -> bool {
        self.scheduler.remove_timer_by_id(self.current)
    }

    /// Registers a timer; it starts on the next advance.
    ///
    /// # Errors
    ///
    /// See [`TimerScheduler::add_timer`].
    pub fn add_timer(
        &mut self,
        on_update: TimerCallback<T>,
        arg: T,
        on_complete: Option<(TimerCallback<T>, T)>,
        options: TimerOptions,
    ) -> StagehandResult<TimerId> {
        self.scheduler.add_timer(on_update, arg, on_complete, options)
    }

    /// See [`TimerScheduler::remove_timer_by_id`].
    pub fn remove_timer_by_id(&mut self, id: TimerId) -> bool {
        self.scheduler.remove_timer_by_id(id)
    }

    /// See [`TimerScheduler::remove_first_timer_by_callback`].
    pub fn remove_first_timer_by_callback(&mut self, callback: &TimerCallback<T>) -> bool {
        self.scheduler.remove_first_timer_by_callback(callback)
    }

    /// See [`TimerScheduler::remove_all_timers_by_callback`].
    pub fn remove_all_timers_by_callback(&mut self, callback: &TimerCallback<T>) -> usize {
        self.scheduler.remove_all_timers_by_callback(callback)
    }

    /// See [`TimerScheduler::contains`].
    #[must_use]
    pub fn contains(&self, id: TimerId) -> bool {
        self.scheduler.contains(id)
    }
}
