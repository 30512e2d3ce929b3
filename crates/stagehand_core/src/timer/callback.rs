//! # Timer Callbacks
//!
//! Callbacks are shared, reference-counted callables. Removal by callback
//! compares the address of the shared allocation, never the closure's
//! contents: clones of one callback are the same callback, two callbacks
//! built from identical code are not.

use std::fmt;
use std::rc::Rc;

use super::context::TimerContext;

type CallbackFn<T> = dyn Fn(&mut TimerContext<'_, T>, T);

/// A callback invoked by the timer scheduler.
///
/// The payload `T` is handed over by value on every invocation, so the
/// callback itself can stay free of captured mutable state. The
/// [`TimerContext`] gives re-entrant access to the scheduler.
pub struct TimerCallback<T> {
    inner: Rc<CallbackFn<T>>,
}

impl<T> TimerCallback<T> {
    /// Wraps a closure or function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut TimerContext<'_, T>, T) + 'static,
    {
        Self { inner: Rc::new(f) }
    }

    /// Identity comparison.
    ///
    /// True only for clones of the same callback.
    #[inline]
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        std::ptr::eq(self.identity(), other.identity())
    }

    #[inline]
    fn identity(&self) -> *const () {
        Rc::as_ptr(&self.inner).cast::<()>()
    }

    #[inline]
    pub(crate) fn invoke(&self, ctx: &mut TimerContext<'_, T>, arg: T) {
        (self.inner)(ctx, arg);
    }
}

impl TimerCallback<()> {
    /// Wraps a payload-less closure that does not need the context.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn() + 'static,
    {
        Self::new(move |_, ()| f())
    }
}

impl<T> Clone for TimerCallback<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for TimerCallback<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TimerCallback").field(&self.identity()).finish()
    }
}
