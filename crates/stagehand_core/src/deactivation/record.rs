//! Pooled bookkeeping for one deferred deactivation.

use std::time::Duration;

use super::handle::EntityHandle;
use crate::memory::Recycle;
use crate::scene::Position;

pub(crate) struct DeactivationRecord<E: EntityHandle, X> {
    pub(crate) key: Option<E::Key>,
    pub(crate) entity: Option<E>,
    pub(crate) transform: Option<X>,
    /// Where the entity stood before it was hidden.
    pub(crate) original_position: Position,
    /// Clock reading of the first deactivate request.
    pub(crate) request_time: Duration,
    /// Reactivated before the delay ran out; reclaimed by the next tick.
    pub(crate) cancelled: bool,
}

impl<E: EntityHandle, X> DeactivationRecord<E, X> {
    pub(crate) const fn empty() -> Self {
        Self {
            key: None,
            entity: None,
            transform: None,
            original_position: Position::ZERO,
            request_time: Duration::ZERO,
            cancelled: false,
        }
    }

    #[inline]
    pub(crate) fn is_alive(&self) -> bool {
        self.entity.as_ref().is_some_and(EntityHandle::is_alive)
    }
}

impl<E: EntityHandle, X> Recycle for DeactivationRecord<E, X> {
    fn recycle(&mut self) {
        // Never extend the host's objects' lifetime
        *self = Self::empty();
    }
}
