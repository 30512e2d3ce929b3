//! # Deferred Deactivation Pool
//!
//! Hide now, deactivate later.
//!
//! ```text
//! deactivate(e)   ──> move e to the hidden position      (synchronous, cheap)
//!                 ──> queue record { original position, request time }
//!
//! tick()          ──> for each queued record, in order:
//!                       cancelled          -> release
//!                       entity gone        -> discard
//!                       waited > delay     -> e.set_active(false), release
//!                       cap reached        -> leave for the next tick
//!
//! activate(e)     ──> e.set_active(true) if needed
//!                 ──> restore position, mark the record cancelled
//!                     (the next tick reclaims it)
//! ```
//!
//! The identity map and the active list always hold the same set of
//! records, cancelled ones included.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use super::handle::{EntityHandle, TransformHandle};
use super::record::DeactivationRecord;
use crate::clock::{Clock, MonotonicClock};
use crate::config::DeactivationConfig;
use crate::error::StagehandResult;
use crate::frame::FrameUpdate;
use crate::memory::{PoolHandle, RecordPool};
use crate::scene::Position;

/// Counters from one [`DeactivationPool::tick`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Entities fully deactivated.
    pub deactivated: usize,
    /// Records dropped because their entity was destroyed.
    pub discarded: usize,
    /// Records left unexamined because the per-tick cap was reached.
    pub deferred: usize,
    /// Cancelled records returned to the pool.
    pub reclaimed: usize,
}

/// Defers expensive engine-level deactivation behind a cheap relocation.
///
/// `E` is the entity handle, `X` the transform handle and `C` the clock the
/// delay is measured against.
///
/// # Thread Safety
///
/// Single-threaded; driven by the frame loop.
///
/// # Example
///
/// ```rust,ignore
/// let mut pool = DeactivationPool::new(DeactivationConfig::default())?;
///
/// pool.deactivate(&node, &node);   // node vanishes this frame
/// // ... five seconds of frames later, at most two per frame:
/// pool.tick();                     // node.set_active(false)
/// ```
pub struct DeactivationPool<E, X, C = MonotonicClock>
where
    E: EntityHandle,
{
    records: RecordPool<DeactivationRecord<E, X>>,
    /// Queued records in request order.
    active: Vec<PoolHandle>,
    index: HashMap<E::Key, PoolHandle>,
    /// Records in `active` that were cancelled by `activate`.
    cancelled: usize,
    config: DeactivationConfig,
    delay: Duration,
    hidden: Position,
    clock: C,
}

impl<E, X> DeactivationPool<E, X, MonotonicClock>
where
    E: EntityHandle,
    X: TransformHandle,
{
    /// Creates a pool measuring delays in real time.
    ///
    /// # Errors
    ///
    /// Returns [`StagehandError::InvalidConfig`](crate::StagehandError::InvalidConfig)
    /// if the configuration does not validate.
    pub fn new(config: DeactivationConfig) -> StagehandResult<Self> {
        Self::with_clock(config, MonotonicClock::new())
    }
}

impl<E, X, C> DeactivationPool<E, X, C>
where
    E: EntityHandle,
    X: TransformHandle,
    C: Clock,
{
    /// Creates a pool measuring delays against `clock`.
    ///
    /// # Errors
    ///
    /// Returns [`StagehandError::InvalidConfig`](crate::StagehandError::InvalidConfig)
    /// if the configuration does not validate.
    pub fn with_clock(config: DeactivationConfig, clock: C) -> StagehandResult<Self> {
        config.validate()?;
        let capacity = config.initial_capacity;
        Ok(Self {
            records: RecordPool::with_capacity(capacity),
            active: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            cancelled: 0,
            delay: config.delay(),
            hidden: config.hidden(),
            config,
            clock,
        })
    }

    /// Brings an entity back.
    ///
    /// Re-enables the entity if the engine deactivated it. If a deactivation
    /// is still queued it is cancelled, and with `restore_position` the
    /// entity returns to where it stood before it was hidden. Returns whether
    /// a queued deactivation was cancelled. A destroyed entity is ignored.
    ///
    /// Constant time: the record is only marked, and the next
    /// [`tick`](Self::tick) returns it to the pool.
    pub fn activate(&mut self, entity: &E, restore_position: bool) -> bool {
        if !entity.is_alive() {
            return false;
        }
        if !entity.is_active() {
            entity.set_active(true);
        }

        let Some(&handle) = self.index.get(&entity.key()) else {
            return false;
        };
        let record = &mut self.records[handle];
        if record.cancelled {
            return false;
        }
        if restore_position {
            if let Some(transform) = &record.transform {
                transform.set_position(record.original_position);
            }
        }
        record.cancelled = true;
        record.entity = None;
        record.transform = None;
        self.cancelled += 1;

        tracing::trace!(entity = ?entity.key(), restore_position, "deactivation cancelled");
        true
    }

    /// Hides an entity now and queues its engine-level deactivation.
    ///
    /// A second request for an already queued entity refreshes its handles
    /// and re-captures its position instead of queueing it twice; the
    /// original request time is kept. Returns `true` if a new record was
    /// queued. A destroyed entity is ignored.
    ///
    /// Re-queueing an entity whose deactivation was cancelled since the last tick
    /// reuses the cancelled record, with a fresh request time, at its old
    /// place in the queue.
    pub fn deactivate(&mut self, entity: &E, transform: &X) -> bool {
        if !entity.is_alive() {
            return false;
        }
        let key = entity.key();
        let current = transform.position();

        let queued = match self.index.entry(key) {
            Entry::Occupied(slot) => {
                let record = &mut self.records[*slot.get()];
                record.entity = Some(entity.clone());
                record.transform = Some(transform.clone());
                if record.cancelled {
                    record.cancelled = false;
                    record.original_position = current;
                    record.request_time = self.clock.now();
                    self.cancelled -= 1;
                    true
                } else {
                    // Already parked: keep the real original position
                    if current != self.hidden {
                        record.original_position = current;
                    }
                    false
                }
            }
            Entry::Vacant(slot) => {
                let handle = self.records.acquire(DeactivationRecord::empty);
                let record = &mut self.records[handle];
                record.key = Some(key);
                record.entity = Some(entity.clone());
                record.transform = Some(transform.clone());
                record.original_position = current;
                record.request_time = self.clock.now();
                slot.insert(handle);
                self.active.push(handle);
                true
            }
        };

        transform.set_position(self.hidden);
        tracing::trace!(entity = ?key, queued, "entity hidden");
        queued
    }

    /// Performs due deactivations, at most `max_per_tick` of them.
    ///
    /// Call once per frame. A record is due once strictly more than the
    /// configured delay has passed since its request. Cancelled records are
    /// reclaimed regardless of the cap.
    pub fn tick(&mut self) -> TickReport {
        let now = self.clock.now();
        let cap = self.config.max_per_tick;
        let mut report = TickReport::default();

        let count = self.active.len();
        let mut kept = 0;
        for i in 0..count {
            let handle = self.active[i];
            let record = &self.records[handle];
            let key = record.key;
            if record.cancelled {
                report.reclaimed += 1;
            } else if report.deactivated >= cap {
                // Untouched until the next tick
                self.active[kept] = handle;
                kept += 1;
                report.deferred += 1;
                continue;
            } else if !record.is_alive() {
                tracing::debug!(entity = ?key, "discarding record of destroyed entity");
                report.discarded += 1;
            } else if now.saturating_sub(record.request_time) > self.delay {
                if let Some(entity) = &record.entity {
                    entity.set_active(false);
                }
                report.deactivated += 1;
            } else {
                self.active[kept] = handle;
                kept += 1;
                continue;
            }

            if let Some(key) = key {
                self.index.remove(&key);
            }
            self.records.release(handle);
        }
        self.active.truncate(kept);
        self.cancelled -= report.reclaimed;

        if report.deferred > 0 {
            tracing::debug!(
                deactivated = report.deactivated,
                deferred = report.deferred,
                "deactivation cap reached"
            );
        }
        report
    }

    /// Drops every queued record without touching the entities. Used on
    /// teardown. Returns how many pending deactivations were released.
    pub fn clear(&mut self) -> usize {
        let released = self.pending_len();
        for &handle in &self.active {
            self.records.release(handle);
        }
        self.active.clear();
        self.index.clear();
        self.cancelled = 0;
        tracing::debug!(released, "deactivation pool cleared");
        released
    }

    /// True while a deactivation is queued for `key`.
    #[must_use]
    pub fn is_pending(&self, key: E::Key) -> bool {
        self.index
            .get(&key)
            .is_some_and(|&handle| !self.records[handle].cancelled)
    }

    /// Number of queued deactivations.
    #[inline]
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.active.len() - self.cancelled
    }

    /// Records parked in the pool.
    #[inline]
    #[must_use]
    pub fn pooled_len(&self) -> usize {
        self.records.free_count()
    }

    /// The pool's settings.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &DeactivationConfig {
        &self.config
    }

    /// The clock delays are measured against.
    #[inline]
    #[must_use]
    pub const fn clock(&self) -> &C {
        &self.clock
    }
}

impl<E, X, C> FrameUpdate for DeactivationPool<E, X, C>
where
    E: EntityHandle,
    X: TransformHandle,
    C: Clock,
{
    fn name(&self) -> &'static str {
        "deactivation"
    }

    fn update(&mut self, _dt_scaled: f32, _dt_unscaled: f32) {
        self.tick();
    }
}

impl<E, X, C> fmt::Debug for DeactivationPool<E, X, C>
where
    E: EntityHandle,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeactivationPool")
            .field("pending", &(self.active.len() - self.cancelled))
            .field("pooled", &self.records.free_count())
            .field("delay_secs", &self.config.delay_secs)
            .field("max_per_tick", &self.config.max_per_tick)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::clock::ManualClock;
    use crate::scene::{Scene, SceneNode, SharedScene};
    use crate::StagehandError;

    type TestPool = DeactivationPool<SceneNode, SceneNode, ManualClock>;

    fn assert_in_sync(pool: &TestPool) {
        assert_eq!(pool.index.len(), pool.active.len());
        for (&key, &handle) in &pool.index {
            let hits = pool.active.iter().filter(|&&queued| queued == handle).count();
            assert_eq!(hits, 1, "{key:?} must be queued exactly once");
            assert_eq!(pool.records[handle].key, Some(key));
        }
        let cancelled = pool
            .active
            .iter()
            .filter(|&&handle| pool.records[handle].cancelled)
            .count();
        assert_eq!(cancelled, pool.cancelled);
        assert_eq!(pool.pending_len(), pool.active.len() - cancelled);
    }

    fn setup(config: DeactivationConfig) -> (SharedScene, ManualClock, TestPool) {
        let scene = Scene::shared(16);
        let clock = ManualClock::new();
        let pool = DeactivationPool::with_clock(config, clock.clone()).unwrap();
        (scene, clock, pool)
    }

    #[test]
    fn test_deactivate_hides_immediately() {
        let (scene, _clock, mut pool) = setup(DeactivationConfig::default());
        let node = SceneNode::spawn(&scene, Position::new(1.0, 2.0, 3.0));

        assert!(pool.deactivate(&node, &node));
        assert_eq!(node.position(), Position::new(99_999.0, 0.0, 0.0));
        assert!(node.is_active());
        assert!(pool.is_pending(node.key()));
    }

    #[test]
    fn test_deactivates_only_after_delay() {
        let (scene, clock, mut pool) = setup(DeactivationConfig::default());
        let node = SceneNode::spawn(&scene, Position::ZERO);
        pool.deactivate(&node, &node);

        clock.advance_secs(5.0);
        assert_eq!(pool.tick().deactivated, 0); // strictly greater
        assert!(node.is_active());

        clock.advance_secs(0.1);
        assert_eq!(pool.tick().deactivated, 1);
        assert!(!node.is_active());
        assert!(!pool.is_pending(node.key()));
        assert_eq!(pool.pooled_len(), 1);
    }

    #[test]
    fn test_activate_before_delay_restores_and_never_deactivates() {
        let (scene, clock, mut pool) = setup(DeactivationConfig::default());
        let node = SceneNode::spawn(&scene, Position::new(4.0, 5.0, 6.0));

        pool.deactivate(&node, &node);
        clock.advance_secs(1.0);
        assert!(pool.activate(&node, true));

        assert_eq!(node.position(), Position::new(4.0, 5.0, 6.0));
        clock.advance_secs(10.0);
        pool.tick();
        assert!(node.is_active());
        assert_eq!(scene.borrow().activation_changes(), 0);
        assert_eq!(pool.pending_len(), 0);
    }

    #[test]
    fn test_activate_without_restore_stays_hidden() {
        let (scene, _clock, mut pool) = setup(DeactivationConfig::default());
        let node = SceneNode::spawn(&scene, Position::new(4.0, 5.0, 6.0));

        pool.deactivate(&node, &node);
        assert!(pool.activate(&node, false));
        assert_eq!(node.position(), Position::new(99_999.0, 0.0, 0.0));
    }

    #[test]
    fn test_activate_reenables_deactivated_entity() {
        let (scene, clock, mut pool) = setup(DeactivationConfig::immediate());
        let node = SceneNode::spawn(&scene, Position::ZERO);
        pool.deactivate(&node, &node);
        assert_eq!(pool.tick().deactivated, 0); // zero wait is not "more than" zero

        clock.advance_secs(0.01);
        assert_eq!(pool.tick().deactivated, 1);
        assert!(!node.is_active());

        assert!(!pool.activate(&node, true)); // nothing queued
        assert!(node.is_active());
    }

    #[test]
    fn test_repeated_deactivate_never_double_queues() {
        let (scene, clock, mut pool) = setup(DeactivationConfig::default());
        let node = SceneNode::spawn(&scene, Position::new(7.0, 0.0, 0.0));

        assert!(pool.deactivate(&node, &node));
        clock.advance_secs(3.0);
        assert!(!pool.deactivate(&node, &node));
        assert_eq!(pool.pending_len(), 1);

        // Second call saw the hidden position and kept the real one
        pool.activate(&node, true);
        assert_eq!(node.position(), Position::new(7.0, 0.0, 0.0));
    }

    #[test]
    fn test_refresh_keeps_request_time() {
        let (scene, clock, mut pool) = setup(DeactivationConfig::default());
        let node = SceneNode::spawn(&scene, Position::ZERO);

        pool.deactivate(&node, &node);
        clock.advance_secs(4.0);
        pool.deactivate(&node, &node);
        clock.advance_secs(1.5);

        assert_eq!(pool.tick().deactivated, 1);
    }

    #[test]
    fn test_destroyed_entity_discarded() {
        let (scene, clock, mut pool) = setup(DeactivationConfig::default());
        let node = SceneNode::spawn(&scene, Position::ZERO);
        pool.deactivate(&node, &node);
        node.destroy();

        let report = pool.tick();
        assert_eq!(report.discarded, 1);
        assert_eq!(pool.pending_len(), 0);
        assert!(!pool.is_pending(node.key()));

        clock.advance_secs(10.0);
        assert_eq!(pool.tick(), TickReport::default());
    }

    #[test]
    fn test_cap_limits_work_per_tick() {
        let (scene, clock, mut pool) = setup(DeactivationConfig::default());
        let nodes: Vec<_> = (0..5)
            .map(|_| SceneNode::spawn(&scene, Position::ZERO))
            .collect();
        for node in &nodes {
            pool.deactivate(node, node);
        }
        clock.advance_secs(6.0);

        let first = pool.tick();
        assert_eq!(first.deactivated, 2);
        assert_eq!(first.deferred, 3);
        assert_eq!(pool.tick().deactivated, 2);
        assert_eq!(pool.tick().deactivated, 1);
        assert_eq!(pool.pending_len(), 0);

        // Request order is preserved
        assert!(nodes.iter().all(|node| !node.is_active()));
        assert_eq!(scene.borrow().activation_changes(), 5);
    }

    #[test]
    fn test_not_due_records_do_not_count_against_cap() {
        let (scene, clock, mut pool) = setup(DeactivationConfig::default());
        let early = SceneNode::spawn(&scene, Position::ZERO);
        pool.deactivate(&early, &early);
        clock.advance_secs(3.0);
        let late: Vec<_> = (0..2)
            .map(|_| SceneNode::spawn(&scene, Position::ZERO))
            .collect();
        for node in &late {
            pool.deactivate(node, node);
        }

        clock.advance_secs(2.5);
        let report = pool.tick();
        assert_eq!(report.deactivated, 1);
        assert_eq!(report.deferred, 0);
        assert_eq!(pool.pending_len(), 2);
    }

    #[test]
    fn test_clear_releases_everything() {
        let (scene, _clock, mut pool) = setup(DeactivationConfig::default());
        for _ in 0..3 {
            let node = SceneNode::spawn(&scene, Position::ZERO);
            pool.deactivate(&node, &node);
        }

        assert_eq!(pool.clear(), 3);
        assert_eq!(pool.pending_len(), 0);
        assert_eq!(pool.pooled_len(), 3);
        assert_eq!(pool.tick(), TickReport::default());
    }

    #[test]
    fn test_records_are_reused() {
        let (scene, _clock, mut pool) = setup(DeactivationConfig::default());
        let node = SceneNode::spawn(&scene, Position::ZERO);

        for _ in 0..10 {
            pool.deactivate(&node, &node);
            pool.activate(&node, true);
        }
        assert_eq!(pool.pooled_len(), 0);
        assert_eq!(pool.tick().reclaimed, 1);
        assert_eq!(pool.pooled_len(), 1);
    }

    #[test]
    fn test_cancelled_records_reclaimed_on_next_tick() {
        let (scene, _clock, mut pool) = setup(DeactivationConfig::default());
        let nodes: Vec<_> = (0..5)
            .map(|_| SceneNode::spawn(&scene, Position::ZERO))
            .collect();
        for node in &nodes {
            pool.deactivate(node, node);
        }
        for node in nodes.iter().rev() {
            assert!(pool.activate(node, true));
            assert!(!pool.activate(node, true)); // already cancelled
        }

        assert_eq!(pool.pending_len(), 0);
        assert!(nodes.iter().all(|node| !pool.is_pending(node.key())));
        assert_in_sync(&pool);

        // Reclaiming ignores the per-tick cap
        let report = pool.tick();
        assert_eq!(report.reclaimed, 5);
        assert_eq!(report.deferred, 0);
        assert_eq!(pool.pooled_len(), 5);
        assert!(pool.active.is_empty());
        assert_in_sync(&pool);
    }

    #[test]
    fn test_requeue_after_cancel_restarts_delay() {
        let (scene, clock, mut pool) = setup(DeactivationConfig::default());
        let node = SceneNode::spawn(&scene, Position::new(1.0, 0.0, 0.0));

        pool.deactivate(&node, &node);
        clock.advance_secs(4.0);
        pool.activate(&node, true);
        node.set_position(Position::new(2.0, 0.0, 0.0));
        assert!(pool.deactivate(&node, &node));
        assert!(pool.is_pending(node.key()));
        assert_eq!(pool.pending_len(), 1);
        assert_in_sync(&pool);

        clock.advance_secs(1.5);
        assert_eq!(pool.tick(), TickReport::default());
        assert!(node.is_active());

        pool.activate(&node, true);
        assert_eq!(node.position(), Position::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_cancelled_record_never_touches_destroyed_entity() {
        let (scene, _clock, mut pool) = setup(DeactivationConfig::default());
        let node = SceneNode::spawn(&scene, Position::ZERO);
        pool.deactivate(&node, &node);
        pool.activate(&node, false);
        node.destroy();

        let report = pool.tick();
        assert_eq!(report.reclaimed, 1);
        assert_eq!(report.discarded, 0);
    }

    #[test]
    fn test_index_and_queue_stay_in_sync() {
        for seed in [3_u64, 11, 97, 0x5EED] {
            let mut rng = StdRng::seed_from_u64(seed);
            let config = DeactivationConfig {
                delay_secs: 0.5,
                max_per_tick: 2,
                ..DeactivationConfig::default()
            };
            let (scene, clock, mut pool) = setup(config);
            let mut nodes: Vec<SceneNode> = (0..12)
                .map(|_| SceneNode::spawn(&scene, Position::new(1.0, 1.0, 1.0)))
                .collect();

            for _ in 0..2_000 {
                let i = rng.gen_range(0..nodes.len());
                match rng.gen_range(0..10) {
                    0..=3 => {
                        let node = &nodes[i];
                        pool.deactivate(node, node);
                    }
                    4..=5 => {
                        pool.activate(&nodes[i], rng.gen_bool(0.5));
                    }
                    6 => {
                        nodes[i].destroy();
                        nodes[i] = SceneNode::spawn(&scene, Position::ZERO);
                    }
                    7..=8 => {
                        clock.advance_secs(rng.gen_range(0.0..0.3));
                        let report = pool.tick();
                        assert!(report.deactivated <= 2);
                        assert_eq!(pool.cancelled, 0);
                    }
                    _ if rng.gen_bool(0.05) => {
                        pool.clear();
                    }
                    _ => {}
                }
                assert_in_sync(&pool);
            }
        }
    }

    #[test]
    fn test_unrepresentable_delay_rejected() {
        let config = DeactivationConfig {
            delay_secs: 1e20,
            ..DeactivationConfig::default()
        };
        let err = TestPool::with_clock(config, ManualClock::new()).unwrap_err();
        assert!(matches!(
            err,
            StagehandError::InvalidConfig {
                field: "deactivation.delay_secs",
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = DeactivationConfig {
            max_per_tick: 0,
            ..DeactivationConfig::default()
        };
        assert!(TestPool::with_clock(config, ManualClock::new()).is_err());
    }
}
