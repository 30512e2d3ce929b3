//! Seeded random operation sequences checking list-membership invariants.
//!
//! Every record is in exactly one of pending / active / pool, the active
//! list never holds a removed record after an advance, and the
//! deactivation map and list stay in sync.

use std::cell::Cell;
use std::collections::HashSet;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use stagehand_core::{
    DeactivationConfig, DeactivationPool, EntityHandle, ManualClock, Position, Scene, SceneNode,
    TimerCallback, TimerContext, TimerId, TimerOptions, Timers,
};

const SEEDS: [u64; 4] = [1, 7, 42, 0xDEAD_BEEF];

fn assert_timer_invariants(timers: &Timers) {
    let active: Vec<_> = timers.active_timers().collect();
    let pending: Vec<_> = timers.pending_timers().collect();

    assert_eq!(
        active.len() + pending.len() + timers.pooled_len(),
        timers.record_count(),
        "every record must be in exactly one place"
    );
    assert!(active.iter().all(|t| !t.pending_removal));

    let ids: HashSet<TimerId> = active.iter().chain(&pending).map(|t| t.id).collect();
    assert_eq!(ids.len(), active.len() + pending.len(), "live ids are unique");
}

#[test]
fn test_random_timer_operations_keep_invariants() {
    for seed in SEEDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut timers = Timers::new();
        let fired = Rc::new(Cell::new(0_u64));
        let callbacks: Vec<TimerCallback<()>> = (0..4)
            .map(|_| {
                let seen = Rc::clone(&fired);
                TimerCallback::from_fn(move || seen.set(seen.get() + 1))
            })
            .collect();
        // Re-entrant callback: cancels itself or spawns a one-shot
        let spawned = callbacks[0].clone();
        let chaotic = TimerCallback::new(move |ctx: &mut TimerContext<'_, ()>, ()| {
            if ctx.act_times() % 2 == 0 {
                ctx.cancel();
            } else {
                ctx.add_timer(spawned.clone(), (), None, TimerOptions::interval(0.1))
                    .unwrap();
            }
        });
        let mut ids = Vec::new();

        for _ in 0..2_000 {
            match rng.gen_range(0..10) {
                0..=3 => {
                    let callback = if rng.gen_bool(0.1) {
                        chaotic.clone()
                    } else {
                        callbacks[rng.gen_range(0..callbacks.len())].clone()
                    };
                    let options = TimerOptions::interval(rng.gen_range(0.05..1.0))
                        .repeat(rng.gen_range(-1..4));
                    ids.push(timers.add(callback, None, options).unwrap());
                }
                4 if !ids.is_empty() => {
                    let id = ids.swap_remove(rng.gen_range(0..ids.len()));
                    timers.remove_timer_by_id(id);
                }
                5 => {
                    let callback = &callbacks[rng.gen_range(0..callbacks.len())];
                    timers.remove_first_timer_by_callback(callback);
                }
                6 if rng.gen_bool(0.2) => {
                    let callback = &callbacks[rng.gen_range(0..callbacks.len())];
                    timers.remove_all_timers_by_callback(callback);
                }
                _ => {
                    let dt = rng.gen_range(0.0..0.5);
                    timers.advance(dt, dt);
                    assert_timer_invariants(&timers);
                }
            }
        }

        timers.clear();
        assert_eq!(timers.pooled_len(), timers.record_count());
        assert!(fired.get() > 0, "seed {seed} never fired a timer");
    }
}

#[test]
fn test_random_deactivation_operations_keep_invariants() {
    for seed in SEEDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let scene = Scene::shared(32);
        let mut nodes: Vec<SceneNode> = (0..32)
            .map(|_| SceneNode::spawn(&scene, Position::new(1.0, 1.0, 1.0)))
            .collect();
        let clock = ManualClock::new();
        let config = DeactivationConfig {
            delay_secs: 1.0,
            max_per_tick: 3,
            ..DeactivationConfig::default()
        };
        let mut pool = DeactivationPool::with_clock(config, clock.clone()).unwrap();

        for _ in 0..3_000 {
            let i = rng.gen_range(0..nodes.len());
            match rng.gen_range(0..8) {
                0..=2 => {
                    let node = &nodes[i];
                    pool.deactivate(node, node);
                }
                3 => {
                    pool.activate(&nodes[i], rng.gen_bool(0.5));
                }
                4 if rng.gen_bool(0.1) => {
                    nodes[i].destroy();
                    nodes[i] = SceneNode::spawn(&scene, Position::ZERO);
                }
                _ => {
                    clock.advance_secs(rng.gen_range(0.0..0.4));
                    let report = pool.tick();
                    assert!(report.deactivated <= 3);
                }
            }

            let queued = nodes.iter().filter(|n| pool.is_pending(n.key())).count();
            assert!(queued <= pool.pending_len());
        }

        // Drain: nothing new, time moves on, everything completes
        clock.advance_secs(2.0);
        for _ in 0..nodes.len() {
            pool.tick();
        }
        assert_eq!(pool.pending_len(), 0);
        assert!(nodes.iter().all(|n| !pool.is_pending(n.key())));
    }
}
