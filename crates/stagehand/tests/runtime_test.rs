//! Integration tests driving the core components through the runtime.

use std::cell::Cell;
use std::rc::Rc;

use stagehand::{Runtime, RuntimeConfig};
use stagehand_core::{
    DeactivationConfig, EntityHandle, ManualClock, Position, Scene, SceneNode, TimerCallback,
    TimerOptions, TransformHandle,
};

type TestRuntime = Runtime<SceneNode, SceneNode, (), ManualClock>;

fn runtime(clock: &ManualClock) -> TestRuntime {
    Runtime::with_clock(RuntimeConfig::default(), clock.clone()).unwrap()
}

#[test]
fn test_step_drives_timers_with_scaled_and_unscaled_time() {
    let clock = ManualClock::new();
    let mut runtime = runtime(&clock);
    runtime.frame_loop_mut().clock_mut().set_time_scale(0.5);

    let game = Rc::new(Cell::new(0));
    let wall = Rc::new(Cell::new(0));
    let (g, w) = (Rc::clone(&game), Rc::clone(&wall));
    runtime
        .timers_mut()
        .add(
            TimerCallback::from_fn(move || g.set(g.get() + 1)),
            None,
            TimerOptions::interval(0.5).forever().scaled(),
        )
        .unwrap();
    runtime
        .timers_mut()
        .add(
            TimerCallback::from_fn(move || w.set(w.get() + 1)),
            None,
            TimerOptions::interval(0.5).forever(),
        )
        .unwrap();

    // 0.25 s frames: wall timer due every 2nd frame, game timer every 4th
    for _ in 0..8 {
        let stats = runtime.step(0.25);
        assert_eq!(stats.systems, 2);
    }
    assert_eq!(wall.get(), 4);
    assert_eq!(game.get(), 2);
    assert_eq!(runtime.frame_loop().frame_count(), 8);
}

#[test]
fn test_step_clamps_long_stalls() {
    let clock = ManualClock::new();
    let mut runtime = runtime(&clock);
    let fired = Rc::new(Cell::new(0));
    let seen = Rc::clone(&fired);
    runtime
        .timers_mut()
        .add(
            TimerCallback::from_fn(move || seen.set(seen.get() + 1)),
            None,
            TimerOptions::interval(1.0),
        )
        .unwrap();

    // A 10 s stall arrives as 0.25 s
    let stats = runtime.step(10.0);
    assert_eq!(stats.delta.unscaled, 0.25);
    assert_eq!(fired.get(), 0);
}

#[test]
fn test_step_ticks_deactivation_pool() {
    let clock = ManualClock::new();
    let mut runtime = runtime(&clock);
    let scene = Scene::shared(4);
    let nodes: Vec<_> = (0..4)
        .map(|_| SceneNode::spawn(&scene, Position::new(1.0, 2.0, 3.0)))
        .collect();

    for node in &nodes {
        runtime.deactivation_mut().deactivate(node, node);
    }
    assert!(nodes
        .iter()
        .all(|n| n.position() == Position::new(99_999.0, 0.0, 0.0)));

    runtime.step(0.016);
    assert!(nodes.iter().all(EntityHandle::is_active));

    clock.advance_secs(5.5);
    runtime.step(0.016);
    assert_eq!(runtime.deactivation().pending_len(), 2);
    runtime.step(0.016);
    assert_eq!(runtime.deactivation().pending_len(), 0);
    assert!(nodes.iter().all(|n| !n.is_active()));
}

#[test]
fn test_timer_can_queue_deactivation_through_shared_state() {
    let clock = ManualClock::new();
    let mut runtime = runtime(&clock);
    let scene = Scene::shared(1);
    let node = SceneNode::spawn(&scene, Position::ZERO);

    // The timer flags work; the host applies it between frames
    let due = Rc::new(Cell::new(false));
    let flag = Rc::clone(&due);
    runtime
        .timers_mut()
        .add(TimerCallback::from_fn(move || flag.set(true)), None, TimerOptions::interval(0.1))
        .unwrap();

    runtime.step(0.1);
    assert!(due.get());
    runtime.deactivation_mut().deactivate(&node, &node);
    assert!(runtime.deactivation().is_pending(node.key()));
}

#[test]
fn test_shutdown_releases_outstanding_work() {
    let clock = ManualClock::new();
    let mut runtime = runtime(&clock);
    let scene = Scene::shared(2);
    let node = SceneNode::spawn(&scene, Position::ZERO);

    runtime
        .timers_mut()
        .add(TimerCallback::from_fn(|| {}), None, TimerOptions::interval(1.0).forever())
        .unwrap();
    runtime
        .timers_mut()
        .add(TimerCallback::from_fn(|| {}), None, TimerOptions::interval(1.0))
        .unwrap();
    runtime.step(0.016);
    runtime.deactivation_mut().deactivate(&node, &node);

    let report = runtime.shutdown();
    assert_eq!(report.timers_released, 2);
    assert_eq!(report.deactivations_released, 1);
    assert_eq!(report.frames, 1);
    assert!(node.is_active());
}

#[test]
fn test_init_rejects_invalid_config() {
    let config = RuntimeConfig {
        core: stagehand_core::StagehandConfig {
            deactivation: DeactivationConfig {
                delay_secs: -1.0,
                ..DeactivationConfig::default()
            },
            ..Default::default()
        },
        ..Default::default()
    };
    assert!(TestRuntime::with_clock(config, ManualClock::new()).is_err());
}

#[test]
fn test_init_with_real_clock() {
    let mut runtime: Runtime<SceneNode, SceneNode> = Runtime::init(RuntimeConfig::default()).unwrap();
    let first = runtime.frame();
    assert_eq!(first.delta.unscaled, 0.0);
    assert_eq!(first.frame, 1);
    runtime.frame();
    assert_eq!(runtime.shutdown().frames, 2);
}
