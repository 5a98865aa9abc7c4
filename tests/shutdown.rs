mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use cumin::{Config, EventKind, Handler, HandlerFuture, ShutdownOutcome, SignalSource};
use serde_json::{Value, json};
use tokio::time::{Instant, sleep};

use common::{runtime, wait_for};

/// Handler that sleeps for `ms` then flips `done`.
struct Sleeper {
    ms: u64,
    done: Arc<AtomicBool>,
}

impl Handler for Sleeper {
    fn call(&self, _payload: Value) -> HandlerFuture {
        let (ms, done) = (self.ms, Arc::clone(&self.done));
        Box::pin(async move {
            sleep(Duration::from_millis(ms)).await;
            done.store(true, Ordering::SeqCst);
            Ok(())
        })
    }
}

fn sleeper(ms: u64, done: Arc<AtomicBool>) -> Sleeper {
    Sleeper { ms, done }
}

#[tokio::test(start_paused = true)]
async fn idle_listener_exits_within_one_pop_timeout() {
    let (_store, cumin) = runtime(Config::default());
    let (trigger, signals) = SignalSource::manual();
    let mut events = cumin.events();

    let listener = cumin
        .listen("idle", sleeper(0, Arc::default()))
        .unwrap()
        .with_signals(signals);
    let run = tokio::spawn(listener.run());
    wait_for(&mut events, EventKind::ListenStarted).await;

    let signalled = Instant::now();
    trigger.terminate();
    assert_eq!(run.await.unwrap().unwrap(), ShutdownOutcome::Drained);
    assert!(signalled.elapsed() <= Config::default().pop_timeout);
    assert!(cumin.shutdown_requested());
}

#[tokio::test(start_paused = true)]
async fn drain_waits_for_running_handler() {
    let (store, cumin) = runtime(Config::default());
    cumin.enqueue("slow", &json!(1)).await.unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let (trigger, signals) = SignalSource::manual();
    let mut events = cumin.events();
    let listener = cumin
        .listen("slow", sleeper(3_000, Arc::clone(&done)))
        .unwrap()
        .with_signals(signals);
    let run = tokio::spawn(listener.run());

    wait_for(&mut events, EventKind::JobDequeued).await;
    let signalled = Instant::now();
    trigger.terminate();

    let requested = wait_for(&mut events, EventKind::ShutdownRequested).await;
    assert_eq!(requested.pending, Some(1));
    assert_eq!(requested.delay_ms, Some(20_000));

    assert_eq!(run.await.unwrap().unwrap(), ShutdownOutcome::Drained);
    assert!(done.load(Ordering::SeqCst));
    assert!(signalled.elapsed() >= Duration::from_millis(3_000));
    assert!(signalled.elapsed() < Duration::from_secs(20));
    assert_eq!(store.published("cuminprocessed").len(), 1);
    assert_eq!(cumin.pending(), 0);
}

#[tokio::test(start_paused = true)]
async fn pop_in_flight_at_signal_is_still_dispatched() {
    let (store, cumin) = runtime(Config::default());
    let done = Arc::new(AtomicBool::new(false));
    let (trigger, signals) = SignalSource::manual();
    let mut events = cumin.events();

    let listener = cumin
        .listen("late", sleeper(100, Arc::clone(&done)))
        .unwrap()
        .with_signals(signals);
    let run = tokio::spawn(listener.run());
    wait_for(&mut events, EventKind::ListenStarted).await;
    // Let the poller park inside its blocking pop.
    sleep(Duration::from_millis(10)).await;

    trigger.terminate();
    cumin.enqueue("late", &json!("just in time")).await.unwrap();

    assert_eq!(run.await.unwrap().unwrap(), ShutdownOutcome::Drained);
    assert!(done.load(Ordering::SeqCst));
    assert_eq!(store.published("cumindequeued").len(), 1);
    assert!(store.list("cumin.late").is_empty());
}

#[tokio::test(start_paused = true)]
async fn items_left_after_parking_stay_queued() {
    let (store, cumin) = runtime(Config::default());
    let (trigger, signals) = SignalSource::manual();
    let mut events = cumin.events();

    let listener = cumin
        .listen("rest", sleeper(0, Arc::default()))
        .unwrap()
        .with_signals(signals);
    let run = tokio::spawn(listener.run());
    wait_for(&mut events, EventKind::ListenStarted).await;

    trigger.terminate();
    assert_eq!(run.await.unwrap().unwrap(), ShutdownOutcome::Drained);

    cumin.enqueue("rest", &json!("later")).await.unwrap();
    sleep(Duration::from_secs(5)).await;
    assert_eq!(store.list("cumin.rest").len(), 1);
}

#[tokio::test(start_paused = true)]
async fn kill_timer_abandons_stuck_handlers() {
    let (store, cumin) = runtime(Config {
        kill_wait: Duration::from_secs(2),
        ..Config::default()
    });
    cumin.enqueue("stuck", &json!(1)).await.unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let (trigger, signals) = SignalSource::manual();
    let mut events = cumin.events();
    let listener = cumin
        .listen("stuck", sleeper(60_000, Arc::clone(&done)))
        .unwrap()
        .with_signals(signals);
    let run = tokio::spawn(listener.run());

    wait_for(&mut events, EventKind::JobDequeued).await;
    let signalled = Instant::now();
    trigger.terminate();

    assert_eq!(
        run.await.unwrap().unwrap(),
        ShutdownOutcome::KillTimerExpired
    );
    let elapsed = signalled.elapsed();
    assert!(elapsed >= Duration::from_secs(2) && elapsed < Duration::from_secs(3));

    let expired = wait_for(&mut events, EventKind::KillTimerExpired).await;
    assert_eq!(expired.pending, Some(1));

    // The abandoned handler never completes and never reports.
    sleep(Duration::from_secs(120)).await;
    assert!(!done.load(Ordering::SeqCst));
    assert!(store.published("cuminprocessed").is_empty());
    assert_eq!(cumin.pending(), 0);
}

#[tokio::test(start_paused = true)]
async fn second_signal_forces_termination() {
    let (_store, cumin) = runtime(Config::default());
    cumin.enqueue("forced", &json!(1)).await.unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let (trigger, signals) = SignalSource::manual();
    let mut events = cumin.events();
    let listener = cumin
        .listen("forced", sleeper(60_000, Arc::clone(&done)))
        .unwrap()
        .with_signals(signals);
    let run = tokio::spawn(listener.run());

    wait_for(&mut events, EventKind::JobDequeued).await;
    let signalled = Instant::now();
    trigger.terminate();
    trigger.terminate();
    trigger.terminate();

    assert_eq!(run.await.unwrap().unwrap(), ShutdownOutcome::Forced);
    let elapsed = signalled.elapsed();
    assert!(elapsed >= Duration::from_millis(500));
    assert!(elapsed < Duration::from_secs(20));

    let forced = wait_for(&mut events, EventKind::ForceRequested).await;
    assert_eq!(forced.delay_ms, Some(500));
    wait_for(&mut events, EventKind::ShutdownForced).await;
    assert!(!done.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn drain_can_finish_during_force_grace() {
    let (_store, cumin) = runtime(Config {
        force_grace: Duration::from_secs(10),
        ..Config::default()
    });
    cumin.enqueue("grace", &json!(1)).await.unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let (trigger, signals) = SignalSource::manual();
    let mut events = cumin.events();
    let listener = cumin
        .listen("grace", sleeper(2_000, Arc::clone(&done)))
        .unwrap()
        .with_signals(signals);
    let run = tokio::spawn(listener.run());

    wait_for(&mut events, EventKind::JobDequeued).await;
    trigger.terminate();
    trigger.terminate();

    assert_eq!(run.await.unwrap().unwrap(), ShutdownOutcome::Drained);
    assert!(done.load(Ordering::SeqCst));
}
