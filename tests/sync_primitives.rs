/*!
 * Synchronization Primitives Integration Tests
 *
 * Signal and mutex behavior across the futex and condvar backends
 */

use platform_sync::{
    InterlockedInt, MonotonicClock, ResetMode, Signal, StrategyType, SyncConfig, SysMutex,
};
use serial_test::serial;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const STRATEGIES: [StrategyType; 2] = [StrategyType::Futex, StrategyType::Condvar];

fn signal(mode: ResetMode, strategy: StrategyType) -> Arc<Signal> {
    let config = SyncConfig {
        strategy,
        ..Default::default()
    };
    Arc::new(Signal::with_config(mode, &config, Arc::new(MonotonicClock)))
}

fn wait_for_waiters(signal: &Signal, count: usize) {
    let start = Instant::now();
    while signal.waiter_count() < count {
        assert!(start.elapsed() < Duration::from_secs(5), "waiters never blocked");
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn test_manual_reset_releases_later_waiters() {
    for strategy in STRATEGIES {
        let sig = signal(ResetMode::Manual, strategy);
        sig.raise();

        // Threads B and C arrive after the raise
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let sig = sig.clone();
                thread::spawn(move || {
                    let start = Instant::now();
                    (sig.wait_millis(Signal::WAIT_INFINITE), start.elapsed())
                })
            })
            .collect();

        for handle in handles {
            let (released, elapsed) = handle.join().unwrap();
            assert!(released, "{:?}: late waiter not released", strategy);
            assert!(elapsed < Duration::from_millis(500));
        }
        assert!(sig.wait(Some(Duration::ZERO)));
    }
}

#[test]
fn test_manual_reset_broadcast_to_blocked_waiters() {
    for strategy in STRATEGIES {
        let sig = signal(ResetMode::Manual, strategy);

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let sig = sig.clone();
                thread::spawn(move || sig.wait(Some(Duration::from_secs(5))))
            })
            .collect();

        wait_for_waiters(&sig, 5);
        sig.raise();

        for handle in handles {
            assert!(handle.join().unwrap(), "{:?}: blocked waiter not woken", strategy);
        }
    }
}

#[test]
fn test_clear_rearms_manual_reset() {
    for strategy in STRATEGIES {
        let sig = signal(ResetMode::Manual, strategy);
        sig.raise();
        sig.clear();
        assert!(!sig.wait(Some(Duration::from_millis(10))), "{:?}", strategy);
    }
}

#[test]
fn test_auto_reset_releases_exactly_one_waiter() {
    for strategy in STRATEGIES {
        let sig = signal(ResetMode::Auto, strategy);
        let released = Arc::new(InterlockedInt::new(0));

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let sig = sig.clone();
                let released = released.clone();
                thread::spawn(move || {
                    if sig.wait(Some(Duration::from_millis(500))) {
                        released.increment();
                    }
                })
            })
            .collect();

        wait_for_waiters(&sig, 3);
        sig.raise();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(released.get(), 1, "{:?}: one raise, one release", strategy);
        assert!(!sig.is_signaled());
    }
}

#[test]
fn test_auto_reset_pending_raise_consumed_once() {
    for strategy in STRATEGIES {
        let sig = signal(ResetMode::Auto, strategy);

        // Flag, not a counter
        sig.raise();
        sig.raise();

        assert!(sig.wait(Some(Duration::ZERO)), "{:?}", strategy);
        assert!(!sig.wait(Some(Duration::from_millis(10))), "{:?}", strategy);
    }
}

#[test]
fn test_auto_reset_wakes_blocked_waiter_then_pends() {
    for strategy in STRATEGIES {
        let sig = signal(ResetMode::Auto, strategy);
        let sig_clone = sig.clone();

        let handle = thread::spawn(move || sig_clone.wait(Some(Duration::from_secs(5))));
        wait_for_waiters(&sig, 1);

        sig.raise();
        assert!(handle.join().unwrap());

        // Second raise with nobody waiting stays pending for the next wait
        sig.raise();
        assert!(sig.is_signaled());
        assert!(sig.wait_millis(0));
        assert!(!sig.is_signaled());
    }
}

#[test]
#[serial]
fn test_timed_wait_on_never_raised_signal() {
    for strategy in STRATEGIES {
        let sig = signal(ResetMode::Auto, strategy);

        let start = Instant::now();
        let released = sig.wait_millis(100);
        let elapsed = start.elapsed();

        assert!(!released);
        assert!(elapsed >= Duration::from_millis(100), "{:?}: early after {:?}", strategy, elapsed);
        assert!(elapsed < Duration::from_millis(400), "{:?}: late after {:?}", strategy, elapsed);
    }
}

#[test]
fn test_many_handoffs_lose_no_wakeups() {
    for strategy in STRATEGIES {
        let ping = signal(ResetMode::Auto, strategy);
        let pong = signal(ResetMode::Auto, strategy);
        let (ping_c, pong_c) = (ping.clone(), pong.clone());

        let handle = thread::spawn(move || {
            for _ in 0..1_000 {
                assert!(ping_c.wait(Some(Duration::from_secs(5))));
                pong_c.raise();
            }
        });

        for _ in 0..1_000 {
            ping.raise();
            assert!(pong.wait(Some(Duration::from_secs(5))), "{:?}: lost wakeup", strategy);
        }
        handle.join().unwrap();
    }
}

#[test]
fn test_try_lock_on_held_mutex_fails_fast() {
    let mutex = Arc::new(SysMutex::new());
    let held = signal(ResetMode::Manual, StrategyType::Auto);
    let release = signal(ResetMode::Manual, StrategyType::Auto);

    let holder = {
        let (mutex, held, release) = (mutex.clone(), held.clone(), release.clone());
        thread::spawn(move || {
            assert!(mutex.lock(true));
            held.raise();
            release.wait(None);
            mutex.unlock();
        })
    };

    held.wait(None);

    let start = Instant::now();
    assert!(!mutex.lock(false));
    assert!(start.elapsed() < Duration::from_millis(100));

    let acquired = Arc::new(AtomicBool::new(false));
    let blocker = {
        let (mutex, acquired) = (mutex.clone(), acquired.clone());
        thread::spawn(move || {
            assert!(mutex.lock(true));
            acquired.store(true, Ordering::SeqCst);
            mutex.unlock();
        })
    };

    thread::sleep(Duration::from_millis(50));
    assert!(!acquired.load(Ordering::SeqCst), "blocking lock returned while held");

    release.raise();
    holder.join().unwrap();
    blocker.join().unwrap();
    assert!(acquired.load(Ordering::SeqCst));
}

#[test]
fn test_mutex_serializes_critical_section() {
    let mutex = Arc::new(SysMutex::new());
    let inside = Arc::new(InterlockedInt::new(0));
    let total = Arc::new(InterlockedInt::new(0));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let (mutex, inside, total) = (mutex.clone(), inside.clone(), total.clone());
            thread::spawn(move || {
                for _ in 0..500 {
                    let _guard = mutex.guard().unwrap();
                    assert_eq!(inside.increment(), 1);
                    total.increment();
                    inside.decrement();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(total.get(), 2_000);
    assert!(!mutex.is_locked());
}
