/*!
 * Sync Probe - Main Entry Point
 *
 * Exercises the platform primitives on the current machine:
 * - Interlocked counter under contention
 * - Manual-reset broadcast and auto-reset hand-off
 * - Timed waits
 * - Mutex contention
 * - Worker thread hand-off
 */

use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

use platform_sync::{
    destroy_thread, init_tracing, span_scenario, InterlockedInt, SysContext, ThreadHandle,
    ThreadSpec,
};

const COUNTER_THREADS: usize = 8;
const COUNTER_INCREMENTS: usize = 10_000;
const TIMED_WAIT: Duration = Duration::from_millis(100);
const TIMED_WAIT_SLACK: Duration = Duration::from_millis(250);

type Scenario = fn(&SysContext) -> Result<(), Box<dyn Error>>;

fn main() -> ExitCode {
    // Initialize structured tracing
    init_tracing();

    let ctx = SysContext::from_env();
    info!("Sync probe starting...");
    info!(config = ?ctx.config(), strategy = ?ctx.config().select_strategy(), "Platform context ready");

    let scenarios: [(&str, Scenario); 6] = [
        ("interlocked_counter", interlocked_counter),
        ("manual_reset_broadcast", manual_reset_broadcast),
        ("auto_reset_handoff", auto_reset_handoff),
        ("timed_wait", timed_wait),
        ("mutex_contention", mutex_contention),
        ("worker_thread", worker_thread),
    ];

    let mut failures = 0;
    for (name, scenario) in scenarios {
        let mut span = span_scenario(name);
        let result = {
            let _entered = span.enter();
            scenario(&ctx)
        };
        span.record_result(result.is_ok());

        match result {
            Ok(()) => info!(scenario = name, elapsed_ms = span.elapsed().as_millis() as u64, "PASS"),
            Err(e) => {
                failures += 1;
                error!(scenario = name, error = %e, "FAIL");
            }
        }
    }

    if failures == 0 {
        info!("All scenarios passed");
        ExitCode::SUCCESS
    } else {
        error!(failures, "Sync probe failed");
        ExitCode::FAILURE
    }
}

fn check(condition: bool, message: &str) -> Result<(), Box<dyn Error>> {
    if condition {
        Ok(())
    } else {
        Err(message.into())
    }
}

fn interlocked_counter(ctx: &SysContext) -> Result<(), Box<dyn Error>> {
    let counter = Arc::new(InterlockedInt::new(0));

    let handles: Vec<ThreadHandle> = (0..COUNTER_THREADS)
        .map(|i| {
            let counter = counter.clone();
            ctx.create_thread(ThreadSpec::new(format!("counter-{i}")), move || {
                for _ in 0..COUNTER_INCREMENTS {
                    counter.increment();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join()?;
    }

    let expected = (COUNTER_THREADS * COUNTER_INCREMENTS) as i32;
    check(
        counter.get() == expected,
        &format!("counter ended at {}, expected {expected}", counter.get()),
    )
}

fn manual_reset_broadcast(ctx: &SysContext) -> Result<(), Box<dyn Error>> {
    let signal = Arc::new(ctx.create_signal(true));
    signal.raise();

    let released = Arc::new(InterlockedInt::new(0));
    let handles: Vec<ThreadHandle> = ["waiter-b", "waiter-c"]
        .into_iter()
        .map(|name| {
            let signal = signal.clone();
            let released = released.clone();
            ctx.create_thread(ThreadSpec::new(name), move || {
                if signal.wait(None) {
                    released.increment();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join()?;
    }

    check(released.get() == 2, "manual-reset signal did not release both waiters")?;
    check(signal.is_signaled(), "manual-reset signal lost its raised state")
}

fn auto_reset_handoff(ctx: &SysContext) -> Result<(), Box<dyn Error>> {
    let signal = Arc::new(ctx.create_signal(false));
    let released = Arc::new(InterlockedInt::new(0));

    let waiter = {
        let signal = signal.clone();
        let released = released.clone();
        ctx.create_thread(ThreadSpec::new("handoff"), move || {
            if signal.wait(Some(Duration::from_secs(5))) {
                released.increment();
            }
        })
    };

    let start = Instant::now();
    while signal.waiter_count() == 0 && start.elapsed() < Duration::from_secs(5) {
        std::thread::sleep(Duration::from_millis(1));
    }
    signal.raise();
    waiter.join()?;
    check(released.get() == 1, "blocked waiter was not released")?;
    check(!signal.is_signaled(), "raise consumed by a waiter stayed pending")?;

    // No waiter: raises collapse into one pending signal
    signal.raise();
    signal.raise();
    check(signal.wait_millis(0), "pending raise was not consumed")?;
    check(!signal.wait_millis(0), "second wait saw a second raise")
}

fn timed_wait(ctx: &SysContext) -> Result<(), Box<dyn Error>> {
    let signal = ctx.create_signal(false);

    let start = Instant::now();
    let released = signal.wait(Some(TIMED_WAIT));
    let elapsed = start.elapsed();

    check(!released, "never-raised signal reported success")?;
    check(elapsed >= TIMED_WAIT, &format!("timed out early after {elapsed:?}"))?;
    check(
        elapsed < TIMED_WAIT + TIMED_WAIT_SLACK,
        &format!("timed out late after {elapsed:?}"),
    )
}

fn mutex_contention(ctx: &SysContext) -> Result<(), Box<dyn Error>> {
    let mutex = Arc::new(ctx.create_mutex());
    let held = Arc::new(ctx.create_signal(true));
    let release = Arc::new(ctx.create_signal(true));

    let holder = {
        let mutex = mutex.clone();
        let held = held.clone();
        let release = release.clone();
        ctx.create_thread(ThreadSpec::new("holder"), move || {
            mutex.lock(true);
            held.raise();
            release.wait(None);
            mutex.unlock();
        })
    };

    held.wait(None);

    let start = Instant::now();
    let acquired = mutex.lock(false);
    check(!acquired, "non-blocking lock acquired a held mutex")?;
    check(
        start.elapsed() < Duration::from_millis(50),
        "non-blocking lock blocked",
    )?;

    release.raise();
    check(mutex.lock(true), "blocking lock failed")?;
    mutex.unlock();

    holder.join()?;
    Ok(())
}

fn worker_thread(ctx: &SysContext) -> Result<(), Box<dyn Error>> {
    let frames = Arc::new(InterlockedInt::new(0));
    let f = frames.clone();

    let mut worker = ctx.start_worker(ThreadSpec::new("probe-worker"), move || {
        f.increment();
    });

    for _ in 0..3 {
        worker.signal_work()?;
        check(
            worker.wait_for_work_done_timeout(Duration::from_secs(5)),
            "worker did not finish its run",
        )?;
    }
    worker.stop(true);

    check(frames.get() == 3, &format!("worker ran {} times, expected 3", frames.get()))?;

    // Spawn-and-destroy through the free function as well
    let quick = ctx.create_thread(ThreadSpec::new("quick"), || {});
    destroy_thread(Some(quick));
    Ok(())
}
