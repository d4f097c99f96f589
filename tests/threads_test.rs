/*!
 * Thread and Worker Integration Tests
 * Lifecycle, suspended start, collaborators and worker hand-off
 */

use platform_sync::{
    destroy_thread, get_current_thread_id, wait_for_thread, CoreAffinity, ErrorReporter,
    InterlockedInt, SysContext, ThreadError, ThreadPriority, ThreadSpec, WorkerError,
};
use pretty_assertions::assert_eq;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct RecordingReporter {
    warnings: Mutex<Vec<String>>,
}

impl ErrorReporter for RecordingReporter {
    fn fatal_error(&self, message: &str) -> ! {
        panic!("fatal: {}", message);
    }

    fn warning(&self, message: &str) {
        self.warnings.lock().push(message.to_string());
    }
}

#[test]
fn test_counter_across_eight_threads() {
    let ctx = SysContext::new();
    let counter = Arc::new(InterlockedInt::new(0));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let counter = counter.clone();
            ctx.create_thread(ThreadSpec::new(format!("count-{i}")), move || {
                for _ in 0..10_000 {
                    counter.increment();
                }
            })
        })
        .collect();

    for handle in handles {
        destroy_thread(Some(handle));
    }
    assert_eq!(counter.get(), 80_000);
}

#[test]
fn test_thread_ids_are_distinct() {
    let ctx = SysContext::new();
    let ids = Arc::new(Mutex::new(Vec::new()));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let ids = ids.clone();
            ctx.create_thread(ThreadSpec::new(format!("id-{i}")), move || {
                ids.lock().push(get_current_thread_id());
            })
        })
        .collect();

    let mut reported = Vec::new();
    for handle in handles {
        wait_for_thread(&handle);
        reported.push(handle.thread_id().unwrap());
        handle.join().unwrap();
    }

    let seen: HashSet<_> = ids.lock().iter().copied().collect();
    assert_eq!(seen.len(), 4);
    assert!(!seen.contains(&get_current_thread_id()));
    for id in reported {
        assert!(seen.contains(&id));
    }
}

#[test]
fn test_suspended_thread_runs_after_resume() {
    let ctx = SysContext::new();
    let ran = Arc::new(InterlockedInt::new(0));
    let r = ran.clone();

    let handle = ctx.create_thread(
        ThreadSpec::new("gated").suspended().with_priority(ThreadPriority::Highest),
        move || {
            r.increment();
        },
    );

    std::thread::sleep(Duration::from_millis(30));
    assert!(handle.is_suspended());
    assert!(!handle.is_finished());
    assert_eq!(ran.get(), 0);

    handle.resume();
    handle.join().unwrap();
    assert_eq!(ran.get(), 1);
}

#[test]
fn test_unapplied_affinity_is_a_warning() {
    let reporter = Arc::new(RecordingReporter::default());
    let ctx = SysContext::builder().with_reporter(reporter.clone()).build();

    // No machine has this many cores
    let spec = ThreadSpec::new("pinned").with_affinity(CoreAffinity::Core(u16::MAX));
    let ran = Arc::new(InterlockedInt::new(0));
    let r = ran.clone();

    let handle = ctx.create_thread(spec, move || {
        r.increment();
    });
    destroy_thread(Some(handle));

    assert_eq!(ran.get(), 1);
    assert_eq!(reporter.warnings.lock().len(), 1);
}

#[test]
fn test_panicking_thread_is_warning_on_destroy() {
    let reporter = Arc::new(RecordingReporter::default());
    let ctx = SysContext::builder().with_reporter(reporter.clone()).build();

    let handle = ctx.create_thread(ThreadSpec::new("crash"), || panic!("boom"));
    destroy_thread(Some(handle));

    let warnings = reporter.warnings.lock();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("crash"));
}

#[test]
fn test_join_reports_panic() {
    let ctx = SysContext::new();
    let handle = ctx.create_thread(ThreadSpec::new("unwinds"), || panic!("boom"));
    assert_eq!(handle.join(), Err(ThreadError::Panicked("unwinds".to_string())));
}

#[test]
fn test_worker_runs_once_per_signal() {
    let ctx = SysContext::new();
    let runs = Arc::new(InterlockedInt::new(0));
    let r = runs.clone();

    let mut worker = ctx.start_worker(ThreadSpec::new("render"), move || {
        r.increment();
    });
    assert!(worker.is_work_done());

    for expected in 1..=10 {
        worker.signal_work().unwrap();
        assert!(worker.wait_for_work_done_timeout(Duration::from_secs(5)));
        assert_eq!(runs.get(), expected);
        assert_eq!(worker.runs(), expected);
    }

    worker.stop(true);
    assert!(!worker.is_running());
    assert_eq!(
        worker.signal_work(),
        Err(WorkerError::Terminating("render".to_string()))
    );
}

#[test]
fn test_worker_panic_releases_waiters() {
    let ctx = SysContext::new();
    let mut worker = ctx.start_worker(ThreadSpec::new("fragile"), || panic!("job failed"));

    worker.signal_work().unwrap();
    assert!(worker.wait_for_work_done_timeout(Duration::from_secs(5)));
    assert!(!worker.is_running());
    assert_eq!(
        worker.signal_work(),
        Err(WorkerError::NotRunning("fragile".to_string()))
    );
    worker.stop(true);
}

#[test]
fn test_signals_racing_a_panicking_job_never_hang() {
    let ctx = SysContext::new();

    for _ in 0..100 {
        let mut worker = ctx.start_worker(ThreadSpec::new("racy"), || panic!("job failed"));

        // Keep requesting work while the job unwinds; the last accepted
        // request must still see work_done raised
        while worker.signal_work().is_ok() {}

        assert!(worker.wait_for_work_done_timeout(Duration::from_secs(5)));
        assert!(!worker.is_running());
        assert_eq!(
            worker.signal_work(),
            Err(WorkerError::NotRunning("racy".to_string()))
        );
        worker.stop(true);
    }
}

#[test]
fn test_dropping_worker_stops_thread() {
    let ctx = SysContext::new();
    let worker = ctx.start_worker(ThreadSpec::new("short-lived"), || {});
    worker.signal_work().unwrap();
    drop(worker);
}
