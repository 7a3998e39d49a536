/*!
 * Invoker Tests
 * Completion, timeout, target failure, and cleanup on every exit path
 */

use super::common::{recording_sink, wait_until};
use bounded_call::{CallError, ConfigurationError, TimeoutInvoker};
use pretty_assertions::assert_eq;
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::{Duration, Instant};

fn target() -> &'static str {
    thread::sleep(Duration::from_secs(2));
    "late"
}

fn quick(delay_ms: u64) -> &'static str {
    thread::sleep(Duration::from_millis(delay_ms));
    "ok"
}

fn failing(delay_ms: u64) -> Result<u32, String> {
    thread::sleep(Duration::from_millis(delay_ms));
    Err("boom".to_string())
}

#[test]
fn test_returns_value_before_deadline() {
    let (entries, sink) = recording_sink();
    let invoker = TimeoutInvoker::new(1).unwrap().with_log_sink(sink);

    let result = invoker.wrap(quick).call((100,));

    assert_eq!(result.unwrap(), "ok");
    assert_eq!(invoker.armed_countdowns(), 0);
    assert!(entries.lock().is_empty());
}

#[test]
fn test_no_stray_timeout_after_completion() {
    let (entries, sink) = recording_sink();
    let invoker = TimeoutInvoker::new(1).unwrap().with_log_sink(sink);

    assert_eq!(invoker.wrap(quick).call((10,)).unwrap(), "ok");

    // Outlive the bound; nothing may fire into unrelated work
    thread::sleep(Duration::from_millis(1500));
    assert!(entries.lock().is_empty());
    assert_eq!(invoker.armed_countdowns(), 0);
    assert!(invoker.in_flight().is_empty());
}

#[test]
fn test_timeout_reports_target_name_and_bound() {
    let (entries, sink) = recording_sink();
    let invoker = TimeoutInvoker::new(1).unwrap().with_log_sink(sink);

    let start = Instant::now();
    let result = invoker.wrap(target).call(());
    let elapsed = start.elapsed();

    match result {
        Err(CallError::Timeout(err)) => {
            // Logged before the caller saw the error
            assert_eq!(entries.lock().len(), 1);
            assert_eq!(err.function_name(), Some("target"));
            assert_eq!(err.timeout_seconds(), 1);
            assert_eq!(
                err.message(),
                "Function 'target' experienced a timeout error; exceeded '1' seconds."
            );
        }
        other => panic!("expected timeout, got {:?}", other),
    }

    assert!(elapsed >= Duration::from_secs(1));
    assert!(elapsed < Duration::from_millis(1900), "caller waited for the worker");
    assert_eq!(invoker.armed_countdowns(), 0);
    assert_eq!(entries.lock().len(), 1);
}

#[test]
fn test_target_error_propagates_and_disarms() {
    let (entries, sink) = recording_sink();
    let invoker = TimeoutInvoker::new(5).unwrap().with_log_sink(sink);

    let result = invoker.wrap(failing).try_call((100,));

    assert!(result.as_ref().is_err_and(|e| e.is_operation_error()));
    assert_eq!(
        result.unwrap_err().into_operation_error(),
        Some("boom".to_string())
    );
    assert_eq!(invoker.armed_countdowns(), 0);

    thread::sleep(Duration::from_millis(5500));
    assert!(entries.lock().is_empty());
}

#[test]
fn test_target_panic_is_resumed_on_caller() {
    let (entries, sink) = recording_sink();
    let invoker = TimeoutInvoker::new(5).unwrap().with_log_sink(sink);
    let bounded = invoker.wrap_named("exploding", |()| -> u32 { panic!("boom") });

    let caught = panic::catch_unwind(AssertUnwindSafe(|| bounded.call(((),))));

    let payload = caught.unwrap_err();
    assert_eq!(payload.downcast_ref::<&str>(), Some(&"boom"));
    assert_eq!(invoker.armed_countdowns(), 0);
    assert!(wait_until(Duration::from_secs(1), || invoker.in_flight().is_empty()));
    assert!(entries.lock().is_empty());
}

#[test]
fn test_zero_and_negative_timeouts_rejected() {
    assert_eq!(
        TimeoutInvoker::new(0).unwrap_err(),
        ConfigurationError::NonPositiveTimeout(0)
    );
    assert_eq!(
        TimeoutInvoker::new(-5).unwrap_err(),
        ConfigurationError::NonPositiveTimeout(-5)
    );
}

#[test]
fn test_try_run_passes_value_through() {
    let invoker = TimeoutInvoker::new(1).unwrap();
    let value = invoker.try_run("parse", || "42".parse::<u32>()).unwrap();
    assert_eq!(value, 42);

    let err = invoker.try_run("parse", || "x".parse::<u32>()).unwrap_err();
    assert!(err.is_operation_error());
}

#[test]
fn test_concurrent_calls_are_attributed_separately() {
    let (entries, sink) = recording_sink();
    let invoker = TimeoutInvoker::new(1).unwrap().with_log_sink(sink);

    let handles: Vec<_> = ["alpha", "beta"]
        .into_iter()
        .map(|name| {
            let invoker = invoker.clone();
            thread::spawn(move || {
                invoker.run(name, || thread::sleep(Duration::from_secs(2)))
            })
        })
        .collect();

    let mut names: Vec<String> = handles
        .into_iter()
        .map(|h| {
            let err = h.join().unwrap().unwrap_err();
            err.as_timeout().unwrap().function_name().unwrap().to_string()
        })
        .collect();
    names.sort();

    assert_eq!(names, vec!["alpha", "beta"]);
    assert_eq!(entries.lock().len(), 2);
    assert_eq!(invoker.armed_countdowns(), 0);
}

#[test]
fn test_nested_calls_use_their_own_deadlines() {
    let (_entries, sink) = recording_sink();
    let outer = TimeoutInvoker::new(3).unwrap().with_log_sink(sink.clone());
    let inner = TimeoutInvoker::new(1).unwrap().with_log_sink(sink);

    let result = outer.wrap(inner.wrap(target)).call(());

    let inner_result = result.expect("outer call should finish in time");
    let err = inner_result.unwrap_err().into_timeout().unwrap();
    assert_eq!(err.function_name(), Some("target"));
    assert_eq!(err.timeout_seconds(), 1);
    assert_eq!(outer.armed_countdowns(), 0);
    assert_eq!(inner.armed_countdowns(), 0);
}

#[test]
fn test_rewrapping_wraps_the_wrapper() {
    let invoker = TimeoutInvoker::new(1).unwrap();
    let outer = invoker.wrap(invoker.wrap(quick));

    assert_eq!(outer.name(), Some("quick"));
    assert_eq!(outer.call((5,)).unwrap().unwrap(), "ok");
    assert_eq!(invoker.armed_countdowns(), 0);
}

#[test]
fn test_rewrapping_keeps_an_explicit_name() {
    let invoker = TimeoutInvoker::new(1).unwrap();
    let inner = invoker.wrap_named("nightly-report", quick);
    let outer = invoker.wrap_named(inner.name().unwrap().to_string(), inner);

    assert_eq!(outer.name(), Some("nightly-report"));
    assert_eq!(outer.call((5,)).unwrap().unwrap(), "ok");
}

#[test]
fn test_abandoned_worker_stays_in_flight_until_it_returns() {
    let (_entries, sink) = recording_sink();
    let invoker = TimeoutInvoker::new(1).unwrap().with_log_sink(sink);
    let (release_tx, release_rx) = flume::bounded::<()>(1);

    let err = invoker
        .run("blocked", move || release_rx.recv())
        .unwrap_err();
    assert!(err.is_timeout());

    assert_eq!(invoker.in_flight(), vec!["blocked".to_string()]);
    assert_eq!(invoker.armed_countdowns(), 0);

    release_tx.send(()).unwrap();
    assert!(wait_until(Duration::from_secs(1), || invoker.in_flight().is_empty()));
}

#[test]
fn test_cancellation_token_trips_on_deadline() {
    let (_entries, sink) = recording_sink();
    let invoker = TimeoutInvoker::new(1).unwrap().with_log_sink(sink);
    let (stopped_tx, stopped_rx) = flume::bounded::<u32>(1);

    let result = invoker.run_cancellable("spin", move |token| {
        let mut polls = 0u32;
        while !token.is_cancelled() {
            polls += 1;
            thread::sleep(Duration::from_millis(10));
        }
        let _ = stopped_tx.send(polls);
    });

    assert!(result.unwrap_err().is_timeout());
    let polls = stopped_rx
        .recv_timeout(Duration::from_secs(1))
        .expect("worker should observe cancellation");
    assert!(polls > 0);
}

#[test]
fn test_cancellation_token_untouched_on_success() {
    let invoker = TimeoutInvoker::new(1).unwrap();
    let cancelled = invoker
        .run_cancellable("check", |token| token.is_cancelled())
        .unwrap();
    assert!(!cancelled);
}
