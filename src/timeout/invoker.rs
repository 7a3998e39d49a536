/*!
 * Time-Bounded Invocation
 *
 * Wraps a target so that calling it enforces a whole-second time bound.
 *
 * ## Execution Model
 *
 * Each call runs its target on a dedicated worker thread and races the
 * worker's completion against a per-call deadline over a channel:
 *
 * - Worker first: the countdown is disarmed and the value is returned as-is
 * - Deadline first: the worker is abandoned, its cancellation token tripped,
 *   and a `TimeoutExceededError` is logged then returned
 *
 * Abandonment is not rollback. The worker keeps running until the target
 * returns and its result is discarded. Every call owns its own deadline and
 * context, so concurrent and nested calls are attributed correctly.
 *
 * ## Example
 *
 * ```ignore
 * let invoker = TimeoutInvoker::new(5)?;
 * let fetch = invoker.wrap(fetch_report);
 * let report = fetch.call((report_id,))?;
 * ```
 */

use super::{CancellationToken, Countdown, InFlightCall, InFlightRegistry, InvokerConfig};
use crate::core::limits::ANONYMOUS_TARGET;
use crate::errors::{CallError, CallResult, ConfigurationError, TimeoutExceededError};
use crate::monitoring::{default_log_sink, generate_call_id, CallSpan, LogSink};
use flume::RecvTimeoutError;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// A callable a `Bounded` wrapper can invoke with an argument tuple
///
/// Implemented for every `Fn` of up to six arguments, so `f(a, b)` becomes
/// `bounded.call((a, b))` and `f()` becomes `bounded.call(())`.
pub trait Target<Args>: Send + Sync + 'static {
    type Output;

    fn invoke(&self, args: Args) -> Self::Output;
}

macro_rules! impl_target {
    ($($arg:ident),*) => {
        impl<Func, Out, $($arg,)*> Target<($($arg,)*)> for Func
        where
            Func: Fn($($arg),*) -> Out + Send + Sync + 'static,
        {
            type Output = Out;

            #[allow(non_snake_case)]
            #[inline]
            fn invoke(&self, ($($arg,)*): ($($arg,)*)) -> Out {
                (self)($($arg),*)
            }
        }
    };
}

impl_target!();
impl_target!(A1);
impl_target!(A1, A2);
impl_target!(A1, A2, A3);
impl_target!(A1, A2, A3, A4);
impl_target!(A1, A2, A3, A4, A5);
impl_target!(A1, A2, A3, A4, A5, A6);

/// Display name of a callable type: the last path segment, generics stripped
///
/// `my_crate::jobs::target` becomes `target`, `Job<u8>::run` becomes `run`,
/// `<Nightly as Task>::execute` becomes `execute` and closures become
/// `{{closure}}`. A wrapped `Bounded<F>` reports the name of `F`. Returns
/// `None` when no segment is left to name.
pub fn display_name<F: ?Sized>() -> Option<String> {
    name_from_type_path(std::any::type_name::<F>())
}

fn name_from_type_path(path: &str) -> Option<String> {
    let path = path.trim();
    let bounded = std::any::type_name::<Bounded<()>>();
    let bounded = bounded.split('<').next().unwrap_or(bounded);
    if let Some(inner) = path
        .strip_prefix(bounded)
        .and_then(|rest| rest.strip_prefix('<'))
        .and_then(|rest| rest.strip_suffix('>'))
    {
        return name_from_type_path(inner);
    }

    let stripped = strip_generics(path);
    let name = stripped.rsplit("::").next().unwrap_or("").trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Drop every `<...>` group, nested ones included; the `>` of `->` is kept
fn strip_generics(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut depth = 0usize;
    let mut prev = '\0';
    for c in path.chars() {
        match c {
            '<' => depth += 1,
            '>' if prev != '-' && depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(c),
            _ => {}
        }
        prev = c;
    }
    out
}

/// Enforces a time bound on the calls made through it
///
/// Clones share the in-flight registry and countdown count.
#[derive(Clone)]
pub struct TimeoutInvoker {
    timeout_seconds: u64,
    worker_name: String,
    stack_size: Option<usize>,
    log_sink: LogSink,
    armed: Arc<AtomicUsize>,
    registry: Arc<InFlightRegistry>,
}

impl TimeoutInvoker {
    /// Create an invoker; fails unless `timeout_seconds` is positive
    pub fn new(timeout_seconds: i64) -> Result<Self, ConfigurationError> {
        Self::from_config(InvokerConfig::new(timeout_seconds))
    }

    /// Create an invoker from a validated configuration
    pub fn from_config(config: InvokerConfig) -> Result<Self, ConfigurationError> {
        let timeout_seconds = config.validate()?;
        Ok(Self {
            timeout_seconds,
            worker_name: config.worker_name,
            stack_size: config.stack_size,
            log_sink: default_log_sink(),
            armed: Arc::new(AtomicUsize::new(0)),
            registry: Arc::new(InFlightRegistry::new()),
        })
    }

    /// Record timeout failures through `sink` instead of the default logger
    pub fn with_log_sink(mut self, sink: LogSink) -> Self {
        self.log_sink = sink;
        self
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Wrap `target`, naming it after its type
    ///
    /// Nothing runs until the wrapper is called. Wrapping a `Bounded` keeps
    /// the inner target's type name; use `wrap_named` to carry a custom one.
    pub fn wrap<F>(&self, target: F) -> Bounded<F> {
        self.bounded(display_name::<F>(), target)
    }

    /// Wrap `target` under an explicit name
    pub fn wrap_named<F>(&self, name: impl Into<String>, target: F) -> Bounded<F> {
        self.bounded(Some(name.into()), target)
    }

    fn bounded<F>(&self, name: Option<String>, target: F) -> Bounded<F> {
        Bounded {
            invoker: self.clone(),
            name,
            target: Arc::new(target),
        }
    }

    /// Run a one-shot closure under the bound
    pub fn run<F, R>(&self, name: &str, target: F) -> CallResult<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.execute(Some(name), move |_| target(), completed)
    }

    /// Run a one-shot fallible closure; its error comes back as `CallError::Operation`
    pub fn try_run<F, T, E>(&self, name: &str, target: F) -> CallResult<T, E>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        flatten(self.execute(Some(name), move |_| target(), completed_fallible))
    }

    /// Run a closure that can watch for its own cancellation
    ///
    /// The token is tripped when the deadline fires, letting an abandoned
    /// target stop early instead of running to completion.
    pub fn run_cancellable<F, R>(&self, name: &str, target: F) -> CallResult<R>
    where
        F: FnOnce(&CancellationToken) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.execute(Some(name), target, completed)
    }

    /// Names of targets whose workers are still running, oldest first
    ///
    /// Includes workers abandoned after their deadline.
    pub fn in_flight(&self) -> Vec<String> {
        self.registry
            .snapshot()
            .into_iter()
            .map(|call| call.function)
            .collect()
    }

    /// Detailed view of running targets
    pub fn in_flight_calls(&self) -> Vec<InFlightCall> {
        self.registry.snapshot()
    }

    /// Number of callers currently waiting on an armed countdown
    pub fn armed_countdowns(&self) -> usize {
        self.armed.load(Ordering::Acquire)
    }

    fn execute<F, R, E>(
        &self,
        function: Option<&str>,
        target: F,
        outcome: fn(&R) -> &'static str,
    ) -> CallResult<R, E>
    where
        F: FnOnce(&CancellationToken) -> R + Send + 'static,
        R: Send + 'static,
    {
        let label = function.unwrap_or(ANONYMOUS_TARGET);
        let span = CallSpan::new(generate_call_id(), label, self.timeout_seconds);
        let token = CancellationToken::new();
        let in_flight = self
            .registry
            .register(span.call_id(), label, self.timeout_seconds);
        let (tx, rx) = flume::bounded::<thread::Result<R>>(1);

        let mut builder = thread::Builder::new().name(self.thread_name(label));
        if let Some(size) = self.stack_size {
            builder = builder.stack_size(size);
        }

        let countdown =
            Countdown::arm(self.timeout_seconds, token.clone(), Arc::clone(&self.armed));

        let spawned = builder.spawn(move || {
            let _in_flight = in_flight;
            let result = panic::catch_unwind(AssertUnwindSafe(|| target(&token)));
            // The caller stops listening once the deadline has fired
            let _ = tx.send(result);
        });
        if let Err(e) = spawned {
            span.record_result("spawn_error");
            return Err(CallError::Spawn(e));
        }

        let expires_at = countdown.deadline().expires_at();
        match rx.recv_deadline(expires_at) {
            Ok(Ok(value)) => {
                drop(countdown);
                span.record_result(outcome(&value));
                Ok(value)
            }
            Ok(Err(payload)) => {
                drop(countdown);
                span.record_result("panic");
                panic::resume_unwind(payload)
            }
            Err(RecvTimeoutError::Timeout) => {
                countdown.fire();
                span.record_abandoned();
                let _entered = span.enter();
                let error = TimeoutExceededError::with_sink(
                    function.map(str::to_string),
                    self.timeout_seconds,
                    self.log_sink.as_ref(),
                );
                Err(CallError::Timeout(error))
            }
            Err(RecvTimeoutError::Disconnected) => {
                drop(countdown);
                span.record_result("worker_lost");
                Err(CallError::WorkerLost(label.to_string()))
            }
        }
    }

    fn thread_name(&self, function: &str) -> String {
        format!("{}-{}", self.worker_name, function).replace('\0', "")
    }
}

impl fmt::Debug for TimeoutInvoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeoutInvoker")
            .field("timeout_seconds", &self.timeout_seconds)
            .field("worker_name", &self.worker_name)
            .field("stack_size", &self.stack_size)
            .field("armed", &self.armed_countdowns())
            .field("in_flight", &self.registry.len())
            .finish()
    }
}

fn completed<R>(_: &R) -> &'static str {
    "ok"
}

fn completed_fallible<T, E>(value: &Result<T, E>) -> &'static str {
    if value.is_ok() {
        "ok"
    } else {
        "error"
    }
}

fn flatten<T, E>(result: CallResult<Result<T, E>, E>) -> CallResult<T, E> {
    match result {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(CallError::Operation(e)),
        Err(e) => Err(e),
    }
}

/// A target wrapped with its invoker's time bound
///
/// A `Bounded` is itself a `Target`, so it can be wrapped again; the outer
/// call then returns the inner call's `CallResult` as its value.
pub struct Bounded<F> {
    invoker: TimeoutInvoker,
    name: Option<String>,
    target: Arc<F>,
}

impl<F> Bounded<F> {
    /// Name reported in timeout failures
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.invoker.timeout_seconds
    }

    pub fn invoker(&self) -> &TimeoutInvoker {
        &self.invoker
    }

    /// Call the target with `args`, returning its value unchanged
    pub fn call<Args>(&self, args: Args) -> CallResult<<F as Target<Args>>::Output>
    where
        F: Target<Args>,
        Args: Send + 'static,
        <F as Target<Args>>::Output: Send + 'static,
    {
        let target = Arc::clone(&self.target);
        self.invoker
            .execute(self.name(), move |_| target.invoke(args), completed)
    }

    /// Call a fallible target; its error comes back as `CallError::Operation`
    pub fn try_call<Args, T, E>(&self, args: Args) -> CallResult<T, E>
    where
        F: Target<Args, Output = Result<T, E>>,
        Args: Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        let target = Arc::clone(&self.target);
        flatten(self.invoker.execute(
            self.name(),
            move |_| target.invoke(args),
            completed_fallible,
        ))
    }
}

impl<F, Args> Target<Args> for Bounded<F>
where
    F: Target<Args>,
    Args: Send + 'static,
    <F as Target<Args>>::Output: Send + 'static,
{
    type Output = CallResult<<F as Target<Args>>::Output>;

    fn invoke(&self, args: Args) -> Self::Output {
        self.call(args)
    }
}

impl<F> Clone for Bounded<F> {
    fn clone(&self) -> Self {
        Self {
            invoker: self.invoker.clone(),
            name: self.name.clone(),
            target: Arc::clone(&self.target),
        }
    }
}

impl<F> fmt::Debug for Bounded<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bounded")
            .field("name", &self.name)
            .field("timeout_seconds", &self.invoker.timeout_seconds)
            .finish()
    }
}
