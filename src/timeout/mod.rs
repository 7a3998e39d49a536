/*!
 * Time-Bounded Invocation
 *
 * Enforces a whole-second time bound on synchronous calls:
 * - Config: Timeout and worker settings
 * - Invoker: Wraps targets and races them against a deadline
 * - Countdown: RAII deadline released on every exit path
 * - Registry: Targets still executing, including abandoned ones
 */

mod cancel;
pub mod config;
mod countdown;
mod deadline;
mod invoker;
mod registry;

pub use cancel::CancellationToken;
pub use config::InvokerConfig;
pub use countdown::Countdown;
pub use deadline::Deadline;
pub use invoker::{display_name, Bounded, Target, TimeoutInvoker};
pub use registry::{InFlightCall, InFlightGuard, InFlightRegistry};
