/*!
 * Shared helpers for timeout tests
 */

use bounded_call::LogSink;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Sink that keeps every message it is handed
pub fn recording_sink() -> (Arc<Mutex<Vec<String>>>, LogSink) {
    let entries = Arc::new(Mutex::new(Vec::new()));
    let clone = entries.clone();
    let sink: LogSink = Arc::new(move |message: &str| clone.lock().push(message.to_string()));
    (entries, sink)
}

/// Poll `condition` until it holds or `limit` passes
pub fn wait_until(limit: Duration, condition: impl Fn() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < limit {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    condition()
}
