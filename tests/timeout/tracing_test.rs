/*!
 * Tracing Tests
 */

use bounded_call::{init_tracing, TimeoutInvoker};
use serial_test::serial;

#[test]
#[serial]
fn test_init_tracing_is_idempotent() {
    let _ = init_tracing();
    assert!(!init_tracing());

    // Spans and the default sink work with a subscriber installed
    let invoker = TimeoutInvoker::new(1).unwrap();
    assert_eq!(invoker.run("traced", || 1 + 1).unwrap(), 2);
}
