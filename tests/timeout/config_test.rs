/*!
 * Configuration Tests
 * Building invokers from JSON and the environment
 */

use bounded_call::{ConfigurationError, InvokerConfig, TimeoutInvoker};
use pretty_assertions::assert_eq;
use serial_test::serial;

#[test]
fn test_invoker_from_config() {
    let config = InvokerConfig::from_json(r#"{"timeout_seconds": 2, "worker_name": "reports"}"#)
        .unwrap();
    let invoker = TimeoutInvoker::from_config(config).unwrap();

    assert_eq!(invoker.timeout_seconds(), 2);
    let name = invoker
        .run("render", || std::thread::current().name().map(str::to_string))
        .unwrap();
    assert_eq!(name.as_deref(), Some("reports-render"));
}

#[test]
fn test_invoker_from_invalid_config() {
    let config = InvokerConfig::from_json(r#"{"timeout_seconds": -1}"#).unwrap();
    assert_eq!(
        TimeoutInvoker::from_config(config).unwrap_err(),
        ConfigurationError::NonPositiveTimeout(-1)
    );
}

#[test]
#[serial]
fn test_from_env() {
    std::env::set_var("BOUNDED_CALL_TIMEOUT_SECS", "7");
    std::env::set_var("BOUNDED_CALL_WORKER_NAME", "env-worker");

    let config = InvokerConfig::from_env().unwrap();
    assert_eq!(config.timeout_seconds, 7);
    assert_eq!(config.worker_name, "env-worker");

    std::env::set_var("BOUNDED_CALL_TIMEOUT_SECS", "soon");
    assert!(matches!(
        InvokerConfig::from_env(),
        Err(ConfigurationError::InvalidConfig(_))
    ));

    std::env::remove_var("BOUNDED_CALL_TIMEOUT_SECS");
    std::env::remove_var("BOUNDED_CALL_WORKER_NAME");
    assert_eq!(InvokerConfig::from_env().unwrap(), InvokerConfig::default());
}
