//! Environment-driven configuration loading. Serialised because the tests
//! mutate process-wide environment variables.

use std::env;
use std::time::Duration;

use serial_test::serial;

use segment_voucherify_sync::load_config::load_config;
use segment_voucherify_sync::synchronise::FailurePolicy;

const REQUIRED: &[(&str, &str)] = &[
    ("SEGMENT_ACCESS_TOKEN", "test-token"),
    ("SEGMENT_SPACE_ID", "spa_123"),
    ("VOUCHERIFY_APPLICATION_ID", "app-456"),
    ("VOUCHERIFY_SECRET_KEY", "key-789"),
];

const OPTIONAL: &[&str] = &[
    "SEGMENT_REQUEST_LIMIT",
    "SEGMENT_TRAITS_LIMIT",
    "VOUCHERIFY_BATCH_SIZE",
    "SYNC_MIN_INTERVAL_MS",
];

fn set_required_env() {
    for (name, value) in REQUIRED {
        env::set_var(name, value);
    }
    for name in OPTIONAL {
        env::remove_var(name);
    }
}

#[test]
#[serial]
fn loads_with_defaults() {
    set_required_env();

    let config = load_config(None, FailurePolicy::RetryUpTo(3)).unwrap();
    assert_eq!(config.segment.access_token, "test-token");
    assert_eq!(config.segment.space_id, "spa_123");
    assert_eq!(config.voucherify.application_id, "app-456");
    assert_eq!(config.page_limit, 100);
    assert_eq!(config.segment.traits_limit, 15);
    assert_eq!(config.upsert_batch_size, 100);
    assert_eq!(config.min_request_interval, Duration::from_millis(10));
    assert_eq!(config.start_cursor, None);
}

#[test]
#[serial]
fn missing_variable_error_names_it() {
    set_required_env();
    env::remove_var("SEGMENT_SPACE_ID");

    let err = load_config(None, FailurePolicy::Stop).unwrap_err();
    assert!(
        err.to_string().contains("SEGMENT_SPACE_ID"),
        "error should name the missing variable: {err}"
    );
}

#[test]
#[serial]
fn optional_limits_are_overridable() {
    set_required_env();
    env::set_var("SEGMENT_REQUEST_LIMIT", "25");
    env::set_var("SEGMENT_TRAITS_LIMIT", "5");
    env::set_var("VOUCHERIFY_BATCH_SIZE", "50");
    env::set_var("SYNC_MIN_INTERVAL_MS", "100");

    let config = load_config(Some("abc".to_string()), FailurePolicy::Stop).unwrap();
    assert_eq!(config.page_limit, 25);
    assert_eq!(config.segment.traits_limit, 5);
    assert_eq!(config.upsert_batch_size, 50);
    assert_eq!(config.min_request_interval, Duration::from_millis(100));
    assert_eq!(config.start_cursor.as_deref(), Some("abc"));
}

#[test]
#[serial]
fn zero_limit_is_rejected() {
    set_required_env();
    env::set_var("VOUCHERIFY_BATCH_SIZE", "0");

    let err = load_config(None, FailurePolicy::Stop).unwrap_err();
    assert!(
        err.to_string().contains("VOUCHERIFY_BATCH_SIZE"),
        "error should name the invalid variable: {err}"
    );
}

#[test]
#[serial]
fn non_numeric_limit_is_rejected() {
    set_required_env();
    env::set_var("SEGMENT_REQUEST_LIMIT", "lots");

    assert!(load_config(None, FailurePolicy::Stop).is_err());
}
