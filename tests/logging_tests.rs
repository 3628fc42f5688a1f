//! Unit tests for the logging functionality in the `sigfox-rs` crate.

use sigfox_rs::logging::{init_logger, log_debug, log_error, log_info, log_warn};
use sigfox_rs::util::logging::{log_payload_hex, LogThrottle, ThrottleManager};

/// Tests that the logging helpers do not panic.
#[test]
fn test_logging() {
    log_error("This is an error message");
    log_warn("This is a warning message");
    log_info("This is an info message");
    log_debug("This is a debug message");
    log_payload_hex("uplink", &[0x2f, 0xa3, 0x02]);
}

/// Tests that the logger can be initialized more than once.
#[test]
fn test_init_logger() {
    init_logger();
    init_logger();
}

/// Tests that a throttle refuses messages past its cap within one window.
#[test]
fn test_throttle() {
    let mut throttle = LogThrottle::new(60_000, 3);
    let allowed = (0..5).filter(|_| throttle.allow()).count();
    assert_eq!(allowed, 3);
    assert_eq!(throttle.suppressed(), 2);
}

/// Tests that a zero-length window reopens after it elapses.
#[test]
fn test_throttle_window_expires() {
    let mut throttle = LogThrottle::new(0, 1);
    assert!(throttle.allow());
    std::thread::sleep(std::time::Duration::from_millis(5));
    assert!(throttle.allow());
}

/// Tests that throttles are kept per category.
#[test]
fn test_throttle_manager() {
    let mut manager = ThrottleManager::new();
    assert!(manager.allow("power_supply/1A2B3C", 60_000, 1));
    assert!(!manager.allow("power_supply/1A2B3C", 60_000, 1));
    assert!(manager.allow("weather/1A2B3C", 60_000, 1));
}
