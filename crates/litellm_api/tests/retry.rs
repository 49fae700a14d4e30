use std::time::Duration;

use litellm_api::retry::{is_retryable_http_error, retry_delay, BASE_DELAY_MS, MAX_RETRIES};

#[test]
fn retryable_statuses_match_transient_table() {
    for status in [429, 500, 502, 503, 504] {
        assert!(is_retryable_http_error(status, ""), "status {status}");
    }
    for status in [400, 401, 403, 404, 422] {
        assert!(!is_retryable_http_error(status, ""), "status {status}");
    }
}

#[test]
fn transient_error_text_is_retryable_regardless_of_status() {
    assert!(is_retryable_http_error(400, "Rate limit exceeded"));
    assert!(is_retryable_http_error(400, "upstream connection reset"));
    assert!(is_retryable_http_error(400, "request timed out"));
    assert!(!is_retryable_http_error(400, "invalid request payload"));
}

#[test]
fn retry_delay_grows_exponentially_from_base() {
    assert_eq!(retry_delay(0), Duration::from_millis(BASE_DELAY_MS));
    assert_eq!(retry_delay(1), Duration::from_millis(BASE_DELAY_MS * 2));
    assert_eq!(retry_delay(2), Duration::from_millis(BASE_DELAY_MS * 4));
}

#[test]
fn retry_delay_exponent_is_capped() {
    assert_eq!(retry_delay(40), retry_delay(16));
}

#[test]
fn retry_budget_is_bounded() {
    assert!(MAX_RETRIES <= 5);
}
