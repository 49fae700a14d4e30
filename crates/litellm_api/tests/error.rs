use litellm_api::error::parse_error_message;
use reqwest::StatusCode;

#[test]
fn error_message_extracted_from_object_shape() {
    let body = r#"{"error":{"message":"model not found","code":"404"}}"#;
    assert_eq!(
        parse_error_message(StatusCode::NOT_FOUND, body),
        "model not found"
    );
}

#[test]
fn error_message_extracted_from_string_shape() {
    let body = r#"{"error":"invalid api key"}"#;
    assert_eq!(
        parse_error_message(StatusCode::UNAUTHORIZED, body),
        "invalid api key"
    );
}

#[test]
fn plain_text_body_is_passed_through() {
    assert_eq!(
        parse_error_message(StatusCode::BAD_GATEWAY, "upstream exploded"),
        "upstream exploded"
    );
}

#[test]
fn empty_body_falls_back_to_canonical_reason() {
    assert_eq!(
        parse_error_message(StatusCode::SERVICE_UNAVAILABLE, ""),
        "Service Unavailable"
    );
}

#[test]
fn blank_error_object_falls_back_to_body_text() {
    let body = r#"{"error":{}}"#;
    assert_eq!(
        parse_error_message(StatusCode::INTERNAL_SERVER_ERROR, body),
        body
    );
}
