use super::*;

fn test_client(base_url: &str) -> MarketplaceClient {
    MarketplaceClient::new(base_url, 5).expect("client construction should not fail")
}

#[test]
fn endpoint_appends_to_base_path() {
    let client = test_client("https://api.pawmarket.test/v1");
    let url = client.endpoint("products/7").unwrap();
    assert_eq!(url.as_str(), "https://api.pawmarket.test/v1/products/7");
}

#[test]
fn endpoint_strips_extra_trailing_slashes() {
    let client = test_client("https://api.pawmarket.test/v1//");
    let url = client.endpoint("orders").unwrap();
    assert_eq!(url.as_str(), "https://api.pawmarket.test/v1/orders");
}

#[test]
fn invalid_base_url_is_rejected() {
    let err = MarketplaceClient::new("not a url", 5).unwrap_err();
    assert!(
        matches!(err, ClientError::InvalidBaseUrl { .. }),
        "expected InvalidBaseUrl, got: {err:?}"
    );
}

#[test]
fn error_body_is_mapped_to_api_error() {
    let err = MarketplaceClient::error_from_body(
        422,
        r#"{"error":{"code":"EXPIRED","message":"El cupón expiró"}}"#,
        "coupon",
    );
    assert!(
        matches!(err, ClientError::Api { status: 422, ref code, ref message } if code == "EXPIRED" && message == "El cupón expiró"),
        "got: {err:?}"
    );
    assert_eq!(err.to_string(), "El cupón expiró");
}

#[test]
fn error_body_without_message_uses_code() {
    let err = MarketplaceClient::error_from_body(400, r#"{"error":{"code":"BAD"}}"#, "x");
    assert_eq!(err.to_string(), "BAD");
}

#[test]
fn unrecognised_error_body_is_unexpected_status() {
    let err = MarketplaceClient::error_from_body(502, "<html>bad gateway</html>", "orders");
    assert!(matches!(err, ClientError::UnexpectedStatus { status: 502, .. }));
    assert_eq!(err.status(), Some(502));
}

#[test]
fn debug_output_redacts_token() {
    let client = test_client("https://api.pawmarket.test").with_token("secret-token");
    let rendered = format!("{client:?}");
    assert!(!rendered.contains("secret-token"));
}
