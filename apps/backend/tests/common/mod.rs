#![allow(dead_code)]

use actix_web::body::BoxBody;
use actix_web::dev::ServiceResponse;
use actix_web::http::header::HeaderName;
use serde_json::Value;
use ulid::Ulid;

// Logging is auto-installed for every test binary pulling this module in.
#[ctor::ctor]
fn init_logging() {
    backend::telemetry::init_test_tracing();
}

/// Generate a unique string with the given prefix.
pub fn unique_str(prefix: &str) -> String {
    format!("{}-{}", prefix, Ulid::new())
}

/// Generate a unique email address with the given prefix.
pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.test", prefix, Ulid::new())
}

/// Assert that a response is a Problem Details error with the expected
/// status and code, and that its trace_id matches the x-trace-id header.
pub async fn assert_problem_details(
    resp: ServiceResponse<BoxBody>,
    expected_status: u16,
    expected_code: &str,
) -> Value {
    assert_eq!(resp.status().as_u16(), expected_status);

    let headers = resp.headers().clone();
    let trace_hdr = HeaderName::from_static("x-trace-id");
    let header_trace_id = headers
        .get(&trace_hdr)
        .and_then(|v| v.to_str().ok())
        .expect("x-trace-id header should be present")
        .to_string();

    let body: Value = actix_web::test::read_body_json(resp).await;
    assert_eq!(body["code"].as_str(), Some(expected_code));
    assert_eq!(body["status"].as_u64(), Some(expected_status as u64));
    assert_eq!(body["trace_id"].as_str(), Some(header_trace_id.as_str()));
    body
}
