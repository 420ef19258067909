//! Unit tests for API error classification and retry dispositions

use reqwest::StatusCode;
use youtube_subscription_transfer::client::{
    classify_api_error, ApiErrorBody, Disposition, MutationOutcome,
};

const QUOTA_BODY: &str = r#"{
  "error": {
    "code": 403,
    "message": "The request cannot be completed because you have exceeded your quota.",
    "errors": [
      {
        "message": "The request cannot be completed because you have exceeded your quota.",
        "domain": "youtube.quota",
        "reason": "quotaExceeded"
      }
    ]
  }
}"#;

#[test]
fn test_quota_body_parsed() {
    let body = ApiErrorBody::parse(QUOTA_BODY).unwrap();

    assert_eq!(body.code, 403);
    assert_eq!(body.reason(), Some("quotaExceeded"));
    assert_eq!(body.errors[0].domain, "youtube.quota");
}

#[test]
fn test_reason_wins_over_status() {
    // A 403 is a quota problem here, not a generic forbidden
    assert_eq!(
        classify_api_error(StatusCode::FORBIDDEN, QUOTA_BODY),
        MutationOutcome::QuotaExceeded
    );
}

#[test]
fn test_plain_text_body_falls_back_to_status() {
    assert_eq!(
        classify_api_error(StatusCode::TOO_MANY_REQUESTS, "slow down"),
        MutationOutcome::RateLimited
    );
    assert_eq!(
        classify_api_error(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>"),
        MutationOutcome::TransientError("HTTP 502".to_string())
    );
    assert_eq!(
        classify_api_error(StatusCode::UNAUTHORIZED, ""),
        MutationOutcome::UnknownError("HTTP 401".to_string())
    );
}

#[test]
fn test_dispositions() {
    let cases = [
        (MutationOutcome::Success, Disposition::Done),
        (MutationOutcome::AlreadyExists, Disposition::Done),
        (MutationOutcome::NotFound, Disposition::Permanent),
        (MutationOutcome::QuotaExceeded, Disposition::Permanent),
        (MutationOutcome::RateLimited, Disposition::RetryExponential),
        (
            MutationOutcome::TransientError("timeout".to_string()),
            Disposition::RetryLinear,
        ),
        (
            MutationOutcome::UnknownError("?".to_string()),
            Disposition::RetryLinear,
        ),
    ];

    for (outcome, expected) in cases {
        assert_eq!(outcome.disposition(), expected, "{outcome}");
    }
    assert!(!MutationOutcome::QuotaExceeded.is_retryable());
    assert!(MutationOutcome::RateLimited.is_retryable());
}
