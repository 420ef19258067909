//! Integration tests for the YouTube client and token refresh against a local stub

use crate::common::{api_error, spawn_http_stub};
use std::collections::HashMap;
use std::time::Duration;
use tempfile::TempDir;
use youtube_subscription_transfer::auth::{AuthError, Authenticator, ClientSecrets, ConsentFlow};
use youtube_subscription_transfer::client::{MutationOutcome, SubscriptionApi, YouTubeClient};
use youtube_subscription_transfer::AccountRole;

async fn outcome_for(status: u16, body: String) -> MutationOutcome {
    let (base_url, server) = spawn_http_stub(vec![(status, body)]).await;
    let client = YouTubeClient::new_with_base_url("test-token", base_url).unwrap();
    let outcome = client.ensure_subscribed("UCtarget").await;
    server.await.unwrap();
    outcome
}

#[tokio::test]
async fn test_subscribe_request_shape() {
    let (base_url, server) = spawn_http_stub(vec![(200, "{}".to_string())]).await;
    let client = YouTubeClient::new_with_base_url("test-token", format!("{base_url}/")).unwrap();

    assert_eq!(
        client.ensure_subscribed("UCtarget").await,
        MutationOutcome::Success
    );

    let requests = server.await.unwrap();
    let request = &requests[0];
    assert!(request.starts_with("POST /subscriptions?part=snippet "));
    assert!(request.to_lowercase().contains("authorization: bearer test-token"));
    assert!(request.contains(r#""channelId":"UCtarget""#));
    assert!(request.contains(r#""kind":"youtube#channel""#));
}

#[tokio::test]
async fn test_subscribe_error_classification() {
    assert_eq!(
        outcome_for(400, api_error(400, "subscriptionDuplicate")).await,
        MutationOutcome::AlreadyExists
    );
    assert_eq!(
        outcome_for(404, api_error(404, "publisherNotFound")).await,
        MutationOutcome::NotFound
    );
    assert_eq!(
        outcome_for(403, api_error(403, "quotaExceeded")).await,
        MutationOutcome::QuotaExceeded
    );
    assert_eq!(
        outcome_for(403, api_error(403, "rateLimitExceeded")).await,
        MutationOutcome::RateLimited
    );
    assert_eq!(
        outcome_for(429, String::new()).await,
        MutationOutcome::RateLimited
    );
    assert!(matches!(
        outcome_for(503, String::new()).await,
        MutationOutcome::TransientError(_)
    ));
    assert!(matches!(
        outcome_for(400, api_error(400, "invalidValue")).await,
        MutationOutcome::UnknownError(_)
    ));
}

#[tokio::test]
async fn test_list_page_parsing_and_params() {
    let body = r#"{
        "nextPageToken": "CDIQAA",
        "items": [
            {
                "id": "sub-1",
                "snippet": {
                    "title": "Rust Talks",
                    "description": "Conference videos",
                    "publishedAt": "2021-03-04T05:06:07Z",
                    "resourceId": {"kind": "youtube#channel", "channelId": "UCrust"}
                }
            }
        ]
    }"#;
    let (base_url, server) = spawn_http_stub(vec![(200, body.to_string())]).await;
    let client = YouTubeClient::new_with_base_url("test-token", base_url).unwrap();

    let page = client.list_subscriptions_page(Some("CAUQAA")).await.unwrap();

    assert_eq!(page.next_page_token.as_deref(), Some("CDIQAA"));
    assert_eq!(page.items.len(), 1);
    let record = &page.items[0];
    assert_eq!(record.channel_id, "UCrust");
    assert_eq!(record.channel_title, "Rust Talks");
    assert_eq!(record.subscription_id, "sub-1");
    assert_eq!(record.published_at, "2021-03-04T05:06:07Z");

    let requests = server.await.unwrap();
    let request_line = requests[0].lines().next().unwrap().to_string();
    assert!(request_line.starts_with("GET /subscriptions?"));
    assert!(request_line.contains("mine=true"));
    assert!(request_line.contains("maxResults=50"));
    assert!(request_line.contains("pageToken=CAUQAA"));
}

#[tokio::test]
async fn test_list_page_error_is_reported() {
    let (base_url, server) = spawn_http_stub(vec![(403, api_error(403, "quotaExceeded"))]).await;
    let client = YouTubeClient::new_with_base_url("test-token", base_url).unwrap();

    let err = client.list_subscriptions_page(None).await.unwrap_err();
    server.await.unwrap();

    assert!(err.to_string().contains("403"));
    assert!(err.to_string().contains("quotaExceeded"));
}

#[tokio::test]
async fn test_already_subscribed_check() {
    let found = r#"{"items": [{"id": "s", "snippet": {"title": "t", "resourceId": {"channelId": "UCx"}}}]}"#;
    let (base_url, server) = spawn_http_stub(vec![
        (200, found.to_string()),
        (200, r#"{"items": []}"#.to_string()),
        (500, String::new()),
    ])
    .await;
    let client = YouTubeClient::new_with_base_url("test-token", base_url).unwrap();

    assert!(client.is_already_subscribed("UCx").await);
    assert!(!client.is_already_subscribed("UCy").await);
    // Errors read as "not subscribed"
    assert!(!client.is_already_subscribed("UCz").await);

    let requests = server.await.unwrap();
    assert!(requests[0].contains("forChannelId=UCx"));
}

#[tokio::test]
async fn test_channel_info() {
    let body = r#"{"items": [{"id": "UCme", "snippet": {"title": "Me", "description": "", "customUrl": "@me"}}]}"#;
    let (base_url, server) = spawn_http_stub(vec![(200, body.to_string())]).await;
    let client = YouTubeClient::new_with_base_url("test-token", base_url).unwrap();

    let info = client.channel_info().await.unwrap().unwrap();
    server.await.unwrap();

    assert_eq!(info.id, "UCme");
    assert_eq!(info.title, "Me");
    assert_eq!(info.custom_url, "@me");
}

fn write_expired_token(dir: &TempDir, token_uri: &str) {
    let token = serde_json::json!({
        "token": "stale",
        "refresh_token": "refresh-me",
        "token_uri": token_uri,
        "client_id": "client-1",
        "client_secret": "secret-1",
        "scopes": ["https://www.googleapis.com/auth/youtube"],
        "expiry": "2020-01-01T00:00:00Z",
        "universe_domain": "googleapis.com"
    });
    std::fs::write(
        dir.path().join("token_destination.json"),
        serde_json::to_string(&token).unwrap(),
    )
    .unwrap();
}

#[tokio::test]
async fn test_expired_token_is_refreshed_and_saved() {
    let dir = TempDir::new().unwrap();
    let (base_url, server) = spawn_http_stub(vec![(
        200,
        r#"{"access_token": "fresh", "expires_in": 3599, "token_type": "Bearer"}"#.to_string(),
    )])
    .await;
    write_expired_token(&dir, &format!("{base_url}/token"));

    let auth = Authenticator::with_paths(&dir.path().join("credentials.json"), dir.path()).unwrap();
    let session = auth.authorize(AccountRole::Destination).await.unwrap();

    assert_eq!(session.access_token(), "fresh");
    assert_eq!(session.role(), AccountRole::Destination);

    let requests = server.await.unwrap();
    assert!(requests[0].starts_with("POST /token "));
    assert!(requests[0].contains("grant_type=refresh_token"));
    assert!(requests[0].contains("refresh_token=refresh-me"));
    assert!(requests[0].contains("client_id=client-1"));

    let saved: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("token_destination.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(saved["token"], "fresh");
    assert_eq!(saved["refresh_token"], "refresh-me");
    assert_eq!(saved["universe_domain"], "googleapis.com");
}

#[tokio::test]
async fn test_rejected_refresh_is_an_error() {
    let dir = TempDir::new().unwrap();
    let (base_url, server) =
        spawn_http_stub(vec![(400, r#"{"error": "invalid_grant"}"#.to_string())]).await;
    write_expired_token(&dir, &format!("{base_url}/token"));

    let auth = Authenticator::with_paths(&dir.path().join("credentials.json"), dir.path())
        .unwrap()
        .with_consent(false);
    let result = auth.authorize(AccountRole::Destination).await;
    server.await.unwrap();

    match result {
        Err(AuthError::RefreshFailed(message)) => assert!(message.contains("invalid_grant")),
        other => panic!("expected refresh failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rejected_refresh_falls_back_to_consent() {
    let dir = TempDir::new().unwrap();
    let (base_url, server) =
        spawn_http_stub(vec![(400, r#"{"error": "invalid_grant"}"#.to_string())]).await;
    write_expired_token(&dir, &format!("{base_url}/token"));

    // Consent needs the client registration, which this directory lacks
    let auth = Authenticator::with_paths(&dir.path().join("credentials.json"), dir.path()).unwrap();
    let result = auth.authorize(AccountRole::Destination).await;
    server.await.unwrap();

    assert!(matches!(result, Err(AuthError::CredentialsMissing(_))));
}

fn consent_flow(token_uri: &str) -> ConsentFlow {
    let secrets = ClientSecrets::parse(
        &serde_json::json!({
            "installed": {
                "client_id": "client-1",
                "client_secret": "secret-1",
                "token_uri": token_uri,
            }
        })
        .to_string(),
    )
    .unwrap();
    ConsentFlow::new(secrets, reqwest::Client::new()).with_timeout(Duration::from_secs(10))
}

#[tokio::test]
async fn test_code_exchange_builds_token() {
    let (base_url, server) = spawn_http_stub(vec![(
        200,
        r#"{"access_token": "ya29.new", "expires_in": 3599, "refresh_token": "1//new",
            "scope": "https://www.googleapis.com/auth/youtube", "token_type": "Bearer"}"#
            .to_string(),
    )])
    .await;

    let token = consent_flow(&format!("{base_url}/token"))
        .exchange_code("4/0Ax", "http://127.0.0.1:4444/")
        .await
        .unwrap();

    assert_eq!(token.token, "ya29.new");
    assert_eq!(token.refresh_token.as_deref(), Some("1//new"));
    assert_eq!(token.client_id.as_deref(), Some("client-1"));
    assert_eq!(token.scopes, vec!["https://www.googleapis.com/auth/youtube"]);
    assert!(token.expiry_time().is_some());
    assert!(!token.is_expired());

    let requests = server.await.unwrap();
    assert!(requests[0].starts_with("POST /token "));
    assert!(requests[0].contains("grant_type=authorization_code"));
    assert!(requests[0].contains("code=4%2F0Ax"));
    assert!(requests[0].contains("client_secret=secret-1"));
}

#[tokio::test]
async fn test_rejected_code_exchange() {
    let (base_url, server) =
        spawn_http_stub(vec![(400, r#"{"error": "invalid_grant"}"#.to_string())]).await;

    let result = consent_flow(&format!("{base_url}/token"))
        .exchange_code("stale", "http://127.0.0.1:4444/")
        .await;
    server.await.unwrap();

    match result {
        Err(AuthError::ConsentFailed(message)) => assert!(message.contains("invalid_grant")),
        other => panic!("expected consent failure, got {other:?}"),
    }
}

/// Follow the consent URL the way a browser would after the user approves
fn approve_in_browser(url: &reqwest::Url, state_override: Option<&str>) {
    let params: HashMap<String, String> = url.query_pairs().into_owned().collect();
    let redirect_uri = params["redirect_uri"].clone();
    let state = state_override.map_or_else(|| params["state"].clone(), str::to_string);

    tokio::spawn(async move {
        let client = reqwest::Client::new();
        // A stray request first; the listener must skip it
        let _ = client.get(format!("{redirect_uri}favicon.ico")).send().await;
        let _ = client
            .get(&redirect_uri)
            .query(&[("state", state.as_str()), ("code", "4/0Ax")])
            .send()
            .await;
    });
}

#[tokio::test]
async fn test_consent_flow_end_to_end() {
    let (base_url, server) = spawn_http_stub(vec![(
        200,
        r#"{"access_token": "ya29.granted", "expires_in": 3599, "refresh_token": "1//granted"}"#
            .to_string(),
    )])
    .await;

    let flow = consent_flow(&format!("{base_url}/token"));
    let token = flow
        .run(|url| {
            assert!(url.as_str().contains("access_type=offline"));
            approve_in_browser(url, None);
        })
        .await
        .unwrap();

    assert_eq!(token.token, "ya29.granted");
    assert_eq!(token.refresh_token.as_deref(), Some("1//granted"));

    let requests = server.await.unwrap();
    assert!(requests[0].contains("code=4%2F0Ax"));
    assert!(requests[0].contains("redirect_uri=http%3A%2F%2F127.0.0.1%3A"));
}

#[tokio::test]
async fn test_consent_flow_rejects_forged_state() {
    let flow = consent_flow("http://127.0.0.1:9/token");
    let result = flow.run(|url| approve_in_browser(url, Some("forged"))).await;

    match result {
        Err(AuthError::ConsentFailed(message)) => assert!(message.contains("state mismatch")),
        other => panic!("expected state mismatch, got {other:?}"),
    }
}

#[tokio::test]
async fn test_consent_flow_denied() {
    let flow = consent_flow("http://127.0.0.1:9/token");
    let result = flow
        .run(|url| {
            let params: HashMap<String, String> = url.query_pairs().into_owned().collect();
            let redirect_uri = params["redirect_uri"].clone();
            let state = params["state"].clone();
            tokio::spawn(async move {
                let _ = reqwest::Client::new()
                    .get(&redirect_uri)
                    .query(&[("state", state.as_str()), ("error", "access_denied")])
                    .send()
                    .await;
            });
        })
        .await;

    match result {
        Err(AuthError::ConsentFailed(message)) => assert!(message.contains("access_denied")),
        other => panic!("expected denial, got {other:?}"),
    }
}
