mod common;
use common::{credential_manager, settings_for, settings_with, token_response, ManualClock, TOKEN_PATH};

use d365_gateway::errors::GatewayError;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn cached_token_is_reused_without_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(token_response("T1", 3600))
        .expect(1)
        .mount(&server)
        .await;

    let clock = ManualClock::new();
    let manager = credential_manager(settings_for(&server), clock.clone());

    assert_eq!(manager.get_token().await.unwrap(), "T1");
    clock.advance_secs(1200);
    assert_eq!(manager.get_token().await.unwrap(), "T1");
}

#[tokio::test]
async fn token_refreshes_only_after_buffered_expiry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(token_response("T1", 3600))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(token_response("T2", 3600))
        .expect(1)
        .mount(&server)
        .await;

    let clock = ManualClock::new();
    let manager = credential_manager(settings_for(&server), clock.clone());

    assert_eq!(manager.get_token().await.unwrap(), "T1");
    let expiry = manager.cached_expiry().await.expect("cached");
    assert_eq!(expiry, clock_now(&clock) + chrono::Duration::seconds(3540));

    clock.advance_secs(3539);
    assert_eq!(manager.get_token().await.unwrap(), "T1");

    clock.advance_secs(2);
    assert_eq!(manager.get_token().await.unwrap(), "T2");
    assert_eq!(manager.get_token().await.unwrap(), "T2");
}

fn clock_now(clock: &ManualClock) -> chrono::DateTime<chrono::Utc> {
    use d365_gateway::services::credentials::Clock;
    clock.now()
}

#[tokio::test]
async fn grant_request_carries_client_credentials_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=client-123"))
        .and(body_string_contains("client_secret=s3cret"))
        .and(body_string_contains("resource=http"))
        .respond_with(token_response("T1", 3600))
        .expect(1)
        .mount(&server)
        .await;

    let manager = credential_manager(settings_for(&server), ManualClock::new());
    assert_eq!(manager.get_token().await.unwrap(), "T1");
}

#[tokio::test]
async fn missing_configuration_fails_before_any_request() {
    let server = MockServer::start().await;
    let settings = settings_with(&server, &[("CLIENT_SECRET", None), ("TENANT_ID", None)]);
    let manager = credential_manager(settings, ManualClock::new());

    let err = manager.get_token().await.unwrap_err();
    match err {
        GatewayError::Configuration { missing } => {
            assert_eq!(missing, vec!["TENANT_ID", "CLIENT_SECRET"]);
        }
        other => panic!("expected configuration error, got {:?}", other),
    }
    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests.is_empty(), "no network call expected");
}

#[tokio::test]
async fn rejected_grant_surfaces_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(
            ResponseTemplate::new(401).set_body_string(r#"{"error":"invalid_client"}"#),
        )
        .expect(2)
        .mount(&server)
        .await;

    let manager = credential_manager(settings_for(&server), ManualClock::new());
    let err = manager.get_token().await.unwrap_err();
    match &err {
        GatewayError::Auth { status, body } => {
            assert_eq!(*status, Some(401));
            assert!(body.contains("invalid_client"));
        }
        other => panic!("expected auth error, got {:?}", other),
    }
    assert!(err.to_string().starts_with("Failed to fetch auth token: 401"));

    // Failures are not cached; the next call tries again.
    assert!(manager.get_token().await.is_err());
}

#[tokio::test]
async fn token_without_access_token_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "expires_in": 3600
        })))
        .mount(&server)
        .await;

    let manager = credential_manager(settings_for(&server), ManualClock::new());
    let err = manager.get_token().await.unwrap_err();
    assert!(err.to_string().contains("access_token"));
    assert!(manager.cached_expiry().await.is_none());
}

#[tokio::test]
async fn out_of_range_lifetime_is_an_error_not_a_panic() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "T",
            "expires_in": i64::MAX
        })))
        .mount(&server)
        .await;

    let manager = credential_manager(settings_for(&server), ManualClock::new());
    let err = manager.get_token().await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Token response has out-of-range expires_in"
    );
    assert!(manager.cached_expiry().await.is_none());
    // The cache lock is released, so a later call fails the same way.
    assert!(manager.get_token().await.is_err());
}

#[tokio::test]
async fn invalidate_forces_a_new_grant() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(token_response("T1", 3600))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(token_response("T2", 3600))
        .mount(&server)
        .await;

    let manager = credential_manager(settings_for(&server), ManualClock::new());
    assert_eq!(manager.get_token().await.unwrap(), "T1");

    // A stale rejection must not evict a different token.
    manager.invalidate_token("T0").await;
    assert_eq!(manager.get_token().await.unwrap(), "T1");

    manager.invalidate().await;
    assert_eq!(manager.get_token().await.unwrap(), "T2");
}

#[tokio::test]
async fn concurrent_callers_share_one_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(token_response("T1", 3600).set_delay(Duration::from_millis(150)))
        .expect(1)
        .mount(&server)
        .await;

    let manager = credential_manager(settings_for(&server), ManualClock::new());
    let (a, b, c) = tokio::join!(manager.get_token(), manager.get_token(), manager.get_token());
    assert_eq!(a.unwrap(), "T1");
    assert_eq!(b.unwrap(), "T1");
    assert_eq!(c.unwrap(), "T1");
}
