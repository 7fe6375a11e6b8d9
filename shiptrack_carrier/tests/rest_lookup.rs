use std::{sync::Arc, time::Duration};

use futures_util::future::join_all;
use shiptrack_carrier::{
    ApiVersion, CarrierError, Cause, CredentialCache, ErrorKind, OAuthProvider, ProtocolAdapter,
    ProtocolConfig, ProtocolFailure, RestAdapter, TrackingFacade,
};
use wiremock::{
    Mock, ResponseTemplate,
    matchers::{body_string_contains, header, method, path},
};

mod support;

use support::{
    Upstream, closed_base_url, number, sample_output, token_response, tracking_ok, unauthorized,
};

const TRACK_V1: &str = "/track/v1/trackingnumbers";
const TOKEN_V1: &str = "/oauth/token";

fn adapter_with_cache(
    upstream: &Upstream,
    timeout: Duration,
) -> (RestAdapter, Arc<CredentialCache>) {
    let mut config = upstream.rest_config(ApiVersion::V1);
    config.request_timeout = timeout;
    let ProtocolConfig::Rest(rest) = config.protocol.clone() else {
        panic!("rest config expected");
    };

    let http = config.http_client().expect("http client");
    let cache = Arc::new(CredentialCache::new());
    let adapter = RestAdapter::new(
        http.clone(),
        config.base_url(),
        rest,
        Arc::new(OAuthProvider::new(http, config.base_url())),
        Arc::clone(&cache),
    );
    (adapter, cache)
}

#[tokio::test]
async fn second_lookup_reuses_cached_credential() {
    let upstream = Upstream::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_V1))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=test-api-key"))
        .and(body_string_contains("client_secret=test-secret"))
        .respond_with(token_response("tok-1"))
        .mount(&upstream.server)
        .await;
    upstream
        .mount_tracking(ApiVersion::V1, "tok-1", tracking_ok(), None)
        .await;

    let facade =
        TrackingFacade::from_config(&upstream.rest_config(ApiVersion::V1)).expect("facade");

    let first = facade.lookup(&number()).await.expect("first lookup");
    let second = facade.lookup(&number()).await.expect("second lookup");

    assert_eq!(first.raw, sample_output());
    assert_eq!(first, second);
    assert_eq!(upstream.requests_to(TOKEN_V1).await, 1);
    assert_eq!(upstream.requests_to(TRACK_V1).await, 2);
}

#[tokio::test]
async fn tracking_request_carries_identifier_and_scan_flag() {
    let upstream = Upstream::start().await;
    upstream.mount_tokens(ApiVersion::V1, &["tok-1"]).await;
    Mock::given(method("POST"))
        .and(path(TRACK_V1))
        .and(header("content-type", "application/json"))
        .and(body_string_contains("\"trackingNumber\":\"122816215025810\""))
        .and(body_string_contains("\"includeDetailedScans\":true"))
        .respond_with(tracking_ok())
        .mount(&upstream.server)
        .await;

    let facade =
        TrackingFacade::from_config(&upstream.rest_config(ApiVersion::V1)).expect("facade");

    facade.lookup(&number()).await.expect("lookup");
}

#[tokio::test]
async fn cold_credential_rejection_fails_without_retry() {
    let upstream = Upstream::start().await;
    upstream.mount_tokens(ApiVersion::V1, &["tok-1", "tok-2"]).await;
    upstream
        .mount_tracking(ApiVersion::V1, "tok-1", unauthorized(), None)
        .await;

    let facade =
        TrackingFacade::from_config(&upstream.rest_config(ApiVersion::V1)).expect("facade");

    let err = facade.lookup(&number()).await.expect_err("cold 401");

    assert_eq!(err.kind(), ErrorKind::Auth);
    assert!(matches!(err.cause(), Cause::Status { status: 401, .. }));
    assert_eq!(upstream.requests_to(TOKEN_V1).await, 1);
    assert_eq!(upstream.requests_to(TRACK_V1).await, 1);
}

#[tokio::test]
async fn stale_credential_is_refreshed_and_retried_once() {
    let upstream = Upstream::start().await;
    upstream.mount_tokens(ApiVersion::V1, &["tok-1", "tok-2"]).await;
    upstream
        .mount_tracking(ApiVersion::V1, "tok-1", tracking_ok(), Some(1))
        .await;
    upstream
        .mount_tracking(ApiVersion::V1, "tok-1", unauthorized(), None)
        .await;
    upstream
        .mount_tracking(ApiVersion::V1, "tok-2", tracking_ok(), None)
        .await;

    let (adapter, cache) = adapter_with_cache(&upstream, Duration::from_secs(5));

    adapter.lookup(&number()).await.expect("warm-up lookup");
    let result = adapter
        .lookup(&number())
        .await
        .expect("lookup after refresh");

    assert_eq!(result.raw, sample_output());
    assert!(cache.is_populated());
    assert_eq!(upstream.requests_to(TOKEN_V1).await, 2);
    assert_eq!(upstream.requests_to(TRACK_V1).await, 3);

    adapter.lookup(&number()).await.expect("refreshed credential is reused");
    assert_eq!(upstream.requests_to(TOKEN_V1).await, 2);
}

#[tokio::test]
async fn rejection_after_refresh_is_auth_error() {
    let upstream = Upstream::start().await;
    upstream
        .mount_tokens(ApiVersion::V1, &["tok-1", "tok-2", "tok-3"])
        .await;
    upstream
        .mount_tracking(ApiVersion::V1, "tok-1", tracking_ok(), Some(1))
        .await;
    upstream
        .mount_tracking(ApiVersion::V1, "tok-1", unauthorized(), None)
        .await;
    upstream
        .mount_tracking(ApiVersion::V1, "tok-2", unauthorized(), None)
        .await;

    let facade =
        TrackingFacade::from_config(&upstream.rest_config(ApiVersion::V1)).expect("facade");

    facade.lookup(&number()).await.expect("warm-up lookup");
    let err = facade.lookup(&number()).await.expect_err("401 after refresh");

    assert_eq!(err.kind(), ErrorKind::Auth);
    assert_eq!(err.message(), "credential rejected again after refresh");
    assert_eq!(upstream.requests_to(TOKEN_V1).await, 2);
    assert_eq!(upstream.requests_to(TRACK_V1).await, 3);
}

#[tokio::test]
async fn concurrent_lookups_share_one_authentication() {
    let upstream = Upstream::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_V1))
        .respond_with(token_response("tok-1").set_delay(Duration::from_millis(150)))
        .mount(&upstream.server)
        .await;
    upstream
        .mount_tracking(ApiVersion::V1, "tok-1", tracking_ok(), None)
        .await;

    let facade =
        TrackingFacade::from_config(&upstream.rest_config(ApiVersion::V1)).expect("facade");
    let number = number();

    let results = join_all((0..12).map(|_| facade.lookup(&number))).await;

    for result in results {
        assert_eq!(result.expect("lookup").raw, sample_output());
    }
    assert_eq!(upstream.requests_to(TOKEN_V1).await, 1);
    assert_eq!(upstream.requests_to(TRACK_V1).await, 12);
}

#[tokio::test]
async fn concurrent_cold_lookups_fail_without_retry() {
    let upstream = Upstream::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_V1))
        .respond_with(token_response("tok-1").set_delay(Duration::from_millis(150)))
        .mount(&upstream.server)
        .await;
    Mock::given(method("POST"))
        .and(path(TRACK_V1))
        .respond_with(unauthorized())
        .mount(&upstream.server)
        .await;

    let facade =
        TrackingFacade::from_config(&upstream.rest_config(ApiVersion::V1)).expect("facade");
    let number = number();

    let results = join_all((0..4).map(|_| facade.lookup(&number))).await;

    for result in results {
        let err = result.expect_err("fresh credential rejected");
        assert_eq!(err.kind(), ErrorKind::Auth);
        assert_eq!(err.message(), "freshly issued credential was rejected");
    }
    assert_eq!(upstream.requests_to(TOKEN_V1).await, 1);
    assert_eq!(upstream.requests_to(TRACK_V1).await, 4);
}

#[tokio::test]
async fn concurrent_rejections_of_stale_credential_refresh_once() {
    let upstream = Upstream::start().await;
    upstream.mount_tokens(ApiVersion::V1, &["tok-1"]).await;
    Mock::given(method("POST"))
        .and(path(TOKEN_V1))
        .respond_with(token_response("tok-2").set_delay(Duration::from_millis(100)))
        .mount(&upstream.server)
        .await;
    upstream
        .mount_tracking(ApiVersion::V1, "tok-1", tracking_ok(), Some(1))
        .await;
    upstream
        .mount_tracking(ApiVersion::V1, "tok-1", unauthorized(), None)
        .await;
    upstream
        .mount_tracking(ApiVersion::V1, "tok-2", tracking_ok(), None)
        .await;

    let facade =
        TrackingFacade::from_config(&upstream.rest_config(ApiVersion::V1)).expect("facade");
    let number = number();
    facade.lookup(&number).await.expect("warm-up lookup");

    let results = join_all((0..6).map(|_| facade.lookup(&number))).await;

    assert!(results.iter().all(Result::is_ok));
    assert_eq!(upstream.requests_to(TOKEN_V1).await, 2);
}

#[tokio::test]
async fn missing_output_is_upstream_protocol_error() {
    let upstream = Upstream::start().await;
    upstream.mount_tokens(ApiVersion::V1, &["tok-1"]).await;
    upstream
        .mount_tracking(
            ApiVersion::V1,
            "tok-1",
            ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "transactionId": "t-1",
                "errors": []
            })),
            None,
        )
        .await;

    let facade =
        TrackingFacade::from_config(&upstream.rest_config(ApiVersion::V1)).expect("facade");

    let err = facade.lookup(&number()).await.expect_err("no output");

    assert!(matches!(
        err,
        CarrierError::UpstreamProtocol {
            kind: ProtocolFailure::MissingField,
            ..
        }
    ));
}

#[tokio::test]
async fn server_error_is_transport_error() {
    let upstream = Upstream::start().await;
    upstream.mount_tokens(ApiVersion::V1, &["tok-1"]).await;
    upstream
        .mount_tracking(
            ApiVersion::V1,
            "tok-1",
            ResponseTemplate::new(503).set_body_string("maintenance"),
            None,
        )
        .await;

    let facade =
        TrackingFacade::from_config(&upstream.rest_config(ApiVersion::V1)).expect("facade");

    let err = facade.lookup(&number()).await.expect_err("503");

    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(matches!(err.cause(), Cause::Status { status: 503, body } if body == "maintenance"));
    assert_eq!(upstream.requests_to(TOKEN_V1).await, 1);
}

#[tokio::test]
async fn rejected_api_keys_fail_before_tracking() {
    let upstream = Upstream::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_V1))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
        .mount(&upstream.server)
        .await;

    let (adapter, cache) = adapter_with_cache(&upstream, Duration::from_secs(5));

    let err = adapter.lookup(&number()).await.expect_err("bad keys");

    assert_eq!(err.kind(), ErrorKind::Auth);
    assert!(!cache.is_populated());
    assert_eq!(upstream.requests_to(TRACK_V1).await, 0);
}

#[tokio::test]
async fn timed_out_authentication_leaves_cache_empty() {
    let upstream = Upstream::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_V1))
        .respond_with(token_response("tok-1").set_delay(Duration::from_secs(2)))
        .mount(&upstream.server)
        .await;

    let (adapter, cache) = adapter_with_cache(&upstream, Duration::from_millis(200));

    let err = adapter.lookup(&number()).await.expect_err("auth timeout");

    assert_eq!(err.kind(), ErrorKind::Auth);
    assert!(matches!(err.cause(), Cause::Http(inner) if inner.is_timeout()));
    assert!(!cache.is_populated());
}

#[tokio::test]
async fn timed_out_tracking_call_is_transport_error() {
    let upstream = Upstream::start().await;
    upstream.mount_tokens(ApiVersion::V1, &["tok-1"]).await;
    upstream
        .mount_tracking(
            ApiVersion::V1,
            "tok-1",
            tracking_ok().set_delay(Duration::from_secs(2)),
            None,
        )
        .await;

    let (adapter, cache) = adapter_with_cache(&upstream, Duration::from_millis(200));

    let err = adapter.lookup(&number()).await.expect_err("tracking timeout");

    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(cache.is_populated());
}

#[tokio::test]
async fn v2_uses_v2_endpoints() {
    let upstream = Upstream::start().await;
    upstream.mount_tokens(ApiVersion::V2, &["tok-v2"]).await;
    Mock::given(method("POST"))
        .and(path("/track/v2/shipments"))
        .and(header("Authorization", "Bearer tok-v2"))
        .and(body_string_contains("\"trackNumberInfo\""))
        .respond_with(tracking_ok())
        .mount(&upstream.server)
        .await;

    let facade =
        TrackingFacade::from_config(&upstream.rest_config(ApiVersion::V2)).expect("facade");

    let result = facade.lookup(&number()).await.expect("v2 lookup");

    assert_eq!(result.raw, sample_output());
    assert_eq!(upstream.requests_to("/auth/oauth/v2/token").await, 1);
}

#[tokio::test]
async fn unreachable_service_fails_during_authentication() {
    let upstream = Upstream::start().await;
    let mut config = upstream.rest_config(ApiVersion::V1);
    config.base_url = closed_base_url();

    let facade = TrackingFacade::from_config(&config).expect("facade");

    let err = facade.lookup(&number()).await.expect_err("nothing listening");

    assert_eq!(err.kind(), ErrorKind::Auth);
    assert!(matches!(err.cause(), Cause::Http(inner) if inner.is_connect()));
}
