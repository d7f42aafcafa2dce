//! End-to-end authorization-code flow through the HTTP front against an
//! in-process provider.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;
use url::Url;

use common::{MockProvider, CLIENT_ID};
use oidc_test_client::server::{router, AppState};
use oidc_test_client::session::SessionKey;
use oidc_test_client::{client_config, OidcTestClient};

async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response {
    let mut request = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

fn header_str<'a>(response: &'a Response, name: header::HeaderName) -> &'a str {
    response.headers().get(name).unwrap().to_str().unwrap()
}

/// Start a flow and return the session cookie and the issued state.
async fn start_flow(app: &Router) -> (String, String) {
    let response = get(app, "/", None).await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let location = Url::parse(header_str(&response, header::LOCATION)).unwrap();
    let state = location
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .unwrap();
    let cookie = header_str(&response, header::SET_COOKIE)
        .split(';')
        .next()
        .unwrap()
        .to_string();

    (cookie, state)
}

async fn json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn app_for(client: &OidcTestClient) -> Router {
    router(AppState::new(client, SessionKey::generate()), "static")
}

#[tokio::test]
async fn test_full_flow_produces_report() {
    let provider = MockProvider::start().await;
    provider.mount_code_exchange("alice").await;
    provider.mount_refresh("alice").await;
    provider.mount_user_info("alice").await;
    provider.mount_introspection().await;

    let client = OidcTestClient::connect(provider.client_config())
        .await
        .unwrap();
    let app = app_for(&client).await;

    let (cookie, state) = start_flow(&app).await;
    let response = get(
        &app,
        &format!("/auth/callback?code=the-code&state={}", state),
        Some(&cookie),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        header_str(&response, header::CONTENT_TYPE),
        "application/json"
    );

    let report = json_body(response).await;
    assert_eq!(report["OAuth2Token"]["access_token"], "access-1");
    assert_eq!(report["OAuth2Token"]["refresh_token"], "refresh-1");
    assert_eq!(report["IDTokenClaims"]["sub"], "alice");
    assert_eq!(report["IDTokenClaims"]["aud"], CLIENT_ID);
    assert_eq!(report["UserInfo"]["email"], "alice@example.com");
    assert_eq!(report["Introspection"]["active"], true);
    assert_eq!(report["Refresh"]["access_token"], "access-2");
    // The refresh response omitted refresh_token; the previous one carries over.
    assert_eq!(report["Refresh"]["refresh_token"], "refresh-1");
    assert_eq!(report["RefreshIDToken"]["sub"], "alice");
    assert_eq!(report["Checks"]["UserInfo"]["status"], "completed");
    assert_eq!(report["Checks"]["Introspection"]["status"], "completed");
    assert_eq!(report["Checks"]["Refresh"]["status"], "completed");
}

#[tokio::test]
async fn test_state_cannot_be_replayed() {
    let provider = MockProvider::start().await;
    provider.mount_code_exchange("alice").await;
    provider.mount_refresh("alice").await;
    provider.mount_user_info("alice").await;
    provider.mount_introspection().await;

    let client = OidcTestClient::connect(provider.client_config())
        .await
        .unwrap();
    let app = app_for(&client).await;

    let (cookie, state) = start_flow(&app).await;
    let callback = format!("/auth/callback?code=the-code&state={}", state);

    let first = get(&app, &callback, Some(&cookie)).await;
    assert_eq!(first.status(), StatusCode::OK);

    // Replaying the original cookie with the same state is rejected.
    let replay = get(&app, &callback, Some(&cookie)).await;
    assert_eq!(replay.status(), StatusCode::FOUND);
    assert_eq!(header_str(&replay, header::LOCATION), "/");
}

#[tokio::test]
async fn test_forged_callback_does_not_cancel_login() {
    let provider = MockProvider::start().await;
    provider.mount_code_exchange("carol").await;
    provider.mount_refresh("carol").await;
    provider.mount_user_info("carol").await;
    provider.mount_introspection().await;

    let client = OidcTestClient::connect(provider.client_config())
        .await
        .unwrap();
    let app = app_for(&client).await;

    let (cookie, state) = start_flow(&app).await;

    let forged = get(&app, "/auth/callback?code=x&state=junk", Some(&cookie)).await;
    assert_eq!(forged.status(), StatusCode::FOUND);
    assert!(forged.headers().get(header::SET_COOKIE).is_none());

    let response = get(
        &app,
        &format!("/auth/callback?code=the-code&state={}", state),
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["IDTokenClaims"]["sub"], "carol");
}

#[tokio::test]
async fn test_disabled_stages_are_reported() {
    let provider = MockProvider::start().await;
    provider.mount_code_exchange("bob").await;

    let config = client_config()
        .client_id(CLIENT_ID)
        .client_secret(common::CLIENT_SECRET)
        .provider_url(provider.issuer())
        .root_url(common::ROOT_URL)
        .user_info_check(false)
        .introspection_check(false)
        .refresh_check(false)
        .build()
        .unwrap();
    let client = OidcTestClient::connect(config).await.unwrap();
    let app = app_for(&client).await;

    let (cookie, state) = start_flow(&app).await;
    let response = get(
        &app,
        &format!("/auth/callback?code=the-code&state={}", state),
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let report = json_body(response).await;
    assert_eq!(report["IDTokenClaims"]["sub"], "bob");
    assert!(report.get("UserInfo").is_none());
    assert!(report.get("Introspection").is_none());
    assert!(report.get("Refresh").is_none());
    assert_eq!(report["Checks"]["UserInfo"]["status"], "disabled");
    assert_eq!(report["Checks"]["Refresh"]["status"], "disabled");
}

#[tokio::test]
async fn test_failed_exchange_redirects_to_start() {
    let provider = MockProvider::start().await;
    wiremock::Mock::given(wiremock::matchers::path("/token"))
        .respond_with(
            wiremock::ResponseTemplate::new(400)
                .set_body_json(serde_json::json!({"error": "invalid_grant"})),
        )
        .mount(&provider.server)
        .await;

    let client = OidcTestClient::connect(provider.client_config())
        .await
        .unwrap();
    let app = app_for(&client).await;

    let (cookie, state) = start_flow(&app).await;
    let response = get(
        &app,
        &format!("/auth/callback?code=stale&state={}", state),
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(header_str(&response, header::LOCATION), "/");
}

#[tokio::test]
async fn test_issuer_mismatch_fails_discovery() {
    let server = wiremock::MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::path("/.well-known/openid-configuration"))
        .respond_with(
            wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "issuer": "https://someone-else.example.com",
                "authorization_endpoint": "https://someone-else.example.com/authorize",
                "token_endpoint": "https://someone-else.example.com/token"
            })),
        )
        .mount(&server)
        .await;

    let config = client_config()
        .client_id(CLIENT_ID)
        .provider_url(server.uri())
        .build()
        .unwrap();
    assert!(OidcTestClient::connect(config).await.is_err());
}
