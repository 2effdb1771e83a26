//! End-to-end OAuth flow against a mock provider, exercising only the
//! public API the way a host application would.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::IntoResponse;
use portico::{Oauth, OauthConfig, ProviderCredentials, ProviderEndpoints, RouteMap, ViewEngine};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> OauthConfig {
    let mut config = OauthConfig::default();
    config.providers.insert(
        "mockauth".to_string(),
        ProviderCredentials {
            key: "the-client-id".to_string(),
            secret: "the-client-secret".to_string(),
            display_name: Some("Mock Auth".to_string()),
            scopes: Some(vec!["identity".to_string()]),
            endpoints: Some(ProviderEndpoints {
                auth_url: format!("{}/oauth/authorize", server.uri()),
                token_url: format!("{}/oauth/token", server.uri()),
                user_info_url: format!("{}/api/me", server.uri()),
                user_mapping: None,
            }),
        },
    );
    config
}

async fn mock_provider(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("code=good-code"))
        .and(body_string_contains("code_verifier="))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "token-abc",
            "token_type": "bearer",
            "expires_in": 7200,
            "refresh_token": "refresh-xyz",
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "user-7",
            "name": "Mock User",
            "email": "mock@example.com",
        })))
        .mount(server)
        .await;
}

async fn request(router: &Router, uri: &str, cookie: Option<&str>) -> axum::response::Response {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    router
        .clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

#[tokio::test]
async fn login_round_trip() {
    let server = MockServer::start().await;
    mock_provider(&server).await;

    let auth = Oauth::new(config_for(&server)).unwrap();

    let logins = Arc::new(AtomicUsize::new(0));
    let counter = logins.clone();
    auth.success(move |user| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Some(
                (
                    StatusCode::OK,
                    format!("hello {}", user.name.as_deref().unwrap_or("stranger")),
                )
                    .into_response(),
            )
        }
    });

    let app = Router::new().merge(auth.adapt("http://app.local").unwrap());

    // begin: redirected to the provider with a session cookie set
    let begin = request(&app, "/oauth/mockauth", None).await;
    assert_eq!(begin.status(), StatusCode::TEMPORARY_REDIRECT);

    let cookie = begin.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();
    let location = begin.headers()[header::LOCATION].to_str().unwrap();
    let state = url::Url::parse(location)
        .unwrap()
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.to_string())
        .unwrap();

    // callback: the provider sends the user back with code and state
    let callback = format!("/oauth/mockauth/callback?code=good-code&state={state}");
    let done = request(&app, &callback, Some(&cookie)).await;

    assert_eq!(done.status(), StatusCode::OK);
    let body = axum::body::to_bytes(done.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"hello Mock User");
    assert_eq!(logins.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn login_page_links_through_the_shared_route_map() {
    let server = MockServer::start().await;
    let auth = Oauth::new(config_for(&server)).unwrap();
    let _app = auth.adapt("http://app.local").unwrap();

    let views = ViewEngine::new("does-not-exist", ".html").with_routes(auth.route_map());
    views
        .embedded(
            "login.html",
            "{% for name in providers %}{{ url('oauth', name) | safe }} {% endfor %}",
        )
        .unwrap();

    let rendered = views
        .render(
            "login.html",
            serde_json::json!({"providers": auth.provider_names()}),
        )
        .unwrap();

    assert_eq!(rendered.trim(), "/oauth/mockauth");
    assert_eq!(auth.url("mockauth"), "/oauth/mockauth");
}

#[tokio::test]
async fn unregistered_provider_is_rejected_end_to_end() {
    let server = MockServer::start().await;
    let auth = Oauth::new(config_for(&server)).unwrap();
    let app = auth.adapt("http://app.local").unwrap();

    let response = request(&app, "/oauth/somethingelse", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn callback_with_no_begin_is_rejected_end_to_end() {
    let server = MockServer::start().await;
    let auth = Oauth::new(config_for(&server)).unwrap();
    let app = auth.adapt("http://app.local").unwrap();

    let response = request(&app, "/oauth/mockauth/callback?code=x&state=y", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn route_map_fills_path_parameters() {
    let routes = RouteMap::new();
    routes.register("profile", "/users/{id}");

    assert_eq!(
        routes.url("profile", &["42"]),
        Some("/users/42".to_string())
    );
}
