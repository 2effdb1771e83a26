//! Tests for session

use super::*;
use axum::http::HeaderValue;
use chrono::{Duration, Utc};

#[tokio::test]
async fn test_create_session() {
    let store = SessionStore::new();
    let session = store.create_session(Duration::hours(1));

    assert!(!session.id.is_empty());
    assert!(session.expires_at > Utc::now());
}

#[tokio::test]
async fn test_get_session() {
    let store = SessionStore::new();
    let session = store.create_session(Duration::hours(1));

    let retrieved = store.get_session(&session.id);
    assert!(retrieved.is_some());
    assert_eq!(retrieved.unwrap().id, session.id);
}

#[tokio::test]
async fn test_expired_session_dropped_on_read() {
    let store = SessionStore::new();
    let session = store.create_session(Duration::seconds(-1));

    assert!(store.get_session(&session.id).is_none());
}

#[tokio::test]
async fn test_set_and_take_value() {
    let store = SessionStore::new();
    let session = store.create_session(Duration::hours(1));

    assert!(store.set_value(&session.id, "key", serde_json::json!("value")));

    let retrieved = store.get_session(&session.id).unwrap();
    assert_eq!(
        retrieved.data.get("key").unwrap(),
        &serde_json::json!("value")
    );

    let taken = store.take_value(&session.id, "key");
    assert_eq!(taken, Some(serde_json::json!("value")));
    assert!(store.take_value(&session.id, "key").is_none());
}

#[tokio::test]
async fn test_set_value_unknown_session() {
    let store = SessionStore::new();
    assert!(!store.set_value("missing", "key", serde_json::json!(1)));
}

#[tokio::test]
async fn test_delete_session() {
    let store = SessionStore::new();
    let session = store.create_session(Duration::hours(1));

    store.delete_session(&session.id);

    assert!(store.get_session(&session.id).is_none());
}

#[tokio::test]
async fn test_session_id_from_headers() {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::COOKIE,
        HeaderValue::from_static("theme=dark; portico_session=abc123; lang=en"),
    );

    assert_eq!(
        SessionStore::session_id_from_headers(&headers),
        Some("abc123".to_string())
    );

    let empty = HeaderMap::new();
    assert!(SessionStore::session_id_from_headers(&empty).is_none());
}

#[test]
fn test_cookie_flags() {
    let cookie = set_session_cookie("abc", Utc::now() + Duration::hours(1), false);
    assert!(cookie.starts_with("portico_session=abc;"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(!cookie.contains("Secure"));

    let secure = set_session_cookie("abc", Utc::now(), true);
    assert!(secure.contains("Secure"));

    let cleared = clear_session_cookie(false);
    assert!(cleared.contains("Max-Age=0"));
}
