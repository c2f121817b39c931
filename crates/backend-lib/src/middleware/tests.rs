// ==========
// crates/backend-lib/src/middleware/tests.rs
// ==========
//! Tests for the access guard.
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    http::{header::AUTHORIZATION, HeaderMap, HeaderValue, Request, StatusCode},
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use tower::ServiceExt;

use super::{auth::bearer_token, require_auth, CurrentUser};
use crate::auth::{JwtIssuer, TokenIssuer};
use crate::models::NewUser;
use crate::storage::{MemoryStorage, UserStore};
use crate::AppState;

const SECRET: &[u8] = b"middleware-secret";

async fn whoami(CurrentUser(user): CurrentUser) -> String {
    user.email
}

async fn app() -> (Router, Arc<JwtIssuer>, u64) {
    let storage = MemoryStorage::new();
    let user = storage
        .create_user(NewUser {
            email: "foo@baz.com".to_string(),
            hash: "hash".to_string(),
        })
        .await
        .unwrap();

    let tokens = Arc::new(JwtIssuer::new(SECRET, Duration::from_secs(60)));
    let state = Arc::new(AppState::with_token_issuer(storage, tokens.clone()));
    let router = Router::new()
        .route("/whoami", get(whoami))
        .route_layer(from_fn_with_state(state.clone(), require_auth::<MemoryStorage>))
        .with_state(state);
    (router, tokens, user.id)
}

async fn call(app: &Router, authorization: Option<&str>) -> StatusCode {
    let mut builder = Request::builder().uri("/whoami");
    if let Some(value) = authorization {
        builder = builder.header(AUTHORIZATION, value);
    }
    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
        .status()
}

#[test]
fn test_bearer_token_parsing() {
    let mut headers = HeaderMap::new();
    assert!(bearer_token(&headers).is_err());

    headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
    assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");

    headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer abc"));
    assert_eq!(bearer_token(&headers).unwrap(), "abc");

    headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJheg=="));
    assert!(bearer_token(&headers).is_err());

    headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
    assert!(bearer_token(&headers).is_err());

    headers.insert(AUTHORIZATION, HeaderValue::from_static("abc.def.ghi"));
    assert!(bearer_token(&headers).is_err());
}

#[tokio::test]
async fn test_valid_token_binds_user() {
    let (app, tokens, user_id) = app().await;
    let token = tokens.issue(user_id, "foo@baz.com").unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/whoami")
                .header(AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"foo@baz.com");
}

#[tokio::test]
async fn test_missing_or_malformed_token_is_rejected() {
    let (app, _, _) = app().await;
    assert_eq!(call(&app, None).await, StatusCode::UNAUTHORIZED);
    assert_eq!(call(&app, Some("Bearer nonsense")).await, StatusCode::UNAUTHORIZED);
    assert_eq!(call(&app, Some("Token abc")).await, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let (app, tokens, user_id) = app().await;
    let hour_ago = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
        - 3600;
    let token = tokens.issue_at(user_id, "foo@baz.com", hour_ago).unwrap();
    let header = format!("Bearer {token}");
    assert_eq!(call(&app, Some(&header)).await, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_from_other_secret_is_rejected() {
    let (app, _, user_id) = app().await;
    let forged = JwtIssuer::new(b"forged", Duration::from_secs(60))
        .issue(user_id, "foo@baz.com")
        .unwrap();
    let header = format!("Bearer {forged}");
    assert_eq!(call(&app, Some(&header)).await, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_for_unknown_user_is_rejected() {
    let (app, tokens, _) = app().await;
    let token = tokens.issue(999, "ghost@baz.com").unwrap();
    let header = format!("Bearer {token}");
    assert_eq!(call(&app, Some(&header)).await, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_extractor_without_guard_is_unauthorized() {
    let app: Router = Router::new().route("/whoami", get(whoami));
    assert_eq!(call(&app, None).await, StatusCode::UNAUTHORIZED);
}
