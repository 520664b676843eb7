//! Shared utilities for integration testing.
//!
//! Mock identity and words services run on ephemeral ports; the gateway
//! under test runs the real `HttpServer` over an in-memory store.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use lingo_gateway::auth::verifier::{issue_token, verify, UserClaims};
use lingo_gateway::store::{
    ExperienceRecord, ExperienceStore, InMemoryExperienceStore, StoreError,
};
use lingo_gateway::{GatewayConfig, HttpServer, Shutdown};

pub const SECRET: &str = "integration-secret";

/// Body the mock words service answers for word 42.
pub const WORD_42: &str = r#"{"id":42,"text":"hello"}"#;

/// Identity ids are derived from usernames so tests can predict them.
pub fn user_id_for(username: &str) -> String {
    format!("id-{username}")
}

pub fn token_for(user_id: &str) -> String {
    issue_token(&UserClaims::new(user_id), SECRET).unwrap()
}

pub fn bearer(user_id: &str) -> String {
    format!("Bearer {}", token_for(user_id))
}

/// Serve `router` on an ephemeral port and return its base URL.
pub async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{addr}")
}

fn caller(headers: &HeaderMap) -> Option<String> {
    let token = headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?;
    verify(token, SECRET).ok().map(|claims| claims.user_id)
}

async fn identity_signup(Json(body): Json<Value>) -> Response {
    let username = body["username"].as_str().unwrap_or_default();
    if username.is_empty() || username == "taken" {
        return (StatusCode::OK, Json(json!({ "signup": false }))).into_response();
    }
    let token = token_for(&user_id_for(username));
    (StatusCode::CREATED, Json(json!({ "signup": true, "token": token }))).into_response()
}

async fn identity_login(Json(body): Json<Value>) -> Response {
    if body["password"] == "wrong" {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "INVALID_PASSWORD" })),
        )
            .into_response();
    }
    let username = body["username"].as_str().unwrap_or_default();
    Json(json!({ "token": token_for(&user_id_for(username)) })).into_response()
}

async fn identity_profile(headers: HeaderMap) -> Response {
    match caller(&headers) {
        // Known account that the identity service no longer has data for.
        Some(id) if id == "ghost" => (
            [(CONTENT_TYPE, "application/json")],
            "null",
        )
            .into_response(),
        Some(id) => Json(json!({ "_id": id, "username": "learner" })).into_response(),
        None => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn identity_update(headers: HeaderMap, Json(patch): Json<Value>) -> Response {
    let Some(id) = caller(&headers) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    let mut profile = json!({ "_id": id, "username": "learner" });
    if let (Some(fields), Some(changes)) = (profile.as_object_mut(), patch.as_object()) {
        for (key, value) in changes {
            fields.insert(key.clone(), value.clone());
        }
    }
    Json(profile).into_response()
}

async fn identity_delete(headers: HeaderMap) -> StatusCode {
    match caller(&headers) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::UNAUTHORIZED,
    }
}

pub fn identity_router() -> Router {
    Router::new()
        .route("/user/signup", post(identity_signup))
        .route("/user/login", post(identity_login))
        .route(
            "/user",
            get(identity_profile)
                .patch(identity_update)
                .delete(identity_delete),
        )
}

async fn list_words(State(calls): State<Arc<AtomicU32>>) -> Json<Value> {
    calls.fetch_add(1, Ordering::SeqCst);
    Json(json!([{ "id": 1, "text": "hola" }, { "id": 42, "text": "hello" }]))
}

async fn get_word(State(calls): State<Arc<AtomicU32>>, Path(id): Path<String>) -> Response {
    calls.fetch_add(1, Ordering::SeqCst);
    match id.as_str() {
        "42" => ([(CONTENT_TYPE, "application/json")], WORD_42).into_response(),
        "boom" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "WORD_NOT_FOUND" })),
        )
            .into_response(),
    }
}

pub fn words_router(calls: Arc<AtomicU32>) -> Router {
    Router::new()
        .route("/words", get(list_words))
        .route("/words/{id}", get(get_word))
        .with_state(calls)
}

pub fn gateway_config(identity_url: &str, words_url: &str) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.api.version = "v1".into();
    config.auth.secret = SECRET.into();
    config.services.identity_url = identity_url.into();
    config.services.words_url = words_url.into();
    config.database.host = "unused".into();
    config.database.user = "unused".into();
    config.database.name = "unused".into();
    config.database.password = Some(String::new());
    config.timeouts.upstream_secs = 5;
    config
}

/// Driver text the unavailable store fails with; must never reach a client.
pub const STORE_FAILURE: &str = "Access denied for user 'lingo'@'10.0.0.3'";

/// Store whose every operation fails as if the database were unreachable.
pub struct UnavailableStore;

#[async_trait]
impl ExperienceStore for UnavailableStore {
    async fn get(&self, _user_id: &str) -> Result<ExperienceRecord, StoreError> {
        Err(StoreError::unavailable(STORE_FAILURE))
    }

    async fn create(&self, _user_id: &str) -> Result<ExperienceRecord, StoreError> {
        Err(StoreError::unavailable(STORE_FAILURE))
    }

    async fn increment_by_ten(&self, _user_id: &str) -> Result<ExperienceRecord, StoreError> {
        Err(StoreError::unavailable(STORE_FAILURE))
    }

    async fn delete(&self, _user_id: &str) -> Result<(), StoreError> {
        Err(StoreError::unavailable(STORE_FAILURE))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError::unavailable(STORE_FAILURE))
    }
}

/// Run the real server over `store` and return its base URL.
pub async fn launch(config: GatewayConfig, store: Arc<dyn ExperienceStore>) -> (String, Shutdown) {
    let server = HttpServer::new(config, store).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, receiver).await;
    });

    (format!("http://{addr}"), shutdown)
}

fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// A running gateway wired to the mock services.
pub struct TestGateway {
    pub base: String,
    pub api: String,
    pub store: Arc<InMemoryExperienceStore>,
    pub words_calls: Arc<AtomicU32>,
    pub client: reqwest::Client,
    shutdown: Shutdown,
}

impl TestGateway {
    pub async fn start() -> Self {
        let identity_url = serve(identity_router()).await;
        let words_calls = Arc::new(AtomicU32::new(0));
        let words_url = serve(words_router(words_calls.clone())).await;
        Self::start_with(gateway_config(&identity_url, &words_url), words_calls).await
    }

    pub async fn start_with(config: GatewayConfig, words_calls: Arc<AtomicU32>) -> Self {
        let store = Arc::new(InMemoryExperienceStore::new());
        let (base, shutdown) = launch(config, store.clone()).await;
        Self {
            api: format!("{base}/api/v1"),
            base,
            store,
            words_calls,
            client: client(),
            shutdown,
        }
    }

    pub fn words_calls(&self) -> u32 {
        self.words_calls.load(Ordering::SeqCst)
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// A gateway wired to the mock services over [`UnavailableStore`].
pub struct StorelessGateway {
    pub api: String,
    pub client: reqwest::Client,
    shutdown: Shutdown,
}

impl StorelessGateway {
    pub async fn start() -> Self {
        let identity_url = serve(identity_router()).await;
        let words_url = serve(words_router(Arc::new(AtomicU32::new(0)))).await;
        let config = gateway_config(&identity_url, &words_url);
        let (base, shutdown) = launch(config, Arc::new(UnavailableStore)).await;
        Self {
            api: format!("{base}/api/v1"),
            client: client(),
            shutdown,
        }
    }
}

impl Drop for StorelessGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}
