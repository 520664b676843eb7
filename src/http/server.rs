//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the shared `AppState` (verifier, store, delegates)
//! - Wire up middleware (request ID, tracing, timeout, body limit, CORS, metrics)
//! - Serve on a listener until the shutdown signal fires

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{Request, State},
    http::Request as HttpRequest,
    middleware::{self, Next},
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer, limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer,
};

use crate::auth::CredentialVerifier;
use crate::config::GatewayConfig;
use crate::delegates::{
    AuthDelegate, UpstreamClient, UpstreamError, WordsDelegate, IDENTITY_SERVICE, WORDS_SERVICE,
};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, RequestIdExt};
use crate::observability::metrics;
use crate::routing::{api_prefix, build_routes, RouteGroup};
use crate::store::ExperienceStore;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub api_prefix: Arc<str>,
    pub verifier: Arc<CredentialVerifier>,
    pub store: Arc<dyn ExperienceStore>,
    pub auth: AuthDelegate,
    pub words: WordsDelegate,
}

impl AppState {
    pub fn new(
        config: GatewayConfig,
        store: Arc<dyn ExperienceStore>,
    ) -> Result<Self, UpstreamError> {
        let verifier = Arc::new(CredentialVerifier::new(&config.auth.secret));
        let identity = UpstreamClient::new(
            IDENTITY_SERVICE,
            &config.services.identity_url,
            &config.timeouts,
        )?;
        let words_client =
            UpstreamClient::new(WORDS_SERVICE, &config.services.words_url, &config.timeouts)?;

        let auth = AuthDelegate::new(identity, store.clone(), verifier.clone());
        let words = WordsDelegate::new(auth.clone(), words_client);

        Ok(Self {
            api_prefix: api_prefix(&config.api.version).into(),
            config: Arc::new(config),
            verifier,
            store,
            auth,
            words,
        })
    }
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: Arc<GatewayConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and store.
    pub fn new(
        config: GatewayConfig,
        store: Arc<dyn ExperienceStore>,
    ) -> Result<Self, UpstreamError> {
        let state = AppState::new(config, store)?;
        let config = state.config.clone();
        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let metrics_layer = middleware::from_fn_with_state(state.clone(), track_requests);

        build_routes(state).layer(metrics_layer).layer(
            ServiceBuilder::new()
                .layer(set_request_id_layer())
                .layer(TraceLayer::new_for_http().make_span_with(|request: &HttpRequest<Body>| {
                    tracing::info_span!(
                        "request",
                        request_id = %request.request_id(),
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                }))
                .layer(propagate_request_id_layer())
                .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.timeouts.request_secs,
                )))
                .layer(CorsLayer::permissive()),
        )
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            api_version = %self.config.api.version,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn track_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let group = RouteGroup::classify(&state.api_prefix, request.uri().path());

    let response = next.run(request).await;

    metrics::record_request(
        method.as_str(),
        response.status().as_u16(),
        group.as_str(),
        start,
    );
    response
}
