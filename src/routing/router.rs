//! Route table.
//!
//! # Responsibilities
//! - Mount the user, experience and words groups under `/api/{version}`
//! - Layer authentication onto the protected routes only
//! - Answer everything else with the static acknowledgement
//!
//! # Design Decisions
//! - Immutable after construction (shared without locks)
//! - A known path with an unsupported method gets axum's 405, not the fallback
//! - Every route also answers with one trailing slash

use axum::{
    middleware,
    routing::{get, post, MethodRouter},
    Router,
};

use crate::auth::authenticate;
use crate::health;
use crate::http::handlers::{experience, user, words};
use crate::http::server::AppState;

/// Body returned for unmatched paths.
pub const FALLBACK_BODY: &str = "SERVER_GATEWAY";

/// `/api/{version}`.
pub fn api_prefix(version: &str) -> String {
    format!("/api/{version}")
}

/// Build the route table for `state`.
pub fn build_routes(state: AppState) -> Router {
    let prefix = api_prefix(&state.config.api.version);

    let public = Router::new();
    let public = route(public, &format!("{prefix}/user/signup"), post(user::signup));
    let public = route(public, &format!("{prefix}/user/login"), post(user::login));

    let protected = Router::new();
    let protected = route(
        protected,
        &format!("{prefix}/user"),
        get(user::profile)
            .patch(user::update_profile)
            .delete(user::delete_profile),
    );
    let protected = route(
        protected,
        &format!("{prefix}/experience"),
        get(experience::get_experience)
            .post(experience::create_experience)
            .patch(experience::increment_experience)
            .delete(experience::delete_experience),
    );
    let protected = route(protected, &format!("{prefix}/words"), get(words::list_words));
    let protected = route(
        protected,
        &format!("{prefix}/words/{{id}}"),
        get(words::get_word),
    )
    .route_layer(middleware::from_fn_with_state(
        state.verifier.clone(),
        authenticate,
    ));

    Router::new()
        .route("/health", get(health::readiness))
        .merge(public)
        .merge(protected)
        .fallback(fallback)
        .with_state(state)
}

/// Mount `handler` at `path` and at `path/`.
fn route(
    router: Router<AppState>,
    path: &str,
    handler: MethodRouter<AppState>,
) -> Router<AppState> {
    router
        .route(path, handler.clone())
        .route(&format!("{path}/"), handler)
}

async fn fallback() -> &'static str {
    FALLBACK_BODY
}
