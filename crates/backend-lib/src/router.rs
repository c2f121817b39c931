// ============================
// notes-backend-lib/src/router.rs
// ============================
//! HTTP router.
use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{self, auth, notes, users};
use crate::middleware::require_auth;
use crate::storage::Storage;
use crate::AppState;

/// Create the API router. Everything except `/auth/*` and `/health` sits
/// behind the access guard.
pub fn create_router<S: Storage>(state: Arc<AppState<S>>) -> Router {
    let protected = Router::new()
        .route("/users/me", get(users::me))
        .route("/users", patch(users::edit::<S>))
        .route("/notes", get(notes::list::<S>).post(notes::create::<S>))
        .route(
            "/notes/{id}",
            get(notes::get::<S>)
                .patch(notes::edit::<S>)
                .delete(notes::delete::<S>),
        )
        .route_layer(from_fn_with_state(state.clone(), require_auth::<S>));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/signup", post(auth::sign_up::<S>))
        .route("/auth/signin", post(auth::sign_in::<S>))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
