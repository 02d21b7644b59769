mod authn_middleware;
pub(crate) mod health;
pub(crate) mod oauth;

use crate::api::authn_middleware::authentication_middleware;
use crate::state::AppState;
use axum::{middleware, Router};

/// Combines all API routes into a single router
pub(super) fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(oauth::public_router())
        .merge(protected_routes(state))
}

/// Creates a router for protected routes that require a valid bearer token
fn protected_routes(state: &AppState) -> Router<AppState> {
    oauth::protected_router().route_layer(middleware::from_fn_with_state(
        state.clone(),
        authentication_middleware,
    ))
}
