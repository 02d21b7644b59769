use crate::errors::ApiError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http::HeaderMap;
use log::warn;

/// Extract the token from an `Authorization: Bearer <token>` header
fn bearer_token(headers: &HeaderMap) -> Result<&str, &'static str> {
    let header = headers
        .get(http::header::AUTHORIZATION)
        .ok_or("Missing Authorization header")?;
    let header_str = header
        .to_str()
        .map_err(|_| "Authorization header is not valid ASCII")?;
    match header_str.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => Err("Authorization header must use the Bearer scheme"),
    }
}

/// Verify the bearer token and attach the principal to the request
pub(super) async fn authentication_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = match bearer_token(request.headers()) {
        Ok(token) => token.to_string(),
        Err(reason) => {
            warn!("{}", reason);
            return ApiError::unauthorized(reason, "Bearer").into_response();
        }
    };

    match state.gateway.verify(&token).await {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(err) => {
            warn!("Authentication failed: {}", err);
            ApiError::from(err).into_response()
        }
    }
}
