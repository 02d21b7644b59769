use crate::errors::ApiError;
use crate::openapi::OAUTH_TAG;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use log::warn;
use serde::{Deserialize, Serialize};
use skills_auth::{AuthorizationResult, ScopeMatch};
use utoipa::{IntoParams, ToSchema};

/// Query parameters for the redirect URI check
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct RedirectCheckQuery {
    /// Redirect URI the authorization callback would send the user agent to
    redirect_uri: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub(crate) struct RedirectCheckResult {
    redirect_uri: String,
    allowed: bool,
}

/// The authenticated caller
#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub(crate) struct Principal {
    /// User identifier reported by the identity provider
    subject: String,
    /// Granted scopes plus the alias names they satisfy
    scopes: Vec<String>,
    /// Token expiry as unix seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<i64>,
    /// Granted scopes backing each required scope
    matched_scopes: Vec<MatchedScope>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub(crate) struct MatchedScope {
    required: String,
    granted: Vec<String>,
}

impl From<ScopeMatch> for MatchedScope {
    fn from(m: ScopeMatch) -> Self {
        Self {
            required: m.required,
            granted: m.granted,
        }
    }
}

impl From<AuthorizationResult> for Principal {
    fn from(result: AuthorizationResult) -> Self {
        Self {
            subject: result.subject,
            scopes: result.scopes,
            expires_at: result.expires_at,
            matched_scopes: result.matched_scopes.into_iter().map(Into::into).collect(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/oauth/redirect-check",
    tag = OAUTH_TAG,
    params(RedirectCheckQuery),
    responses(
        (status = 200, description = "Redirect URI is allowed", body = RedirectCheckResult),
        (status = 400, description = "Redirect URI is not allowed")
    )
)]
pub(crate) async fn redirect_check(
    State(state): State<AppState>,
    Query(query): Query<RedirectCheckQuery>,
) -> Response {
    if !state.gateway.is_redirect_allowed(&query.redirect_uri) {
        warn!("Rejected redirect URI: {}", query.redirect_uri);
        return ApiError::bad_request("redirect_uri is not allowed").into_response();
    }
    Json(RedirectCheckResult {
        redirect_uri: query.redirect_uri,
        allowed: true,
    })
    .into_response()
}

#[utoipa::path(
    get,
    path = "/whoami",
    tag = OAUTH_TAG,
    params(
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 200, description = "Token accepted", body = Principal),
        (status = 401, description = "Missing, invalid or expired token"),
        (status = 403, description = "Token lacks a required scope"),
        (status = 502, description = "Identity provider unavailable")
    )
)]
pub(crate) async fn whoami(Extension(principal): Extension<AuthorizationResult>) -> Json<Principal> {
    Json(principal.into())
}

/// Routes that do not need a bearer token
pub(super) fn public_router() -> Router<AppState> {
    Router::new().route("/oauth/redirect-check", get(redirect_check))
}

/// Routes behind the authentication middleware
pub(super) fn protected_router() -> Router<AppState> {
    Router::new().route("/whoami", get(whoami))
}
