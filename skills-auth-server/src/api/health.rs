use crate::openapi::HEALTH_TAG;
use crate::state::AppState;
use axum::{response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Basic health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Health {
    status: String,
}

/// Liveness check; does not contact the identity provider
#[utoipa::path(
    get,
    path = "/health",
    tag = HEALTH_TAG,
    responses(
        (status = 200, description = "Service is healthy", body = Health)
    )
)]
pub(crate) async fn health_check() -> impl IntoResponse {
    Json(Health {
        status: "ok".to_string(),
    })
}

pub(super) fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestFixture;

    #[tokio::test]
    async fn test_health_endpoint() {
        let fixture = TestFixture::new().await;
        let response = fixture.get("/health").await;
        response.assert_ok();
        let health = response.json_as::<Health>();
        assert_eq!(health.status, "ok");
    }

    #[tokio::test]
    async fn test_health_does_not_call_provider() {
        let fixture = TestFixture::new().await;
        fixture.get("/health").await.assert_ok();
        let requests = fixture
            .provider_mock
            .received_requests()
            .await
            .unwrap_or_default();
        assert!(requests.is_empty());
    }
}
