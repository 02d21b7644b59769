use crate::api::{health, oauth};
use utoipa::OpenApi;

pub(crate) const HEALTH_TAG: &str = "Health API";
pub(crate) const OAUTH_TAG: &str = "OAuth API";

#[derive(OpenApi)]
#[openapi(
    paths(health::health_check, oauth::redirect_check, oauth::whoami),
    tags(
        (name = HEALTH_TAG, description = "Health check endpoints"),
        (name = OAUTH_TAG, description = "Bearer token and redirect URI checks"),
    ),
    info(
        title = "Skills Auth API",
        description = "Opaque bearer-token authorization service",
        version = "0.1.0"
    )
)]
pub(crate) struct ApiDoc;
