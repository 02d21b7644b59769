use axum::response::IntoResponse;
use axum::Json;
use http::header::WWW_AUTHENTICATE;
use http::{HeaderValue, StatusCode};
use serde_json::json;
use skills_auth::VerificationError;

#[derive(Debug, Clone)]
pub struct ApiError {
    pub detail: String,
    pub status_code: StatusCode,
    /// Value of the `WWW-Authenticate` header, for bearer failures
    pub challenge: Option<String>,
}

impl ApiError {
    /// Create a new ApiError with a detail message and status code
    pub fn new<S: ToString>(detail: S, status_code: StatusCode) -> Self {
        Self {
            detail: detail.to_string(),
            status_code,
            challenge: None,
        }
    }

    /// Create new Bad Request Error (400) with a detail message
    pub fn bad_request<S: ToString>(detail: S) -> Self {
        Self::new(detail, StatusCode::BAD_REQUEST)
    }

    /// Create new Bad Gateway (502) with a detail message
    pub fn bad_gateway<S: ToString>(detail: S) -> Self {
        Self::new(detail, StatusCode::BAD_GATEWAY)
    }

    /// Create new Unauthorized (401) with a bearer challenge
    pub fn unauthorized<S: ToString>(detail: S, challenge: impl Into<String>) -> Self {
        Self {
            challenge: Some(challenge.into()),
            ..Self::new(detail, StatusCode::UNAUTHORIZED)
        }
    }

    /// Create new Forbidden (403) with a bearer challenge
    pub fn forbidden<S: ToString>(detail: S, challenge: impl Into<String>) -> Self {
        Self {
            challenge: Some(challenge.into()),
            ..Self::new(detail, StatusCode::FORBIDDEN)
        }
    }
}

impl From<VerificationError> for ApiError {
    fn from(err: VerificationError) -> Self {
        match err {
            VerificationError::ProviderUnreachable(_) => {
                Self::bad_gateway("Token provider is unavailable")
            }
            VerificationError::TokenInvalid(_) | VerificationError::TokenExpired => {
                Self::unauthorized(&err, r#"Bearer error="invalid_token""#)
            }
            // The expected client id stays out of the response
            VerificationError::ClientMismatch { .. } => Self::unauthorized(
                "Token was not issued for this client",
                r#"Bearer error="invalid_token""#,
            ),
            VerificationError::InsufficientScope { ref missing } => {
                let challenge = format!(
                    r#"Bearer error="insufficient_scope", scope="{}""#,
                    missing.join(" ")
                );
                Self::forbidden(&err, challenge)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status_code = self.status_code;
        let body = json!({
            "detail": self.detail,
        });
        let mut response = (status_code, Json(body)).into_response();
        if let Some(challenge) = self.challenge {
            // Scope names are not guaranteed to be valid header text
            let value = HeaderValue::from_str(&challenge).unwrap_or_else(|_| {
                if status_code == StatusCode::FORBIDDEN {
                    HeaderValue::from_static(r#"Bearer error="insufficient_scope""#)
                } else {
                    HeaderValue::from_static(r#"Bearer error="invalid_token""#)
                }
            });
            response.headers_mut().insert(WWW_AUTHENTICATE, value);
        }
        response
    }
}
