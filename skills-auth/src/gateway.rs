//! The single entry point request handlers use for authorization decisions.

use crate::error::{ConfigError, VerificationError};
use crate::provider::{select_verifier, VerifierSettings};
use crate::redirect::RedirectUriPolicy;
use crate::verifier::{AuthorizationResult, TokenVerifier};
use log::info;
use std::sync::Arc;

/// Owns the active token verifier and the redirect policy.
///
/// Built once at startup, then shared read-only; cloning is cheap.
#[derive(Clone)]
pub struct AuthorizationGateway {
    verifier: Arc<dyn TokenVerifier>,
    redirect_policy: RedirectUriPolicy,
}

impl AuthorizationGateway {
    pub fn new(verifier: Arc<dyn TokenVerifier>, redirect_policy: RedirectUriPolicy) -> Self {
        Self {
            verifier,
            redirect_policy,
        }
    }

    /// Select the verifier and compile the redirect allow-list.
    ///
    /// Any configuration problem is returned here so the process can refuse
    /// to start.
    pub fn from_settings(settings: &VerifierSettings) -> Result<Self, ConfigError> {
        let verifier = select_verifier(settings)?;
        let redirect_policy = RedirectUriPolicy::from_patterns(&settings.allowed_redirect_uris)?;
        if let RedirectUriPolicy::AllowList(patterns) = &redirect_policy {
            info!("Allowing {} redirect URI pattern(s)", patterns.len());
        }
        Ok(Self::new(Arc::new(verifier), redirect_policy))
    }

    pub async fn verify(&self, token: &str) -> Result<AuthorizationResult, VerificationError> {
        self.verifier.verify(token).await
    }

    pub fn is_redirect_allowed(&self, candidate: &str) -> bool {
        self.redirect_policy.is_allowed(candidate)
    }

    pub fn required_scopes(&self) -> &[String] {
        self.verifier.required_scopes()
    }

    pub fn redirect_policy(&self) -> &RedirectUriPolicy {
        &self.redirect_policy
    }
}

impl std::fmt::Debug for AuthorizationGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationGateway")
            .field("required_scopes", &self.required_scopes())
            .field("redirect_policy", &self.redirect_policy)
            .finish()
    }
}
