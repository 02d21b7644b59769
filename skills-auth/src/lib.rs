//! Bearer-token authorization for OAuth-protected services.
//!
//! Tokens are treated as opaque and checked against the identity provider's
//! introspection (tokeninfo) endpoint on every call. A verified token becomes
//! an [`AuthorizationResult`] with the subject and an alias-enriched scope
//! set. Redirect URIs for the authorization callback are checked against a
//! [`RedirectUriPolicy`].
//!
//! ```no_run
//! use skills_auth::{AuthorizationGateway, VerifierSettings};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = AuthorizationGateway::from_settings(&VerifierSettings {
//!     tokeninfo_url: Some(skills_auth::GOOGLE_TOKENINFO_URL.to_string()),
//!     client_id: "my-client-id.apps.googleusercontent.com".to_string(),
//!     required_scopes: vec!["email".to_string()],
//!     allowed_redirect_uris: vec!["https://claude.ai/*".to_string()],
//!     ..Default::default()
//! })?;
//!
//! let principal = gateway.verify("ya29.a0...").await?;
//! assert!(principal.has_scope("email"));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod gateway;
pub mod introspection;
pub mod provider;
pub mod redirect;
pub mod scope;
pub mod verifier;

pub use error::{ConfigError, VerificationError};
pub use gateway::AuthorizationGateway;
pub use introspection::{
    ClaimMapping, ExpiryClaim, IntrospectionMethod, IntrospectionRequest, UnknownMethod,
};
pub use provider::{
    select_verifier, select_verifier_config, ProviderPreset, VerifierSettings,
    GOOGLE_TOKENINFO_URL,
};
pub use redirect::{RedirectUriPattern, RedirectUriPolicy};
pub use scope::ScopeAliasTable;
pub use verifier::{
    AuthorizationResult, OpaqueTokenVerifier, ScopeMatch, TokenVerifier, VerifierConfig,
    DEFAULT_TIMEOUT,
};
