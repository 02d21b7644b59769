use crate::redirect::RedirectPatternError;
use crate::scope::AliasError;
use thiserror::Error;

/// Why a bearer token was not accepted.
///
/// Every variant is a normal outcome of a verification call, reported to the
/// caller as a typed result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("Token provider unreachable: {0}")]
    ProviderUnreachable(String),

    #[error("Token is invalid: {0}")]
    TokenInvalid(String),

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token was issued for client '{actual}', expected '{expected}'")]
    ClientMismatch { expected: String, actual: String },

    #[error("Token is missing required scopes: {}", missing.join(", "))]
    InsufficientScope { missing: Vec<String> },
}

/// Startup configuration problems. These are fatal: the process must not
/// serve requests with a half-built verifier.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid URL in {field}: {source}")]
    InvalidUrl {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("Invalid scope aliases: {0}")]
    ScopeAliases(#[from] AliasError),

    #[error("Invalid redirect URI pattern: {0}")]
    RedirectPattern(#[from] RedirectPatternError),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
