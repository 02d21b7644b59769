//! Opaque bearer-token verification against a provider introspection endpoint.

use crate::error::{ConfigError, VerificationError};
use crate::introspection::{
    ClaimMapping, IntrospectionMethod, IntrospectionRequest, IntrospectionResponse,
    UNKNOWN_SUBJECT,
};
use crate::scope::ScopeAliasTable;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Serialize;
use std::collections::HashSet;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use url::Url;

/// Default bound on a single introspection call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Turns a bearer token into an authorization decision
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verify a bearer token
    async fn verify(&self, token: &str) -> Result<AuthorizationResult, VerificationError>;

    /// Scope names every accepted token must carry
    fn required_scopes(&self) -> &[String];
}

/// Which granted scopes satisfied one required scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopeMatch {
    pub required: String,
    pub granted: Vec<String>,
}

/// A successfully verified token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationResult {
    /// User identifier reported by the provider
    pub subject: String,
    /// Granted scopes plus the alias names they satisfy
    pub scopes: Vec<String>,
    /// Unix seconds
    pub expires_at: Option<i64>,
    pub matched_scopes: Vec<ScopeMatch>,
}

impl AuthorizationResult {
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }
}

/// Everything a verifier needs; built once at startup and never mutated
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    pub tokeninfo_url: Url,
    pub client_id: String,
    /// When set, sent with `client_id` as HTTP Basic credentials
    pub client_secret: Option<String>,
    pub required_scopes: Vec<String>,
    pub scope_aliases: ScopeAliasTable,
    pub request: IntrospectionRequest,
    pub claims: ClaimMapping,
    pub timeout: Duration,
}

impl VerifierConfig {
    /// Generic configuration: GET `?access_token=`, default claims, no aliases
    pub fn new(tokeninfo_url: Url, client_id: impl Into<String>) -> Self {
        Self {
            tokeninfo_url,
            client_id: client_id.into(),
            client_secret: None,
            required_scopes: Vec::new(),
            scope_aliases: ScopeAliasTable::new(),
            request: IntrospectionRequest::default(),
            claims: ClaimMapping::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_required_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_scope_aliases(mut self, aliases: ScopeAliasTable) -> Self {
        self.scope_aliases = aliases;
        self
    }

    pub fn with_request(mut self, request: IntrospectionRequest) -> Self {
        self.request = request;
        self
    }

    pub fn with_claims(mut self, claims: ClaimMapping) -> Self {
        self.claims = claims;
        self
    }

    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Decide on a parsed introspection response.
///
/// Checks run in order: active flag, expiry, client, required scopes. The
/// exposed scope set is enriched with every alias the granted scopes satisfy.
pub fn authorize(
    config: &VerifierConfig,
    response: &IntrospectionResponse,
    now: i64,
) -> Result<AuthorizationResult, VerificationError> {
    if !response.active {
        return Err(VerificationError::TokenInvalid(
            "provider reports the token as inactive".to_string(),
        ));
    }

    if let Some(expires_at) = response.expires_at {
        if expires_at <= now {
            return Err(VerificationError::TokenExpired);
        }
    }

    if !response.audience.is_empty() && !response.audience.iter().any(|a| *a == config.client_id) {
        return Err(VerificationError::ClientMismatch {
            expected: config.client_id.clone(),
            actual: response.audience.join(" "),
        });
    }

    let canonical = response.scopes();
    let granted: HashSet<String> = canonical.iter().cloned().collect();

    let mut matched_scopes = Vec::with_capacity(config.required_scopes.len());
    let mut missing = Vec::new();
    for required in &config.required_scopes {
        match config.scope_aliases.satisfied_by(required, &granted) {
            Some(granted) => matched_scopes.push(ScopeMatch {
                required: required.clone(),
                granted,
            }),
            None => missing.push(required.clone()),
        }
    }
    if !missing.is_empty() {
        return Err(VerificationError::InsufficientScope { missing });
    }

    Ok(AuthorizationResult {
        subject: response
            .subject
            .clone()
            .unwrap_or_else(|| UNKNOWN_SUBJECT.to_string()),
        scopes: config.scope_aliases.enrich(&canonical),
        expires_at: response.expires_at,
        matched_scopes,
    })
}

/// Verifies opaque tokens by asking the provider on every call.
///
/// Holds no per-token state; one instance is shared by all requests.
#[derive(Debug, Clone)]
pub struct OpaqueTokenVerifier {
    config: VerifierConfig,
    client: Client,
}

impl OpaqueTokenVerifier {
    /// Create a verifier with its own pooled HTTP client
    pub fn new(config: VerifierConfig) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(config.timeout))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .build()?;
        Ok(Self::with_client(config, client))
    }

    /// Create a verifier reusing an existing HTTP client.
    ///
    /// The configured timeout is still applied to every request.
    pub fn with_client(config: VerifierConfig, client: Client) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Call the introspection endpoint and return the raw body
    async fn fetch(&self, token: &str) -> Result<Vec<u8>, VerificationError> {
        let config = &self.config;
        let params = [(config.request.token_param.as_str(), token)];
        let request = match config.request.method {
            IntrospectionMethod::Get => self.client.get(config.tokeninfo_url.clone()).query(&params),
            IntrospectionMethod::Post => self.client.post(config.tokeninfo_url.clone()).form(&params),
        };
        let request = match &config.client_secret {
            Some(secret) => request.basic_auth(&config.client_id, Some(secret)),
            None => request,
        };

        debug!("Introspecting token at {}", config.tokeninfo_url);
        let response = request
            .timeout(config.timeout)
            .send()
            .await
            .map_err(|e| provider_unreachable(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VerificationError::ProviderUnreachable(format!(
                "introspection endpoint returned status {status}"
            )));
        }

        let body = response.bytes().await.map_err(|e| provider_unreachable(&e))?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl TokenVerifier for OpaqueTokenVerifier {
    async fn verify(&self, token: &str) -> Result<AuthorizationResult, VerificationError> {
        if token.trim().is_empty() {
            return Err(VerificationError::TokenInvalid("empty bearer token".to_string()));
        }

        let result = async {
            let body = self.fetch(token).await?;
            let now = unix_now();
            let response = IntrospectionResponse::parse(&body, &self.config.claims, now)?;
            authorize(&self.config, &response, now)
        }
        .await;

        match &result {
            Ok(authorized) => debug!(
                "Token verified for '{}' with {} scopes",
                authorized.subject,
                authorized.scopes.len()
            ),
            Err(e) => debug!("Token verification failed: {}", e),
        }
        result
    }

    fn required_scopes(&self) -> &[String] {
        &self.config.required_scopes
    }
}

fn provider_unreachable(e: &reqwest::Error) -> VerificationError {
    if e.is_timeout() {
        VerificationError::ProviderUnreachable("introspection request timed out".to_string())
    } else {
        VerificationError::ProviderUnreachable(format!("introspection request failed: {e}"))
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
