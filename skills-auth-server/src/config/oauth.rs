//! OAuth bearer-token configuration

use confique::Config;
use skills_auth::{
    ConfigError, IntrospectionMethod, IntrospectionRequest, ScopeAliasTable, VerifierSettings,
};
use std::time::Duration;

/// OAuth bearer-token configuration
#[derive(Debug, Config, Clone, Default)]
pub struct OAuthConfig {
    /// OAuth client id tokens must have been issued to (required)
    #[config(env = "SKILLS_OAUTH_CLIENT_ID")]
    pub client_id: String,

    /// Token introspection (tokeninfo) endpoint
    #[config(env = "SKILLS_OAUTH_TOKENINFO_URL")]
    pub tokeninfo_url: Option<String>,

    /// OIDC discovery URL, used to recognise the identity provider
    #[config(env = "SKILLS_OAUTH_CONFIG_URL")]
    pub config_url: Option<String>,

    /// Client secret, sent as Basic credentials to the introspection endpoint
    #[config(env = "SKILLS_OAUTH_CLIENT_SECRET")]
    pub client_secret: Option<String>,

    /// Scopes every token must carry
    /// Comma-separated list (default: "")
    #[config(env = "SKILLS_OAUTH_REQUIRED_SCOPES", default = "")]
    pub required_scopes: String,

    /// Scope aliases as "alias=scope scope,alias2=scope"
    /// Empty keeps the provider's built-in aliases (default: "")
    #[config(env = "SKILLS_OAUTH_SCOPE_ALIASES", default = "")]
    pub scope_aliases: String,

    /// Redirect URI patterns accepted by the authorization callback, a trailing
    /// `*` makes a prefix match. Comma-separated list, empty allows any URI
    /// (default: "")
    #[config(env = "SKILLS_OAUTH_ALLOWED_REDIRECT_URIS", default = "")]
    pub allowed_redirect_uris: String,

    /// HTTP method of the introspection call, "get" or "post"
    /// Empty keeps the provider's layout (default: "")
    #[config(env = "SKILLS_OAUTH_INTROSPECTION_METHOD", default = "")]
    pub introspection_method: String,

    /// Name of the parameter carrying the token, "access_token" for GET and
    /// "token" for POST when unset (default: "")
    #[config(env = "SKILLS_OAUTH_TOKEN_PARAM", default = "")]
    pub token_param: String,

    /// Introspection request timeout in seconds, must be positive (default: 10)
    #[config(env = "SKILLS_OAUTH_TIMEOUT", default = 10)]
    pub timeout: u64,
}

impl OAuthConfig {
    /// Get required scopes as a vector
    pub fn get_required_scopes(&self) -> Vec<String> {
        split_list(&self.required_scopes)
    }

    /// Get allowed redirect URI patterns as a vector
    pub fn get_allowed_redirect_uris(&self) -> Vec<String> {
        split_list(&self.allowed_redirect_uris)
    }

    /// Convert into the settings the authorization gateway is built from
    pub fn verifier_settings(&self) -> Result<VerifierSettings, ConfigError> {
        let scope_aliases = match self.scope_aliases.trim() {
            "" => None,
            raw => Some(raw.parse::<ScopeAliasTable>()?),
        };

        if self.timeout == 0 {
            return Err(ConfigError::InvalidValue {
                field: "SKILLS_OAUTH_TIMEOUT",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(VerifierSettings {
            tokeninfo_url: non_empty(&self.tokeninfo_url),
            discovery_url: non_empty(&self.config_url),
            client_id: self.client_id.trim().to_string(),
            client_secret: non_empty(&self.client_secret),
            required_scopes: self.get_required_scopes(),
            scope_aliases,
            request: self.introspection_request()?,
            allowed_redirect_uris: self.get_allowed_redirect_uris(),
            timeout: Duration::from_secs(self.timeout),
        })
    }

    /// Request layout override, `None` when neither method nor parameter is set
    fn introspection_request(&self) -> Result<Option<IntrospectionRequest>, ConfigError> {
        let method = match self.introspection_method.trim() {
            "" => None,
            raw => Some(raw.parse::<IntrospectionMethod>().map_err(|e| {
                ConfigError::InvalidValue {
                    field: "SKILLS_OAUTH_INTROSPECTION_METHOD",
                    reason: e.to_string(),
                }
            })?),
        };
        let token_param = match self.token_param.trim() {
            "" => None,
            param => Some(param),
        };
        if method.is_none() && token_param.is_none() {
            return Ok(None);
        }
        Ok(Some(IntrospectionRequest::configured(method, token_param)))
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
