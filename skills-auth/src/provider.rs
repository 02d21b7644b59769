//! Provider presets and startup-time verifier selection.
//!
//! A preset is plain data: a tokeninfo URL, a claim layout and a default
//! scope alias table for one identity provider. Selection looks at the host
//! of the configured URL once, at startup, and either applies a preset or
//! falls back to the generic verifier.

use crate::error::ConfigError;
use crate::introspection::{ClaimMapping, IntrospectionRequest};
use crate::scope::{AliasError, ScopeAliasTable};
use crate::verifier::{OpaqueTokenVerifier, VerifierConfig, DEFAULT_TIMEOUT};
use log::info;
use std::time::Duration;
use url::Url;

pub const GOOGLE_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

const GOOGLE_HOSTS: &[&str] = &["oauth2.googleapis.com", "www.googleapis.com", "accounts.google.com"];

const GOOGLE_SCOPE_ALIASES: &[(&str, &[&str])] = &[
    ("email", &["https://www.googleapis.com/auth/userinfo.email"]),
    ("profile", &["https://www.googleapis.com/auth/userinfo.profile"]),
];

/// Identity providers with a built-in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderPreset {
    Google,
}

impl ProviderPreset {
    pub const ALL: &'static [ProviderPreset] = &[ProviderPreset::Google];

    pub fn name(&self) -> &'static str {
        match self {
            ProviderPreset::Google => "google",
        }
    }

    fn hosts(&self) -> &'static [&'static str] {
        match self {
            ProviderPreset::Google => GOOGLE_HOSTS,
        }
    }

    /// Find the preset whose hosts include the URL's host (exact match)
    pub fn detect(url: &Url) -> Option<Self> {
        let host = url.host_str()?;
        Self::ALL
            .iter()
            .copied()
            .find(|preset| preset.hosts().contains(&host))
    }

    pub fn tokeninfo_url(&self) -> &'static str {
        match self {
            ProviderPreset::Google => GOOGLE_TOKENINFO_URL,
        }
    }

    /// Built-in aliases from short names to the provider's scope URIs
    pub fn scope_aliases(&self) -> Result<ScopeAliasTable, AliasError> {
        match self {
            ProviderPreset::Google => ScopeAliasTable::from_entries(
                GOOGLE_SCOPE_ALIASES
                    .iter()
                    .map(|(alias, targets)| (*alias, targets.iter().copied())),
            ),
        }
    }

    /// Google's tokeninfo: GET `?access_token=`, client in `aud`/`azp`,
    /// lifetime in `expires_in`
    fn apply(&self, config: VerifierConfig) -> VerifierConfig {
        match self {
            ProviderPreset::Google => config
                .with_request(IntrospectionRequest::query("access_token"))
                .with_claims(ClaimMapping {
                    client_id: vec!["aud".to_string(), "azp".to_string()],
                    ..ClaimMapping::default()
                }),
        }
    }

    /// Preset configuration with the caller's client id and required scopes
    pub fn verifier_config<I, S>(
        &self,
        client_id: impl Into<String>,
        required_scopes: I,
    ) -> Result<VerifierConfig, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let url = parse_url("tokeninfo_url", self.tokeninfo_url())?;
        let config = VerifierConfig::new(url, client_id)
            .with_required_scopes(required_scopes)
            .with_scope_aliases(self.scope_aliases()?);
        Ok(self.apply(config))
    }
}

/// Verifier-related configuration as handed over by the config loader
#[derive(Debug, Clone)]
pub struct VerifierSettings {
    /// Introspection endpoint; wins over anything derived from `discovery_url`
    pub tokeninfo_url: Option<String>,
    /// OIDC discovery document URL, used to recognise the provider
    pub discovery_url: Option<String>,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub required_scopes: Vec<String>,
    /// Replaces a preset's built-in table when set
    pub scope_aliases: Option<ScopeAliasTable>,
    /// Where the token goes; overrides the preset's layout when set
    pub request: Option<IntrospectionRequest>,
    pub allowed_redirect_uris: Vec<String>,
    /// Must be non-zero
    pub timeout: Duration,
}

impl Default for VerifierSettings {
    fn default() -> Self {
        Self {
            tokeninfo_url: None,
            discovery_url: None,
            client_id: String::new(),
            client_secret: None,
            required_scopes: Vec::new(),
            scope_aliases: None,
            request: None,
            allowed_redirect_uris: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Build the verifier configuration for the configured provider.
///
/// - explicit `tokeninfo_url`: used as is; a known host adds its preset
/// - otherwise a known `discovery_url` host supplies the preset URL
/// - otherwise there is nothing to verify against and startup fails
pub fn select_verifier_config(settings: &VerifierSettings) -> Result<VerifierConfig, ConfigError> {
    if settings.client_id.trim().is_empty() {
        return Err(ConfigError::Missing("client_id"));
    }
    if settings.timeout.is_zero() {
        return Err(ConfigError::InvalidValue {
            field: "timeout",
            reason: "must be greater than zero".to_string(),
        });
    }

    let (url, preset) = match (&settings.tokeninfo_url, &settings.discovery_url) {
        (Some(tokeninfo_url), _) => {
            let url = parse_url("tokeninfo_url", tokeninfo_url)?;
            let preset = ProviderPreset::detect(&url);
            (url, preset)
        }
        (None, Some(discovery_url)) => {
            let discovery = parse_url("discovery_url", discovery_url)?;
            let preset = ProviderPreset::detect(&discovery).ok_or(ConfigError::Missing(
                "tokeninfo_url (discovery URL does not belong to a known provider)",
            ))?;
            (parse_url("tokeninfo_url", preset.tokeninfo_url())?, Some(preset))
        }
        (None, None) => return Err(ConfigError::Missing("tokeninfo_url")),
    };

    let mut config = match preset {
        Some(preset) => {
            info!("Using {} token verifier at {}", preset.name(), url);
            VerifierConfig {
                tokeninfo_url: url,
                ..preset.verifier_config(settings.client_id.clone(), settings.required_scopes.clone())?
            }
        }
        None => {
            info!("Using generic opaque token verifier at {}", url);
            VerifierConfig::new(url, settings.client_id.clone())
                .with_required_scopes(settings.required_scopes.clone())
        }
    };

    if let Some(aliases) = &settings.scope_aliases {
        config.scope_aliases = aliases.clone();
    }
    if let Some(request) = &settings.request {
        config.request = request.clone();
    }
    if let Some(secret) = &settings.client_secret {
        config.client_secret = Some(secret.clone());
    }
    config.timeout = settings.timeout;
    Ok(config)
}

/// Build the verifier for the configured provider
pub fn select_verifier(settings: &VerifierSettings) -> Result<OpaqueTokenVerifier, ConfigError> {
    OpaqueTokenVerifier::new(select_verifier_config(settings)?)
}

fn parse_url(field: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|source| ConfigError::InvalidUrl { field, source })
}
