use confique::Config;

pub mod oauth;

pub use oauth::OAuthConfig;

/// Optional configuration file, read after the environment
pub const CONFIG_FILE: &str = "skills-auth.toml";

/// Main configuration structure for the auth server
#[derive(Debug, Config, Clone)]
pub struct Settings {
    /// The port the server will listen to (default: 8000)
    #[config(env = "SKILLS_AUTH_PORT", default = 8000)]
    pub port: u16,

    /// OAuth bearer-token configuration
    #[config(nested)]
    pub oauth: OAuthConfig,
}

impl Settings {
    /// Load settings from environment variables, then the optional config file
    pub fn new() -> Result<Self, confique::Error> {
        Self::builder().env().file(CONFIG_FILE).load()
    }

    #[cfg(test)]
    pub fn for_test_with_mocks(provider_mock: &wiremock::MockServer) -> Self {
        Self {
            port: 0, // Let the OS choose a port
            oauth: OAuthConfig {
                client_id: "test-client-id".to_string(),
                tokeninfo_url: Some(format!("{}/tokeninfo", provider_mock.uri())),
                config_url: None,
                client_secret: None,
                required_scopes: "email".to_string(),
                scope_aliases: "email=https://www.googleapis.com/auth/userinfo.email".to_string(),
                allowed_redirect_uris: "https://claude.ai/*,http://localhost:*".to_string(),
                introspection_method: "".to_string(),
                token_param: "".to_string(),
                timeout: 2,
            },
        }
    }
}
