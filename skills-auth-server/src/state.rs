use crate::config::Settings;
use skills_auth::{AuthorizationGateway, ConfigError};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub gateway: Arc<AuthorizationGateway>,
}

impl AppState {
    /// Build the authorization gateway from the OAuth settings
    pub fn new(settings: Settings) -> Result<Self, ConfigError> {
        let gateway = AuthorizationGateway::from_settings(&settings.oauth.verifier_settings()?)?;
        Ok(Self::with_gateway(settings, gateway))
    }

    pub fn with_gateway(settings: Settings, gateway: AuthorizationGateway) -> Self {
        Self {
            settings: Arc::new(settings),
            gateway: Arc::new(gateway),
        }
    }
}
