//! Application wiring.

use herd_common::HerdConfig;
use herd_http::{AddressPolicy, ApiClient, ExecutionContext};
use herd_session::{
    AuthJsProvider, AuthManager, JsonFileStore, Navigator, RouteGuard, SessionService, SsoConfig,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Everything a client flow needs, sharing one session.
#[derive(Debug)]
pub struct App {
    pub session: SessionService,
    pub api: ApiClient,
    pub auth: AuthManager,
    pub guard: RouteGuard,
}

impl App {
    /// Assemble from existing parts, e.g. test doubles.
    pub fn from_parts(
        session: SessionService,
        api: ApiClient,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let api = api.with_token_source(Arc::new(session.clone()));
        let auth = AuthManager::new(session.clone(), navigator);
        App {
            session,
            api,
            auth,
            guard: RouteGuard::new(),
        }
    }

    /// Client-context app over the on-disk session store.
    pub fn from_config(config: &HerdConfig, navigator: Arc<dyn Navigator>) -> anyhow::Result<Self> {
        herd_common::ensure_dir(&config.config_dir)?;
        let store = JsonFileStore::open(config.session_path())?;
        let session = SessionService::client(Arc::new(store));

        let policy = AddressPolicy::new(config.api_url.clone());
        let api = ApiClient::new(&policy, ExecutionContext::Client)?;
        info!("[App] API at {}", api.base_url());

        let mut app = Self::from_parts(session, api, navigator);
        if let Some(sso) = sso_config(config) {
            match AuthJsProvider::new(sso) {
                Ok(provider) => app.auth = app.auth.with_sso(Arc::new(provider)),
                Err(e) => warn!("[App] SSO disabled: {}", e),
            }
        }
        Ok(app)
    }
}

/// SSO settings, when an SSO client is configured.
pub fn sso_config(config: &HerdConfig) -> Option<SsoConfig> {
    if config.sso_enabled() {
        Some(SsoConfig::new(config.auth_origin.clone()))
    } else {
        None
    }
}
