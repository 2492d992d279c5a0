//! Third-party single sign-on.

use crate::error::{Result, SessionError};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// Scopes requested from the identity provider.
pub const DEFAULT_SCOPES: &str = "openid profile email";
pub const DEFAULT_BASE_PATH: &str = "/api/auth";
pub const DEFAULT_PROVIDER_ID: &str = "google";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SsoStatus {
    Authenticated,
    Unauthenticated,
}

/// Identity provider integration used by sign-out.
#[async_trait]
pub trait SsoProvider: Send + Sync + 'static {
    /// Whether the provider currently holds a session for this user.
    async fn status(&self) -> Result<SsoStatus>;

    /// End the provider session. Returns the address to redirect to,
    /// which lands on `callback_url` after the provider is done.
    async fn sign_out(&self, callback_url: &str) -> Result<String>;
}

/// Where the Auth.js routes live.
///
/// The OAuth client credentials belong to the Auth.js server; this side
/// only talks to its routes and never holds them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SsoConfig {
    /// Origin of the front-end hosting the auth routes.
    pub origin: String,
    pub base_path: String,
    pub provider_id: String,
    pub scopes: String,
}

impl SsoConfig {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into().trim_end_matches('/').to_string(),
            base_path: DEFAULT_BASE_PATH.to_string(),
            provider_id: DEFAULT_PROVIDER_ID.to_string(),
            scopes: DEFAULT_SCOPES.to_string(),
        }
    }

    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// `{origin}{base_path}/{route}`
    pub fn route(&self, route: &str) -> String {
        format!("{}{}/{}", self.origin, self.base_path, route)
    }

    /// Make an app path absolute against the origin.
    pub fn absolute(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.origin, path)
        } else {
            path.to_string()
        }
    }

    /// Where to send the user to start an SSO login.
    pub fn sign_in_url(&self, callback_url: &str) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("callbackUrl", &self.absolute(callback_url))
            .append_pair("scope", &self.scopes)
            .finish();
        format!("{}?{}", self.route(&format!("signin/{}", self.provider_id)), query)
    }
}

#[derive(Deserialize)]
struct CsrfResponse {
    #[serde(rename = "csrfToken")]
    csrf_token: String,
}

#[derive(Deserialize)]
struct SignOutResponse {
    url: Option<String>,
}

/// [`SsoProvider`] speaking the Auth.js HTTP routes
/// (`session`, `csrf`, `signout`) under the configured base path.
pub struct AuthJsProvider {
    config: SsoConfig,
    client: reqwest::Client,
}

impl AuthJsProvider {
    pub fn new(config: SsoConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| SessionError::Sso(e.to_string()))?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &SsoConfig {
        &self.config
    }

    async fn get_json(&self, route: &str) -> Result<serde_json::Value> {
        let url = self.config.route(route);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SessionError::Sso(format!("GET {}: {}", url, status)));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl SsoProvider for AuthJsProvider {
    async fn status(&self) -> Result<SsoStatus> {
        let session = self.get_json("session").await?;
        let authenticated = session
            .get("user")
            .map(|user| !user.is_null())
            .unwrap_or(false);
        debug!("[SSO] Session status authenticated={}", authenticated);
        Ok(if authenticated {
            SsoStatus::Authenticated
        } else {
            SsoStatus::Unauthenticated
        })
    }

    async fn sign_out(&self, callback_url: &str) -> Result<String> {
        let csrf: CsrfResponse = serde_json::from_value(self.get_json("csrf").await?)?;
        let callback = self.config.absolute(callback_url);

        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("csrfToken", &csrf.csrf_token)
            .append_pair("callbackUrl", &callback)
            .append_pair("json", "true")
            .finish();

        let url = self.config.route("signout");
        let response = self
            .client
            .post(&url)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SessionError::Sso(format!("POST {}: {}", url, status)));
        }

        let redirect = response
            .json::<SignOutResponse>()
            .await
            .ok()
            .and_then(|r| r.url)
            .unwrap_or(callback);
        Ok(redirect)
    }
}
