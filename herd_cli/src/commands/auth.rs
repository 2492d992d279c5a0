//! Login, registration and sign-out.

use super::{FlowError, FlowResult};
use crate::app::App;
use herd_http::{ApiFailure, Call, Operation};
use herd_session::{AuthMethod, SignOutOutcome};
use serde_json::Value;
use tracing::info;

fn access_token(data: &Value) -> Option<&str> {
    data.get("access_token")
        .and_then(Value::as_str)
        .filter(|t| !t.trim().is_empty())
}

impl App {
    /// Credential login. A response without a token counts as a failed
    /// login and leaves the session untouched.
    pub async fn login(&self, username: &str, password: &str) -> FlowResult<Value> {
        let data = self.api.login(username, password).await?;
        let token = match access_token(&data) {
            Some(token) => token,
            None => {
                let fallback = Operation::Login.endpoint().fallback;
                return Err(FlowError::Api(ApiFailure::new(fallback)));
            }
        };
        self.session.start(token, username, AuthMethod::Credential)?;
        Ok(data)
    }

    /// Create an account. Signs the user in only when the API hands back
    /// a token with the new account and the username is known.
    pub async fn register(&self, payload: Value) -> FlowResult<Value> {
        let data = self.api.register(payload.clone()).await?;
        let username = data
            .get("username")
            .or_else(|| payload.get("username"))
            .and_then(Value::as_str)
            .filter(|name| !name.trim().is_empty());
        match (access_token(&data), username) {
            (Some(token), Some(username)) => {
                self.session.start(token, username, AuthMethod::Credential)?;
            }
            _ => info!("[Auth] Registered without a session"),
        }
        Ok(data)
    }

    /// Record a session obtained through single sign-on.
    pub fn start_sso_session(&self, token: &str, username: &str) -> FlowResult<()> {
        self.session.start(token, username, AuthMethod::Sso)?;
        Ok(())
    }

    /// The signed-in user as the API sees it.
    pub async fn whoami(&self) -> FlowResult<Value> {
        if !self.session.is_authenticated() {
            return Err(FlowError::NotSignedIn);
        }
        Ok(self.api.call(Operation::CurrentUser, Call::new()).await?)
    }

    pub async fn logout(&self) -> SignOutOutcome {
        self.auth.sign_out().await
    }
}
