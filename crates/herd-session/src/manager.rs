//! Sign-out orchestration across the local session and the SSO provider.

use crate::guard::LOGIN_PATH;
use crate::navigator::Navigator;
use crate::session::{AuthMethod, SessionService};
use crate::sso::{SsoProvider, SsoStatus};
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Which branch a sign-out took and where it sent the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignOutOutcome {
    /// The provider session was ended; the user follows its redirect.
    Sso { redirect: String },
    /// Only local state was cleared.
    Local { redirect: String },
}

impl SignOutOutcome {
    pub fn redirect(&self) -> &str {
        match self {
            SignOutOutcome::Sso { redirect } | SignOutOutcome::Local { redirect } => redirect,
        }
    }

    pub fn is_sso(&self) -> bool {
        matches!(self, SignOutOutcome::Sso { .. })
    }
}

pub struct AuthManager {
    session: SessionService,
    sso: Option<Arc<dyn SsoProvider>>,
    navigator: Arc<dyn Navigator>,
    login_path: String,
}

impl AuthManager {
    pub fn new(session: SessionService, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            session,
            sso: None,
            navigator,
            login_path: LOGIN_PATH.to_string(),
        }
    }

    pub fn with_sso(mut self, provider: Arc<dyn SsoProvider>) -> Self {
        self.sso = Some(provider);
        self
    }

    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    pub fn session(&self) -> &SessionService {
        &self.session
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn username(&self) -> Option<String> {
        self.session.username()
    }

    /// Sign the user out.
    ///
    /// SSO sessions that the provider still considers live are ended at the
    /// provider after local state is cleared, so the redirect it triggers
    /// cannot outrun the cleanup. Everything else clears locally and goes
    /// to the login page. Failures along the way are logged, never
    /// returned: the session is always cleared and the user always moved.
    pub async fn sign_out(&self) -> SignOutOutcome {
        if let Some(redirect) = self.sign_out_sso().await {
            self.go(&redirect).await;
            return SignOutOutcome::Sso { redirect };
        }

        self.clear_local();
        let redirect = self.login_path.clone();
        self.go(&redirect).await;
        SignOutOutcome::Local { redirect }
    }

    /// Provider branch. `None` means fall through to a local sign-out.
    async fn sign_out_sso(&self) -> Option<String> {
        if self.session.auth_method() != Some(AuthMethod::Sso) {
            return None;
        }
        let provider = self.sso.as_ref()?;

        match provider.status().await {
            Ok(SsoStatus::Authenticated) => {}
            Ok(SsoStatus::Unauthenticated) => {
                info!("[Auth] SSO session already gone, signing out locally");
                return None;
            }
            Err(e) => {
                warn!("[Auth] Could not query SSO status: {}", e);
                return None;
            }
        }

        self.clear_local();
        match provider.sign_out(&self.login_path).await {
            Ok(redirect) => {
                info!("[Auth] Signed out of SSO provider");
                Some(redirect)
            }
            Err(e) => {
                error!("[Auth] SSO sign-out failed: {}", e);
                None
            }
        }
    }

    fn clear_local(&self) {
        if let Err(e) = self.session.clear() {
            error!("[Auth] Failed to clear session: {}", e);
        }
    }

    async fn go(&self, target: &str) {
        if let Err(e) = self.navigator.navigate(target).await {
            error!("[Auth] Navigation to {} failed: {}", target, e);
        }
    }
}

impl fmt::Debug for AuthManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthManager")
            .field("session", &self.session)
            .field("sso", &self.sso.is_some())
            .field("login_path", &self.login_path)
            .finish()
    }
}
