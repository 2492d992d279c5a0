//! Global navigation guard.

use crate::session::SessionService;
use herd_http::ExecutionContext;

pub const LOGIN_PATH: &str = "/login";
pub const REGISTER_PATH: &str = "/register";
pub const FORGOT_PASSWORD_PATH: &str = "/forgot-password";
pub const LANDING_PATH: &str = "/dashboard";
/// Shared resources (QR code landing pages) readable without a session.
pub const PUBLIC_PREFIX: &str = "/public/";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    Redirect(String),
}

/// Decides client-side navigations from the stored token alone.
///
/// Runs on every navigation and never touches the network.
#[derive(Clone, Debug)]
pub struct RouteGuard {
    public_paths: Vec<String>,
    public_prefixes: Vec<String>,
    login_path: String,
    landing_path: String,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self {
            public_paths: vec![
                LOGIN_PATH.to_string(),
                REGISTER_PATH.to_string(),
                FORGOT_PASSWORD_PATH.to_string(),
            ],
            public_prefixes: vec![PUBLIC_PREFIX.to_string()],
            login_path: LOGIN_PATH.to_string(),
            landing_path: LANDING_PATH.to_string(),
        }
    }
}

/// Path component of a destination, without query or fragment.
fn route_path(destination: &str) -> &str {
    let end = destination
        .find(|c| c == '?' || c == '#')
        .unwrap_or(destination.len());
    &destination[..end]
}

impl RouteGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_public_path(mut self, path: impl Into<String>) -> Self {
        self.public_paths.push(path.into());
        self
    }

    pub fn with_public_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.public_prefixes.push(prefix.into());
        self
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn landing_path(&self) -> &str {
        &self.landing_path
    }

    pub fn is_public(&self, destination: &str) -> bool {
        let path = route_path(destination);
        self.public_paths.iter().any(|p| p == path)
            || self.public_prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }

    /// Paths an authenticated user is bounced away from.
    fn is_sign_in_page(&self, path: &str) -> bool {
        path == self.login_path || path == REGISTER_PATH
    }

    /// Pure decision from (token present, destination).
    pub fn evaluate(&self, has_token: bool, destination: &str) -> GuardDecision {
        let path = route_path(destination);
        if !has_token && !self.is_public(path) {
            return GuardDecision::Redirect(self.login_path.clone());
        }
        if has_token && self.is_sign_in_page(path) {
            return GuardDecision::Redirect(self.landing_path.clone());
        }
        GuardDecision::Proceed
    }

    /// Navigation hook. Server-rendered navigations always proceed.
    pub fn check(&self, session: &SessionService, to: &str, from: &str) -> GuardDecision {
        if session.context() == ExecutionContext::Server {
            return GuardDecision::Proceed;
        }
        let decision = self.evaluate(session.token().is_some(), to);
        if let GuardDecision::Redirect(target) = &decision {
            tracing::debug!("[Guard] {} -> {} redirected to {}", from, to, target);
        }
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::AuthMethod;
    use crate::storage::MemoryStore;
    use std::sync::Arc;

    fn redirect(path: &str) -> GuardDecision {
        GuardDecision::Redirect(path.to_string())
    }

    #[test]
    fn test_protected_without_token_goes_to_login() {
        let guard = RouteGuard::new();
        assert_eq!(guard.evaluate(false, "/dashboard"), redirect("/login"));
        assert_eq!(guard.evaluate(false, "/animals/12"), redirect("/login"));
        assert_eq!(guard.evaluate(false, "/"), redirect("/login"));
    }

    #[test]
    fn test_sign_in_pages_with_token_go_to_landing() {
        let guard = RouteGuard::new();
        assert_eq!(guard.evaluate(true, "/login"), redirect("/dashboard"));
        assert_eq!(guard.evaluate(true, "/register"), redirect("/dashboard"));
        assert_eq!(guard.evaluate(true, "/login?next=/animals"), redirect("/dashboard"));
    }

    #[test]
    fn test_public_without_token_proceeds() {
        let guard = RouteGuard::new();
        assert_eq!(guard.evaluate(false, "/public/abc123"), GuardDecision::Proceed);
        assert_eq!(guard.evaluate(false, "/login"), GuardDecision::Proceed);
        assert_eq!(guard.evaluate(false, "/register"), GuardDecision::Proceed);
        assert_eq!(guard.evaluate(false, "/forgot-password"), GuardDecision::Proceed);
        assert_eq!(guard.evaluate(false, "/public"), redirect("/login"));
    }

    #[test]
    fn test_protected_with_token_proceeds() {
        let guard = RouteGuard::new();
        assert_eq!(guard.evaluate(true, "/animals"), GuardDecision::Proceed);
        assert_eq!(guard.evaluate(true, "/forgot-password"), GuardDecision::Proceed);
        assert_eq!(guard.evaluate(true, "/public/abc123"), GuardDecision::Proceed);
    }

    #[test]
    fn test_extra_public_paths() {
        let guard = RouteGuard::new()
            .with_public_path("/reset-password")
            .with_public_prefix("/verify/");
        assert_eq!(guard.evaluate(false, "/reset-password?token=x"), GuardDecision::Proceed);
        assert_eq!(guard.evaluate(false, "/verify/42"), GuardDecision::Proceed);
    }

    #[test]
    fn test_check_reads_session() {
        let guard = RouteGuard::new();
        let session = SessionService::client(Arc::new(MemoryStore::new()));
        assert_eq!(guard.check(&session, "/dashboard", "/"), redirect("/login"));

        session.start("tok", "jane", AuthMethod::Credential).unwrap();
        assert_eq!(guard.check(&session, "/login", "/animals"), redirect("/dashboard"));
        assert_eq!(guard.check(&session, "/animals", "/dashboard"), GuardDecision::Proceed);
    }

    #[test]
    fn test_check_is_noop_on_server() {
        let guard = RouteGuard::new();
        let session = SessionService::server();
        assert_eq!(guard.check(&session, "/dashboard", "/"), GuardDecision::Proceed);
    }
}
