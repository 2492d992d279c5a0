//! Execution context and base address policy.
//!
//! The server-side renderer and the browser reach the API over different
//! network paths: the server process talks to the internal service name on
//! the container network, the browser talks to the public address.

/// Internal service address, reachable only from the server process.
pub const INTERNAL_API_URL: &str = "http://traceability_api:8000/api/v1";

/// Public address used by clients when none is configured.
pub const LOCAL_API_URL: &str = "http://localhost:8000/api/v1";

/// Where the calling code is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExecutionContext {
    /// Server-side rendering process. Has no client storage.
    Server,
    /// Browser / end-user process. Owns the persistent session store.
    Client,
}

impl ExecutionContext {
    #[inline]
    pub fn is_server(self) -> bool {
        matches!(self, ExecutionContext::Server)
    }

    #[inline]
    pub fn is_client(self) -> bool {
        matches!(self, ExecutionContext::Client)
    }
}

/// Two-address policy keyed on [`ExecutionContext`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddressPolicy {
    internal: String,
    public: Option<String>,
}

impl Default for AddressPolicy {
    fn default() -> Self {
        Self {
            internal: INTERNAL_API_URL.to_string(),
            public: None,
        }
    }
}

impl AddressPolicy {
    /// Policy with an optionally configured public address. Blank values
    /// count as unset.
    pub fn new(public: Option<String>) -> Self {
        Self {
            public: public.and_then(normalize),
            ..Default::default()
        }
    }

    /// Override the internal address (tests, non-container deployments).
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        if let Some(internal) = normalize(internal.into()) {
            self.internal = internal;
        }
        self
    }

    pub fn public(&self) -> Option<&str> {
        self.public.as_deref()
    }

    pub fn internal(&self) -> &str {
        &self.internal
    }

    /// Base address for the given context.
    pub fn resolve(&self, context: ExecutionContext) -> String {
        match context {
            ExecutionContext::Server => self.internal.clone(),
            ExecutionContext::Client => self
                .public
                .clone()
                .unwrap_or_else(|| LOCAL_API_URL.to_string()),
        }
    }
}

fn normalize(url: String) -> Option<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
