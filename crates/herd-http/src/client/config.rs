//! Transport configuration for the herd API client.

/// Configuration for the herd API client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Request timeout in milliseconds. `0` keeps the transport default.
    pub request_timeout_ms: u64,
    /// Connection timeout in seconds. `0` keeps the transport default.
    pub connection_timeout_secs: u64,
    /// User agent sent with every request.
    pub user_agent: String,
    /// Log every outgoing request at debug level.
    pub enable_logging: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            request_timeout_ms: 0,
            connection_timeout_secs: 0,
            user_agent: concat!("herd-http/", env!("CARGO_PKG_VERSION")).to_string(),
            enable_logging: true,
        }
    }
}
