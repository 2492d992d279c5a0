//! The request dispatcher.

use crate::client::config::ClientConfig;
use crate::client::native_network::NativeNetwork;
use crate::context::{AddressPolicy, ExecutionContext};
use crate::endpoints::{BodyShape, Call, Operation};
use crate::error::{HttpError, Result};
use crate::traits::{ApiNetwork, TokenSource};
use crate::types::{ApiFailure, DispatchRequest, DispatchResult, MultipartForm};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Single choke point for calls to the herd API.
///
/// The base address is resolved once, from the [`ExecutionContext`] the
/// client is built for. Every public call returns a [`DispatchResult`];
/// failures are logged and normalized, never propagated.
#[derive(Clone)]
pub struct ApiClient {
    network: Arc<dyn ApiNetwork>,
    context: ExecutionContext,
    base_url: String,
    tokens: Option<Arc<dyn TokenSource>>,
    config: Arc<ClientConfig>,
}

impl ApiClient {
    pub fn new(policy: &AddressPolicy, context: ExecutionContext) -> Result<Self> {
        Self::with_config(policy, context, ClientConfig::default())
    }

    pub fn with_config(
        policy: &AddressPolicy,
        context: ExecutionContext,
        config: ClientConfig,
    ) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if config.request_timeout_ms > 0 {
            builder = builder.timeout(std::time::Duration::from_millis(config.request_timeout_ms));
        }
        if config.connection_timeout_secs > 0 {
            builder = builder
                .connect_timeout(std::time::Duration::from_secs(config.connection_timeout_secs));
        }
        let client = builder
            .build()
            .map_err(|e| HttpError::Config(e.to_string()))?;

        Ok(ApiClient {
            network: Arc::new(NativeNetwork::new(client)),
            context,
            base_url: policy.resolve(context),
            tokens: None,
            config: Arc::new(config),
        })
    }

    /// Client over an arbitrary network, e.g. a test double.
    pub fn with_network(
        network: Arc<dyn ApiNetwork>,
        policy: &AddressPolicy,
        context: ExecutionContext,
    ) -> Self {
        ApiClient {
            network,
            context,
            base_url: policy.resolve(context),
            tokens: None,
            config: Arc::new(ClientConfig::default()),
        }
    }

    /// Attach the source of the bearer credential.
    pub fn with_token_source(mut self, tokens: Arc<dyn TokenSource>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn context(&self) -> ExecutionContext {
        self.context
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send a request and normalize the outcome.
    pub async fn dispatch(&self, request: DispatchRequest, fallback: &str) -> DispatchResult {
        let method = request.method;
        let endpoint = request.endpoint.clone();
        match self.try_dispatch(request).await {
            Ok(data) => Ok(data),
            Err(e) => Err(self.fail(method.as_str(), &endpoint, &e, fallback)),
        }
    }

    async fn try_dispatch(&self, request: DispatchRequest) -> Result<Value> {
        // client storage does not exist on the server
        let token = match self.context {
            ExecutionContext::Client => self.tokens.as_ref().and_then(|t| t.bearer_token()),
            ExecutionContext::Server => None,
        };
        let outgoing = request.prepare(&self.base_url, token.as_deref())?;

        if self.config.enable_logging {
            tracing::debug!(
                "[HerdHTTP-Out] {} {} authorized={}",
                outgoing.method,
                outgoing.url,
                outgoing.header("authorization").is_some()
            );
        }

        let method = outgoing.method;
        let url = outgoing.url.clone();
        let response = self.network.send(outgoing).await?;

        if !response.is_success() {
            return Err(HttpError::Status {
                method: method.to_string(),
                url,
                status: response.status,
                body: response.body,
            });
        }

        Ok(response.parsed_body())
    }

    fn fail(&self, method: &str, endpoint: &str, error: &HttpError, fallback: &str) -> ApiFailure {
        tracing::error!("[HerdHTTP] {} {} failed: {}", method, endpoint, error);
        ApiFailure::from_error(error, fallback)
    }

    /// Invoke a named operation from the endpoint table.
    ///
    /// Link operations do not touch the network; they yield their download
    /// address as a JSON string.
    pub async fn call(&self, operation: Operation, call: Call) -> DispatchResult {
        let endpoint = operation.endpoint();
        if endpoint.body == BodyShape::Link {
            return self.link(operation, &call).map(Value::String);
        }
        match endpoint.request(call) {
            Ok(request) => self.dispatch(request, endpoint.fallback).await,
            Err(e) => Err(self.fail(
                endpoint.method.as_str(),
                endpoint.path,
                &e,
                endpoint.fallback,
            )),
        }
    }

    /// [`ApiClient::call`] with the payload deserialized into `T`.
    pub async fn call_as<T: DeserializeOwned>(
        &self,
        operation: Operation,
        call: Call,
    ) -> DispatchResult<T> {
        let fallback = operation.endpoint().fallback;
        let value = self.call(operation, call).await?;
        serde_json::from_value(value)
            .map_err(|e| self.fail("DECODE", operation.name(), &HttpError::Json(e), fallback))
    }

    /// Absolute address of a downloadable resource.
    pub fn link(&self, operation: Operation, call: &Call) -> DispatchResult<String> {
        let endpoint = operation.endpoint();
        endpoint
            .render(call)
            .map(|path| format!("{}{}", self.base_url, path))
            .map_err(|e| self.fail("LINK", endpoint.path, &e, endpoint.fallback))
    }

    /// Exchange credentials for a token. Sends a URL-encoded form.
    pub async fn login(&self, username: &str, password: &str) -> DispatchResult {
        self.call(
            Operation::Login,
            Call::new().form([("username", username), ("password", password)]),
        )
        .await
    }

    pub async fn register(&self, payload: Value) -> DispatchResult {
        self.call(Operation::Register, Call::new().json(payload)).await
    }

    /// Attach a document to an animal.
    pub async fn upload_document(&self, animal_id: i64, form: MultipartForm) -> DispatchResult {
        self.call(
            Operation::UploadDocument,
            Call::new().param("id", animal_id).multipart(form),
        )
        .await
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("context", &self.context)
            .field("base_url", &self.base_url)
            .field("authorized", &self.tokens.is_some())
            .finish()
    }
}
