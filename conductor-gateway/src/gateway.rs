//! The policy-enforcing outbound caller.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use conductor_adapters::{build_https_client_with, HttpClientConfig, HyperClient};
use conductor_policy::{CredentialStore, DomainPolicy};
use conductor_primitives::{OutcomeMeta, ToolOutcome};
use conductor_tools::{HttpBinding, RestTransport};
use hyper::body::to_bytes;
use hyper::header::CONTENT_TYPE;
use hyper::{Body, Request, Uri};
use serde_json::{Map, Value};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::{GatewayError, GatewayResult};
use crate::request::{classify, host_of, prepare};

/// Timeout applied to every outbound call unless overridden.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(15);

// TCP connect gets a tighter bound than the whole call so a black-holed host
// fails as a connect error, not a generic timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Takes dynamic-tool bindings to the network under the domain policy.
///
/// The gateway is the single egress point for dynamic tools: nothing leaves
/// the process without passing the allow-list, and every failure mode comes
/// back as a distinct, typed error that the transport seam folds into a
/// `success=false` envelope.
pub struct RestGateway {
    client: HyperClient,
    policy: DomainPolicy,
    credentials: Arc<dyn CredentialStore>,
    call_timeout: Duration,
}

impl fmt::Debug for RestGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestGateway")
            .field("approved_patterns", &self.policy.len())
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}

impl RestGateway {
    /// Creates a gateway over the given policy and credential store.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Configuration`] if the shared HTTPS client
    /// cannot be built.
    pub fn new(
        policy: DomainPolicy,
        credentials: Arc<dyn CredentialStore>,
    ) -> GatewayResult<Self> {
        let client =
            build_https_client_with(HttpClientConfig::new().with_connect_timeout(CONNECT_TIMEOUT))
                .map_err(|err| GatewayError::configuration(format!("https client: {err}")))?;
        Ok(Self {
            client,
            policy,
            credentials,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        })
    }

    /// Overrides the per-call timeout.
    #[must_use]
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Issues the bound request and classifies the response.
    ///
    /// # Errors
    ///
    /// Returns the typed [`GatewayError`] for every pre-flight and transport
    /// failure; a non-2xx upstream response is [`GatewayError::Status`].
    pub async fn call(
        &self,
        binding: &HttpBinding,
        params: &Map<String, Value>,
    ) -> GatewayResult<ToolOutcome> {
        let url = binding.url();
        let host = host_of(&url)
            .ok_or_else(|| GatewayError::configuration(format!("unparseable URL `{url}`")))?;

        let decision = self.policy.evaluate(&host);
        let Some(auth_rule) = decision.auth() else {
            warn!(%host, "rejected outbound call to unapproved domain");
            return Err(GatewayError::DomainNotAllowed { host });
        };

        let secret = match binding.credential() {
            Some(name) => Some(self.credentials.resolve(name).ok_or_else(|| {
                GatewayError::MissingCredential {
                    name: name.to_owned(),
                }
            })?),
            None => None,
        };
        let auth = secret.as_deref().map(|secret| (auth_rule, secret));

        let prepared = prepare(binding, params, auth)?;
        let uri: Uri = prepared
            .url
            .parse()
            .map_err(|err| GatewayError::configuration(format!("invalid URL: {err}")))?;

        let mut builder = Request::builder()
            .method(binding.method().as_str())
            .uri(uri);
        for (name, value) in &prepared.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let body = prepared.body.map_or_else(Body::empty, Body::from);
        let request = builder
            .body(body)
            .map_err(|err| GatewayError::transport(format!("failed to build request: {err}")))?;

        debug!(tool_url = %prepared.url, method = %binding.method(), "issuing outbound call");

        let response = timeout(self.call_timeout, self.client.request(request))
            .await
            .map_err(|_| GatewayError::Timeout {
                url: prepared.url.clone(),
                timeout: self.call_timeout,
            })?
            .map_err(|err| {
                if err.is_connect() {
                    GatewayError::Connect {
                        url: prepared.url.clone(),
                        reason: err.to_string(),
                    }
                } else {
                    GatewayError::transport(err.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let bytes = to_bytes(response.into_body())
            .await
            .map_err(|err| GatewayError::transport(format!("failed to read body: {err}")))?;

        classify(status, content_type.as_deref(), &bytes)
    }
}

#[async_trait]
impl RestTransport for RestGateway {
    async fn invoke(&self, binding: &HttpBinding, params: &Map<String, Value>) -> ToolOutcome {
        match self.call(binding, params).await {
            Ok(outcome) => outcome,
            Err(err) => envelope_from(&err),
        }
    }
}

/// Converts a gateway error into its failure envelope, keeping the status
/// code visible in metadata for upstream errors.
fn envelope_from(err: &GatewayError) -> ToolOutcome {
    let outcome = ToolOutcome::fail(err.to_string());
    if let GatewayError::Status { status, .. } = err {
        outcome.with_metadata(OutcomeMeta::default().with_status(*status))
    } else {
        outcome
    }
}
