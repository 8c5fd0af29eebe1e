//! Request dispatch for the Billbee order API.
//!
//! # Design
//! `BillbeeClient` owns the immutable [`ApiConfig`] and a [`Transport`]. A
//! call goes through three steps:
//!
//! 1. [`prepare`](BillbeeClient::prepare) turns a [`Target`] into a plain
//!    [`HttpRequest`] (URL, query string, auth headers, body). No I/O.
//! 2. [`execute`](BillbeeClient::execute) hands that request to the transport
//!    and returns the raw response, whatever its status.
//! 3. [`call`](BillbeeClient::call) decodes the response with the target's
//!    [`EnvelopeFormat`].
//!
//! Nothing is retried: creation calls are not idempotent, so retry policy
//! belongs to the caller.

use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::{debug, instrument, warn, Span};

use crate::config::ApiConfig;
use crate::envelope::EnvelopeFormat;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::orders::OrderEndpoint;
use crate::target::Target;

pub const API_KEY_HEADER: &str = "X-Billbee-Api-Key";

/// Client for the order API.
///
/// Cheap to clone; clones share configuration and transport.
pub struct BillbeeClient<X = UreqTransport> {
    config: Arc<ApiConfig>,
    transport: Arc<X>,
    authorization: Arc<str>,
}

impl<X> Clone for BillbeeClient<X> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            transport: Arc::clone(&self.transport),
            authorization: Arc::clone(&self.authorization),
        }
    }
}

impl<X> fmt::Debug for BillbeeClient<X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BillbeeClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl BillbeeClient<UreqTransport> {
    /// Client using a blocking `ureq` transport with the configured timeout.
    pub fn new(config: ApiConfig) -> Self {
        let transport = UreqTransport::new(config.timeout());
        Self::with_transport(config, transport)
    }
}

impl<X: Transport> BillbeeClient<X> {
    pub fn with_transport(config: ApiConfig, transport: X) -> Self {
        let credentials = format!("{}:{}", config.username(), config.password());
        let authorization = format!("Basic {}", STANDARD.encode(credentials));
        Self {
            config: Arc::new(config),
            transport: Arc::new(transport),
            authorization: authorization.into(),
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn transport(&self) -> &X {
        &self.transport
    }

    /// Order endpoints.
    pub fn orders(&self) -> OrderEndpoint<'_, X> {
        OrderEndpoint::new(self)
    }

    /// Build the outbound request for `target` without sending it.
    pub fn prepare<F>(&self, target: &Target<F>) -> HttpRequest {
        let mut url = format!("{}{}", self.config.base_url(), target.path);
        if let Some(params) = &target.params {
            url.push('?');
            url.push_str(&params.encode());
        }

        let mut headers = vec![
            (API_KEY_HEADER.to_string(), self.config.api_key().to_string()),
            ("Authorization".to_string(), self.authorization.to_string()),
            ("Accept".to_string(), "application/json".to_string()),
        ];
        if target.body.is_some() {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }

        HttpRequest {
            method: target.method,
            url,
            headers,
            body: target.body.clone(),
        }
    }

    /// Send `target` and return the raw response. Non-2xx statuses are
    /// returned, not raised.
    #[instrument(
        name = "billbee_request",
        skip(self, target),
        fields(
            http.method = %target.method,
            http.url = tracing::field::Empty,
            http.status_code = tracing::field::Empty,
        )
    )]
    pub fn execute<F>(&self, target: &Target<F>) -> Result<HttpResponse, ApiError> {
        let request = self.prepare(target);
        Span::current().record("http.url", request.url.as_str());
        debug!(has_body = request.body.is_some(), "dispatching request");

        let response = self.transport.send(request).inspect_err(|e| {
            warn!(error = %e, "transport failure");
        })?;

        Span::current().record("http.status_code", response.status);
        debug!(bytes = response.body.len(), "response received");
        Ok(response)
    }

    /// Send `target` and decode the reply into its envelope.
    pub fn call<F: EnvelopeFormat>(&self, target: Target<F>) -> Result<F::Output, ApiError> {
        let response = self.execute(&target)?;
        F::decode(&response)
    }
}
