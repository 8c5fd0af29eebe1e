//! Error types for the Billbee order API client.
//!
//! # Design
//! Transport failures (nothing came back) and protocol failures (something came
//! back that is not an envelope) get separate variants so callers can tell a
//! dead network from a broken contract. Business rejections are normally
//! returned as data inside [`Envelope`](crate::Envelope); the `Business`
//! variant only exists so callers can lift them into an error with `?`.

use std::fmt;

use thiserror::Error;

/// Errors returned by the client, its transports and its decoders.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No HTTP response was obtained (connection refused, DNS, timeout).
    #[error("transport failed: {0}")]
    Transport(String),

    /// A non-2xx response whose body is not a parseable envelope.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// A 2xx response whose body does not match the envelope schema.
    #[error("could not decode response (HTTP {status}): {message}")]
    Decode { status: u16, message: String },

    /// Arguments rejected before anything was sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The client configuration is incomplete or malformed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The remote service rejected the call inside a well-formed envelope.
    #[error("rejected by remote service: {0}")]
    Business(BusinessError),
}

impl ApiError {
    /// `true` when the call never produced an HTTP response.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }

    /// `true` when a response arrived but could not be read as an envelope.
    pub fn is_protocol(&self) -> bool {
        matches!(self, ApiError::Http { .. } | ApiError::Decode { .. })
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        ApiError::InvalidArgument(msg.into())
    }
}

impl From<BusinessError> for ApiError {
    fn from(err: BusinessError) -> Self {
        ApiError::Business(err)
    }
}

/// A rejection reported by the remote service inside a well-formed envelope,
/// e.g. an unknown order id or a failed validation on order creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusinessError {
    pub code: i32,
    pub message: Option<String>,
    pub description: Option<String>,
}

impl fmt::Display for BusinessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.message, &self.description) {
            (Some(msg), Some(desc)) => write!(f, "{msg} ({desc}), code {}", self.code),
            (Some(msg), None) => write!(f, "{msg}, code {}", self.code),
            (None, Some(desc)) => write!(f, "{desc}, code {}", self.code),
            (None, None) => write!(f, "error code {}", self.code),
        }
    }
}

impl std::error::Error for BusinessError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_and_protocol_are_distinct() {
        let transport = ApiError::Transport("connection refused".to_string());
        let http = ApiError::Http {
            status: 502,
            body: "bad gateway".to_string(),
        };
        let decode = ApiError::Decode {
            status: 200,
            message: "expected value".to_string(),
        };
        assert!(transport.is_transport() && !transport.is_protocol());
        assert!(http.is_protocol() && !http.is_transport());
        assert!(decode.is_protocol());
    }

    #[test]
    fn business_error_display() {
        let err = BusinessError {
            code: 0,
            message: Some("Order not found".to_string()),
            description: None,
        };
        assert_eq!(err.to_string(), "Order not found, code 0");
        let wrapped: ApiError = err.into();
        assert_eq!(
            wrapped.to_string(),
            "rejected by remote service: Order not found, code 0"
        );
    }
}
