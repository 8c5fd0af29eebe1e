//! Response envelope decoding.
//!
//! # Design
//! Every response of the order API is wrapped in the same object:
//!
//! ```json
//! {"Paging": {...}, "ErrorMessage": null, "ErrorCode": 0, "ErrorDescription": null, "Data": ...}
//! ```
//!
//! [`Envelope<T>`] mirrors that object for any payload type. Which payload is
//! expected, and whether paging applies, is chosen by an [`EnvelopeFormat`]:
//! [`Record`] for single records, [`List`] for paged sequences, [`Void`] when
//! only the error state matters and [`Untyped`] for loosely shaped replies.
//!
//! Bodies are decoded regardless of HTTP status, since the service reports
//! business errors inside the envelope. A body that is not an envelope is a
//! protocol failure: `ApiError::Http` for non-2xx statuses, `ApiError::Decode`
//! otherwise. It is never turned into an empty envelope.

use std::marker::PhantomData;

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ApiError, BusinessError};
use crate::http::HttpResponse;

const ENVELOPE_KEYS: [&str; 5] = ["Data", "ErrorMessage", "ErrorCode", "ErrorDescription", "Paging"];

/// Paging metadata of a listing response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PageInfo {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_rows: u64,
    #[serde(default)]
    pub page_size: u32,
}

/// Whether the remote service accepted the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStatus {
    Success,
    Rejected,
}

/// The uniform result wrapper returned by every call.
///
/// A present payload does not imply success; check [`Envelope::status`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Envelope<T> {
    pub paging: Option<PageInfo>,
    pub error_message: Option<String>,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub error_code: i32,
    pub error_description: Option<String>,
    pub data: Option<T>,
    /// HTTP status the envelope arrived with.
    #[serde(skip)]
    pub http_status: u16,
}

impl<T> Envelope<T> {
    /// An envelope carrying nothing but an HTTP status, used for empty
    /// 2xx replies to void calls.
    pub fn empty(http_status: u16) -> Self {
        Self {
            paging: None,
            error_message: None,
            error_code: 0,
            error_description: None,
            data: None,
            http_status,
        }
    }

    pub fn status(&self) -> EnvelopeStatus {
        let has_message = self
            .error_message
            .as_deref()
            .is_some_and(|m| !m.trim().is_empty());
        if has_message || self.error_code != 0 || !(200..300).contains(&self.http_status) {
            EnvelopeStatus::Rejected
        } else {
            EnvelopeStatus::Success
        }
    }

    pub fn is_success(&self) -> bool {
        self.status() == EnvelopeStatus::Success
    }

    /// Error and message texts reported by the service, blanks skipped.
    pub fn messages(&self) -> Vec<&str> {
        [&self.error_message, &self.error_description]
            .into_iter()
            .filter_map(|m| m.as_deref())
            .filter(|m| !m.trim().is_empty())
            .collect()
    }

    pub fn business_error(&self) -> Option<BusinessError> {
        if self.is_success() {
            return None;
        }
        let description = self.error_description.clone().or_else(|| {
            (!(200..300).contains(&self.http_status)).then(|| format!("HTTP status {}", self.http_status))
        });
        Some(BusinessError {
            code: self.error_code,
            message: self.error_message.clone(),
            description,
        })
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    /// Payload of a successful call, or the rejection.
    pub fn into_data(self) -> Result<Option<T>, BusinessError> {
        match self.business_error() {
            Some(err) => Err(err),
            None => Ok(self.data),
        }
    }

    pub fn map_data<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        Envelope {
            paging: self.paging,
            error_message: self.error_message,
            error_code: self.error_code,
            error_description: self.error_description,
            data: self.data.map(f),
            http_status: self.http_status,
        }
    }
}

fn null_as_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    Ok(Option::<i32>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decode a response body into an envelope for payload `T`.
pub fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<Envelope<T>, ApiError> {
    let protocol_error = |message: String| {
        if response.is_success() {
            ApiError::Decode {
                status: response.status,
                message,
            }
        } else {
            ApiError::Http {
                status: response.status,
                body: response.body.clone(),
            }
        }
    };

    let value: serde_json::Value =
        serde_json::from_str(&response.body).map_err(|e| protocol_error(e.to_string()))?;
    let is_envelope = value
        .as_object()
        .is_some_and(|obj| ENVELOPE_KEYS.iter().any(|k| obj.contains_key(*k)));
    if !is_envelope {
        return Err(protocol_error("body is not a response envelope".to_string()));
    }

    let mut envelope: Envelope<T> =
        serde_json::from_value(value).map_err(|e| protocol_error(e.to_string()))?;
    envelope.http_status = response.status;

    if let Some(err) = envelope.business_error() {
        tracing::warn!(
            http.status_code = response.status,
            error_code = err.code,
            error = %err,
            "call rejected by remote service"
        );
    }
    Ok(envelope)
}

/// Selects the payload type and paging handling for a call.
pub trait EnvelopeFormat {
    type Output;

    fn decode(response: &HttpResponse) -> Result<Self::Output, ApiError>;
}

/// A single record. Paging is never reported.
#[derive(Debug)]
pub struct Record<T>(PhantomData<fn() -> T>);

impl<T: DeserializeOwned> EnvelopeFormat for Record<T> {
    type Output = Envelope<T>;

    fn decode(response: &HttpResponse) -> Result<Self::Output, ApiError> {
        let mut envelope = decode::<T>(response)?;
        envelope.paging = None;
        Ok(envelope)
    }
}

/// A paged sequence of records.
#[derive(Debug)]
pub struct List<T>(PhantomData<fn() -> T>);

impl<T: DeserializeOwned> EnvelopeFormat for List<T> {
    type Output = Envelope<Vec<T>>;

    fn decode(response: &HttpResponse) -> Result<Self::Output, ApiError> {
        decode::<Vec<T>>(response)
    }
}

/// Calls whose payload is discarded; only the error state is surfaced.
#[derive(Debug)]
pub struct Void;

impl EnvelopeFormat for Void {
    type Output = Envelope<()>;

    fn decode(response: &HttpResponse) -> Result<Self::Output, ApiError> {
        if response.is_success() && response.body.trim().is_empty() {
            return Ok(Envelope::empty(response.status));
        }
        let mut envelope = decode::<IgnoredAny>(response)?.map_data(|_| ());
        envelope.paging = None;
        envelope.data = None;
        Ok(envelope)
    }
}

/// Loosely shaped replies, kept as a JSON document.
#[derive(Debug)]
pub struct Untyped;

impl EnvelopeFormat for Untyped {
    type Output = Envelope<serde_json::Value>;

    fn decode(response: &HttpResponse) -> Result<Self::Output, ApiError> {
        decode::<serde_json::Value>(response)
    }
}
