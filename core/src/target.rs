//! Call descriptors.
//!
//! A [`Target`] fully determines one call: verb, path below the base URL,
//! optional query parameters, optional JSON body and, as a type parameter,
//! the [`EnvelopeFormat`](crate::envelope::EnvelopeFormat) the reply is
//! decoded with. It is built per call and consumed by
//! [`BillbeeClient::call`](crate::BillbeeClient::call).

use std::marker::PhantomData;

use serde::Serialize;

use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::params::CallParams;

#[derive(Debug)]
pub struct Target<F> {
    pub method: HttpMethod,
    /// Path below the base URL, identifiers already embedded.
    pub path: String,
    pub params: Option<CallParams>,
    /// Serialized JSON document.
    pub body: Option<String>,
    format: PhantomData<fn() -> F>,
}

impl<F> Target<F> {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: None,
            body: None,
            format: PhantomData,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Attach query parameters. An empty collection leaves the URL bare.
    pub fn with_params(mut self, params: CallParams) -> Self {
        self.params = (!params.is_empty()).then_some(params);
        self
    }

    pub fn with_json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let json = serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
        self.body = Some(json);
        Ok(self)
    }
}
