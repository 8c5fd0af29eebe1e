//! HTTP wire types and the transport seam.
//!
//! # Design
//! Requests and responses are plain data. [`BillbeeClient`](crate::BillbeeClient)
//! builds an `HttpRequest` without touching the network and hands it to a
//! [`Transport`]; whatever comes back is decoded from an `HttpResponse`. The
//! default transport is blocking `ureq`; tests swap in a recording fake.
//!
//! A transport returns every HTTP status as data. Only failures that leave
//! no response at all are transport errors; a response whose body cannot be
//! read as text (not UTF-8, over the size limit) is a protocol error.

use std::fmt;
use std::time::Duration;

use crate::error::ApiError;

/// Upper bound for response bodies. Delivery notes and invoices can embed a
/// base64 PDF, which easily exceeds ureq's 10 MB default.
const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// POST is the only verb here that is unsafe to repeat blindly.
    pub fn is_idempotent(&self) -> bool {
        !matches!(self, HttpMethod::Post)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// `url` is absolute and already carries the encoded query string.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Executes one HTTP round-trip.
///
/// Implementations must hand back 4xx/5xx responses as `Ok` and reserve
/// `ApiError::Transport` for calls that produced no response. They must not
/// retry.
pub trait Transport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).send(request)
    }
}

/// Blocking transport backed by a shared `ureq::Agent` (and its connection
/// pool).
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let result = match (method, body) {
            (HttpMethod::Get, _) => with_headers(self.agent.get(&url), &headers).call(),
            (HttpMethod::Delete, _) => with_headers(self.agent.delete(&url), &headers).call(),
            (HttpMethod::Post, Some(body)) => {
                with_headers(self.agent.post(&url), &headers).send(body.as_bytes())
            }
            (HttpMethod::Post, None) => with_headers(self.agent.post(&url), &headers).send_empty(),
            (HttpMethod::Put, Some(body)) => {
                with_headers(self.agent.put(&url), &headers).send(body.as_bytes())
            }
            (HttpMethod::Put, None) => with_headers(self.agent.put(&url), &headers).send_empty(),
        };
        let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect();
        let bytes = match response.body_mut().with_config().limit(MAX_BODY_BYTES).read_to_vec() {
            Ok(bytes) => bytes,
            // The connection died mid-body: no complete response was obtained.
            Err(e @ (ureq::Error::Io(_) | ureq::Error::Timeout(_))) => {
                return Err(ApiError::Transport(format!("reading response body: {e}")));
            }
            Err(e) => return Err(unreadable_body(status, format!("reading response body: {e}"))),
        };
        let body = String::from_utf8(bytes)
            .map_err(|e| unreadable_body(status, format!("response body is not UTF-8: {e}")))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// A response arrived but its body cannot be turned into text. That is a
/// broken contract, reported the way the envelope decoder reports one.
fn unreadable_body(status: u16, message: String) -> ApiError {
    if (200..300).contains(&status) {
        ApiError::Decode { status, message }
    } else {
        ApiError::Http {
            status,
            body: message,
        }
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_post_is_non_idempotent() {
        assert!(HttpMethod::Get.is_idempotent());
        assert!(HttpMethod::Put.is_idempotent());
        assert!(HttpMethod::Delete.is_idempotent());
        assert!(!HttpMethod::Post.is_idempotent());
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = HttpRequest {
            method: HttpMethod::Get,
            url: "http://localhost/orders".to_string(),
            headers: vec![("X-Billbee-Api-Key".to_string(), "k".to_string())],
            body: None,
        };
        assert_eq!(req.header("x-billbee-api-key"), Some("k"));
        assert_eq!(req.header("authorization"), None);
    }

    #[test]
    fn success_range() {
        let mut resp = HttpResponse {
            status: 204,
            headers: Vec::new(),
            body: String::new(),
        };
        assert!(resp.is_success());
        resp.status = 404;
        assert!(!resp.is_success());
    }

    #[test]
    fn unreachable_host_is_a_transport_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let transport = UreqTransport::new(Duration::from_secs(2));
        let err = transport
            .send(HttpRequest {
                method: HttpMethod::Get,
                url: format!("http://127.0.0.1:{port}/orders"),
                headers: Vec::new(),
                body: None,
            })
            .unwrap_err();
        assert!(err.is_transport());
    }

    /// Serves one canned raw HTTP response on a random port.
    fn serve_once(head: &'static str, body: &'static [u8]) -> String {
        use std::io::{Read, Write};

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let reply = format!("{head}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n", body.len());
            stream.write_all(reply.as_bytes()).unwrap();
            stream.write_all(body).unwrap();
        });
        format!("http://{addr}/orders/1")
    }

    fn get(url: String) -> Result<HttpResponse, ApiError> {
        UreqTransport::new(Duration::from_secs(5)).send(HttpRequest {
            method: HttpMethod::Get,
            url,
            headers: Vec::new(),
            body: None,
        })
    }

    #[test]
    fn non_utf8_success_body_is_a_decode_error() {
        let url = serve_once("HTTP/1.1 200 OK", b"{\"Data\":\"\xff\xfe\"}");
        let err = get(url).unwrap_err();
        assert!(matches!(err, ApiError::Decode { status: 200, .. }), "{err:?}");
        assert!(err.is_protocol());
        assert!(!err.is_transport());
    }

    #[test]
    fn non_utf8_error_body_keeps_its_status() {
        let url = serve_once("HTTP/1.1 502 Bad Gateway", b"\xc3\x28");
        let err = get(url).unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 502, .. }), "{err:?}");
    }

    #[test]
    fn unreadable_body_follows_status_class() {
        assert!(matches!(
            unreadable_body(204, "x".to_string()),
            ApiError::Decode { status: 204, .. }
        ));
        assert!(matches!(
            unreadable_body(500, "x".to_string()),
            ApiError::Http { status: 500, .. }
        ));
    }
}
