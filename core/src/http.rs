//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. Endpoints
//! build `Request` values and decode `HttpResponse` values without ever
//! touching the network; a caller-supplied `Transport` executes the actual
//! I/O. This keeps the core deterministic and easy to test.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::body::Body;
use crate::error::EndpointError;
use crate::headers::Headers;

/// Extra transport options (everything except body, method and headers).
pub type RequestOptions = Map<String, Value>;

/// HTTP method for a request.
///
/// `Get`, `Head` and `Options` are query-safe; the rest mutate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Head,
    Options,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub const ALL: [Method; 7] = [
        Method::Get,
        Method::Head,
        Method::Options,
        Method::Post,
        Method::Put,
        Method::Patch,
        Method::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    /// True for methods that only query the server.
    pub fn is_safe(&self) -> bool {
        matches!(self, Method::Get | Method::Head | Method::Options)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = EndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| EndpointError::UnknownMethod(s.to_string()))
    }
}

/// Everything needed to issue a request except the URL.
///
/// Produced by `Endpoint::to_request_init`.
#[derive(Debug, Clone, Default)]
pub struct RequestInit {
    pub method: Method,
    pub headers: Headers,
    pub body: Option<Body>,
    pub options: RequestOptions,
}

/// A request bound to a concrete URL; the unit handed to a `Transport`.
#[derive(Debug, Clone)]
pub struct Request {
    pub url: String,
    pub method: Method,
    pub headers: Headers,
    pub body: Option<Body>,
    pub options: RequestOptions,
}

impl Request {
    pub fn new(url: impl Into<String>, init: RequestInit) -> Self {
        let RequestInit {
            method,
            headers,
            body,
            options,
        } = init;
        Self {
            url: url.into(),
            method,
            headers,
            body,
            options,
        }
    }

    /// Split back into URL and init, e.g. to rebuild a modified request.
    pub fn into_parts(self) -> (String, RequestInit) {
        (
            self.url,
            RequestInit {
                method: self.method,
                headers: self.headers,
                body: self.body,
                options: self.options,
            },
        )
    }
}

/// An HTTP response described as plain data.
///
/// Constructed by a `Transport` after executing a `Request`. The body is held
/// as `Bytes`, so reading it through `text` or `json` never consumes it.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as UTF-8 text, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body parsed as JSON. An empty body reads as `null`.
    pub fn json(&self) -> Result<Value, EndpointError> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&self.body).map_err(EndpointError::ResponseBody)
    }
}
