//! Typed HTTP endpoint definitions and a hook pipeline around them.
//!
//! # Overview
//! An `Endpoint` is an immutable description of one HTTP operation: path
//! template, method, headers, a body selector over typed arguments and a
//! decoder for the response payload. It builds `Request` values and validates
//! response payloads without touching the network (host-does-IO pattern).
//! A `Middleware` runs built requests through ordered hooks and a
//! caller-supplied `Transport`.
//!
//! # Design
//! - `EndpointBuilder` is copy-on-write: every call returns a new builder and
//!   leaves the receiver as it was, so one base definition can seed many.
//! - Path parameters are checked at call time; a missing one is an error,
//!   never a placeholder in the URL.
//! - Selector output is classified once: wire bodies and strings pass
//!   through, everything else is encoded as JSON.
//! - Hooks are plain ordered lists folded left, with failure hooks able to
//!   replace but not swallow an error.
//!
//! ```ignore
//! use endpoint_core::{Endpoint, Method};
//! use serde_json::json;
//!
//! let login = Endpoint::base("https://api.example.com/")
//!     .headers([("Content-Type", "application/json")])
//!     .url("api/v1/thing/{id}")
//!     .method(Method::Post)
//!     .expects(|(login, password): (String, String)| json!({"login": login, "password": password}))
//!     .build();
//!
//! let request = login.to_request(&[("id", "42")], ("user@x.com".into(), "secret".into()))?;
//! ```

pub mod body;
pub mod decode;
pub mod endpoint;
pub mod error;
pub mod headers;
pub mod hooks;
pub mod http;
pub mod middleware;
pub mod path;

pub use body::{Body, BodyKind, BodyStream, BodyValue, FormData, FormValue, UrlParams};
pub use decode::{DecodeFailure, Decoder, Json};
pub use endpoint::{Endpoint, EndpointBuilder};
pub use error::{BoxError, EndpointError, Phase};
pub use headers::Headers;
pub use hooks::{error_status_hooks, logging_hooks, HookSequences, Hooks};
pub use http::{HttpResponse, Method, Request, RequestInit, RequestOptions};
pub use middleware::{Middleware, Transport};
pub use path::{join_url, PathTemplate, PathValues};
