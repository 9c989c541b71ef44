//! Error types for endpoint construction and the hook pipeline.
//!
//! # Design
//! A single `EndpointError` enum covers every way a call can fail, from
//! configuration-time problems (a missing path parameter, a failing body
//! selector) to dispatch problems (transport errors, failing hooks, unexpected
//! status codes). Decode failures are the exception: `Endpoint::to_validation`
//! returns them as a plain `DecodeFailure` value, and only `Middleware::call`
//! lifts them into `EndpointError::Decode`.

use std::fmt;

use crate::decode::DecodeFailure;

/// Boxed error used for caller-supplied failures (transport, selectors, hooks).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Pipeline phase a hook belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Created,
    Success,
    Failure,
    Settled,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Created => "on_created",
            Phase::Success => "on_success",
            Phase::Failure => "on_failure",
            Phase::Settled => "on_settled",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by endpoint and middleware operations.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    /// A parameter named in the path template had no value.
    #[error("missing path parameter `{name}` for template `{template}`")]
    MissingParameter { name: String, template: String },

    /// The configured body selector failed while computing the body.
    #[error("body selector failed: {0}")]
    BodySelector(#[source] BoxError),

    /// A JSON body could not be serialized.
    #[error("failed to encode request body as JSON: {0}")]
    BodyEncoding(#[from] serde_json::Error),

    /// A method name outside the supported set.
    #[error("unknown HTTP method `{0}`")]
    UnknownMethod(String),

    /// The transport rejected the request.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    /// An `on_created` or `on_success` hook failed.
    #[error("{phase} hook failed: {source}")]
    Hook {
        phase: Phase,
        #[source]
        source: BoxError,
    },

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not valid JSON.
    #[error("response body is not valid JSON: {0}")]
    ResponseBody(#[source] serde_json::Error),

    /// The response payload did not match the endpoint's decoder.
    #[error(transparent)]
    Decode(#[from] DecodeFailure),

    /// Replacement error produced by a failure hook.
    #[error(transparent)]
    Other(BoxError),
}

impl EndpointError {
    /// Wrap an arbitrary transport failure.
    pub fn transport(err: impl Into<BoxError>) -> Self {
        EndpointError::Transport(err.into())
    }

    /// Wrap an arbitrary error, typically as a failure-hook replacement.
    pub fn other(err: impl Into<BoxError>) -> Self {
        EndpointError::Other(err.into())
    }

    pub fn is_missing_parameter(&self) -> bool {
        matches!(self, EndpointError::MissingParameter { .. })
    }
}
