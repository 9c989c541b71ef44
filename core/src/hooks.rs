//! Ordered hook sequences for the request pipeline.
//!
//! # Design
//! Each phase is a plain `Vec` of shared hook functions applied as a left
//! fold: a hook sees the value produced by the previous hook and may return a
//! replacement (`Some`) or leave it alone (`None`). Sequences only ever grow by
//! appending, and `extend` builds a new value instead of touching the target,
//! so one `HookSequences` can back any number of concurrent sends.

use std::fmt;
use std::sync::Arc;

use crate::error::{BoxError, EndpointError, Phase};
use crate::http::{HttpResponse, Request};

/// Runs before dispatch; may replace the request.
pub type OnCreated = Arc<dyn Fn(&Request) -> Result<Option<Request>, BoxError> + Send + Sync>;
/// Runs after a successful dispatch; may replace the response.
pub type OnSuccess =
    Arc<dyn Fn(&HttpResponse) -> Result<Option<HttpResponse>, BoxError> + Send + Sync>;
/// Runs on any failure; may replace the error but cannot suppress it.
pub type OnFailure = Arc<dyn Fn(&EndpointError) -> Option<EndpointError> + Send + Sync>;
/// Runs once per send on every path. Must not panic.
pub type OnSettled = Arc<dyn Fn() + Send + Sync>;

/// A partial set of hooks, at most one per phase.
#[derive(Clone, Default)]
pub struct Hooks {
    on_created: Option<OnCreated>,
    on_success: Option<OnSuccess>,
    on_failure: Option<OnFailure>,
    on_settled: Option<OnSettled>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_created<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Request) -> Result<Option<Request>, BoxError> + Send + Sync + 'static,
    {
        self.on_created = Some(Arc::new(hook));
        self
    }

    pub fn on_success<F>(mut self, hook: F) -> Self
    where
        F: Fn(&HttpResponse) -> Result<Option<HttpResponse>, BoxError> + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(hook));
        self
    }

    pub fn on_failure<F>(mut self, hook: F) -> Self
    where
        F: Fn(&EndpointError) -> Option<EndpointError> + Send + Sync + 'static,
    {
        self.on_failure = Some(Arc::new(hook));
        self
    }

    pub fn on_settled<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_settled = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("on_created", &self.on_created.is_some())
            .field("on_success", &self.on_success.is_some())
            .field("on_failure", &self.on_failure.is_some())
            .field("on_settled", &self.on_settled.is_some())
            .finish()
    }
}

/// Four ordered hook sequences, one per phase.
#[derive(Clone, Default)]
pub struct HookSequences {
    on_created: Vec<OnCreated>,
    on_success: Vec<OnSuccess>,
    on_failure: Vec<OnFailure>,
    on_settled: Vec<OnSettled>,
}

impl HookSequences {
    /// Zero-or-one-element sequences from a partial set.
    pub fn create(hooks: Hooks) -> Self {
        Self::default().extend(hooks)
    }

    /// A new set with `hooks` appended after this set's hooks, phase by phase.
    pub fn extend(&self, hooks: Hooks) -> Self {
        let mut next = self.clone();
        next.on_created.extend(hooks.on_created);
        next.on_success.extend(hooks.on_success);
        next.on_failure.extend(hooks.on_failure);
        next.on_settled.extend(hooks.on_settled);
        next
    }

    /// Number of hooks registered for `phase`.
    pub fn len(&self, phase: Phase) -> usize {
        match phase {
            Phase::Created => self.on_created.len(),
            Phase::Success => self.on_success.len(),
            Phase::Failure => self.on_failure.len(),
            Phase::Settled => self.on_settled.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.on_created.is_empty()
            && self.on_success.is_empty()
            && self.on_failure.is_empty()
            && self.on_settled.is_empty()
    }

    pub(crate) fn run_created(&self, request: Request) -> Result<Request, EndpointError> {
        self.on_created.iter().try_fold(request, |request, hook| {
            match hook(&request) {
                Ok(Some(replacement)) => Ok(replacement),
                Ok(None) => Ok(request),
                Err(source) => Err(EndpointError::Hook {
                    phase: Phase::Created,
                    source,
                }),
            }
        })
    }

    pub(crate) fn run_success(&self, response: HttpResponse) -> Result<HttpResponse, EndpointError> {
        self.on_success.iter().try_fold(response, |response, hook| {
            match hook(&response) {
                Ok(Some(replacement)) => Ok(replacement),
                Ok(None) => Ok(response),
                Err(source) => Err(EndpointError::Hook {
                    phase: Phase::Success,
                    source,
                }),
            }
        })
    }

    pub(crate) fn run_failure(&self, error: EndpointError) -> EndpointError {
        self.on_failure
            .iter()
            .fold(error, |error, hook| hook(&error).unwrap_or(error))
    }

    pub(crate) fn run_settled(&self) {
        for hook in &self.on_settled {
            hook();
        }
    }
}

impl From<Hooks> for HookSequences {
    fn from(hooks: Hooks) -> Self {
        HookSequences::create(hooks)
    }
}

impl fmt::Debug for HookSequences {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookSequences")
            .field("on_created", &self.on_created.len())
            .field("on_success", &self.on_success.len())
            .field("on_failure", &self.on_failure.len())
            .field("on_settled", &self.on_settled.len())
            .finish()
    }
}

/// Hooks that record every phase as `tracing` events.
pub fn logging_hooks() -> Hooks {
    Hooks::new()
        .on_created(|request| {
            tracing::info!(method = %request.method, url = %request.url, "sending request");
            Ok(None)
        })
        .on_success(|response| {
            tracing::info!(
                status = response.status,
                bytes = response.body.len(),
                "received response"
            );
            Ok(None)
        })
        .on_failure(|error| {
            tracing::warn!(error = %error, "request failed");
            None
        })
        .on_settled(|| tracing::debug!("request settled"))
}

/// Hooks that reject non-2xx responses with `EndpointError::Status`.
///
/// The rejection happens in the success phase, so callers get
/// `EndpointError::Hook` with the status error as its source, and failure
/// hooks see it first.
pub fn error_status_hooks() -> Hooks {
    Hooks::new().on_success(|response| {
        if response.is_success() {
            return Ok(None);
        }
        Err(EndpointError::Status {
            status: response.status,
            body: response.text(),
        }
        .into())
    })
}
