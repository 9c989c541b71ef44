//! The send pipeline: hooks around a caller-supplied transport.
//!
//! # Design
//! `Middleware` pairs a `Transport` with an immutable `HookSequences`. A send
//! runs in a fixed order: `on_created` hooks, dispatch, `on_success` hooks.
//! Any error along the way is folded through the `on_failure` hooks and then
//! returned; failure hooks can swap the error but never turn it into a
//! success. `on_settled` hooks run exactly once per send whichever way it
//! went. Dispatch is the only await point; hooks are synchronous.
//!
//! Settle hooks must not panic. A panicking settle hook unwinds out of `send`
//! and hides the outcome of the request.

use std::future::Future;
use std::sync::Arc;

use crate::endpoint::Endpoint;
use crate::error::{BoxError, EndpointError, Phase};
use crate::hooks::{HookSequences, Hooks};
use crate::http::{HttpResponse, Request};
use crate::path::PathValues;

/// Executes one request against the network.
///
/// Implementations report HTTP error statuses as ordinary responses and
/// reserve `Err` for requests that could not be completed at all.
pub trait Transport: Send + Sync {
    fn fetch(
        &self,
        request: Request,
    ) -> impl Future<Output = Result<HttpResponse, BoxError>> + Send;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn fetch(
        &self,
        request: Request,
    ) -> impl Future<Output = Result<HttpResponse, BoxError>> + Send {
        (**self).fetch(request)
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn fetch(
        &self,
        request: Request,
    ) -> impl Future<Output = Result<HttpResponse, BoxError>> + Send {
        (**self).fetch(request)
    }
}

/// A transport wrapped in ordered hook sequences.
#[derive(Debug, Clone)]
pub struct Middleware<T> {
    transport: T,
    hooks: Arc<HookSequences>,
}

impl<T: Transport> Middleware<T> {
    /// A middleware with no hooks.
    pub fn new(transport: T) -> Self {
        Self::create(transport, Hooks::new())
    }

    pub fn create(transport: T, hooks: Hooks) -> Self {
        Self {
            transport,
            hooks: Arc::new(HookSequences::create(hooks)),
        }
    }

    /// A new middleware running `existing`'s hooks first, then `hooks`.
    pub fn extend_from(existing: &Self, hooks: Hooks) -> Self
    where
        T: Clone,
    {
        existing.extend(hooks)
    }

    /// A new middleware running this middleware's hooks first, then `hooks`.
    pub fn extend(&self, hooks: Hooks) -> Self
    where
        T: Clone,
    {
        Self {
            transport: self.transport.clone(),
            hooks: Arc::new(self.hooks.extend(hooks)),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn hooks(&self) -> &HookSequences {
        &self.hooks
    }

    /// Run `request` through the hooks and the transport.
    pub async fn send(&self, request: Request) -> Result<HttpResponse, EndpointError> {
        let outcome = match self.dispatch(request).await {
            Ok(response) => Ok(response),
            Err(error) => {
                let error = self.hooks.run_failure(error);
                tracing::warn!(
                    error = %error,
                    hooks = self.hooks.len(Phase::Failure),
                    "request failed"
                );
                Err(error)
            }
        };
        self.hooks.run_settled();
        outcome
    }

    async fn dispatch(&self, request: Request) -> Result<HttpResponse, EndpointError> {
        let request = self.hooks.run_created(request)?;
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            hooks = self.hooks.len(Phase::Created),
            "dispatching request"
        );
        let response = self
            .transport
            .fetch(request)
            .await
            .map_err(EndpointError::Transport)?;
        tracing::debug!(status = response.status, "transport returned");
        self.hooks.run_success(response)
    }

    /// Build a request from `endpoint`, send it and decode the JSON body.
    ///
    /// The decoder sees the body of every response, whatever its status; an
    /// empty body decodes from `null`. Use `error_status_hooks` to fail on
    /// non-2xx responses instead.
    pub async fn call<A, O, P>(
        &self,
        endpoint: &Endpoint<A, O>,
        params: &P,
        args: A,
    ) -> Result<O, EndpointError>
    where
        P: PathValues + ?Sized,
    {
        let request = endpoint.to_request(params, args)?;
        let response = self.send(request).await?;
        let raw = response.json()?;
        Ok(endpoint.to_validation(&raw)?)
    }
}
