//! Immutable endpoint definitions and their copy-on-write builder.
//!
//! # Design
//! An endpoint is a plain configuration record: optional base URL, path
//! template, method, header provider, body selector, extra transport options
//! and output decoder. Every field sits behind an `Arc`, so a builder call
//! clones the record, replaces one field and leaves the receiver untouched
//! while unaffected fields stay shared.
//!
//! `EndpointBuilder<A, O>` and `Endpoint<A, O>` are generic over the body
//! selector's argument type `A` (usually a tuple of positional arguments) and
//! the decoder's output type `O`. `expects` and `returns` change those types;
//! the other builder calls keep them.
//!
//! Headers compose in two modes. `headers` takes a static mapping and merges
//! it on top of whatever the previous provider returns, last write wins.
//! `headers_with` takes a factory, drops the previous provider and calls the
//! factory fresh for every request (for timestamps, tokens and the like).

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::body::{self, BodyValue};
use crate::decode::{DecodeFailure, Decoder, Json};
use crate::error::{BoxError, EndpointError};
use crate::headers::Headers;
use crate::http::{Method, Request, RequestInit, RequestOptions};
use crate::path::{self, PathTemplate, PathValues};

type HeaderProvider = Arc<dyn Fn() -> Headers + Send + Sync>;
type BodySelector<A> = Arc<dyn Fn(A) -> Result<BodyValue, BoxError> + Send + Sync>;
type SharedDecoder<O> = Arc<dyn Decoder<Output = O>>;

struct Config<A, O> {
    base: Option<Arc<str>>,
    template: Arc<PathTemplate>,
    method: Method,
    headers: HeaderProvider,
    selector: BodySelector<A>,
    options: Arc<RequestOptions>,
    decoder: SharedDecoder<O>,
}

// Derived `Clone` would require `A: Clone` and `O: Clone`.
impl<A, O> Clone for Config<A, O> {
    fn clone(&self) -> Self {
        Self {
            base: self.base.clone(),
            template: Arc::clone(&self.template),
            method: self.method,
            headers: Arc::clone(&self.headers),
            selector: Arc::clone(&self.selector),
            options: Arc::clone(&self.options),
            decoder: Arc::clone(&self.decoder),
        }
    }
}

impl<A, O> Config<A, O> {
    fn fmt_fields(&self, name: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(name)
            .field("base", &self.base)
            .field("template", &self.template.as_str())
            .field("method", &self.method)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Config<(), Value> {
    fn empty() -> Self {
        Self {
            base: None,
            template: Arc::new(PathTemplate::new("")),
            method: Method::Get,
            headers: Arc::new(Headers::new),
            selector: Arc::new(|()| Ok::<_, BoxError>(BodyValue::None)),
            options: Arc::new(RequestOptions::new()),
            decoder: Arc::new(Json::<Value>::new()),
        }
    }
}

/// Fluent builder for endpoints. Every method returns a new builder.
pub struct EndpointBuilder<A = (), O = Value> {
    config: Config<A, O>,
}

impl EndpointBuilder<(), Value> {
    /// Empty builder: no base URL, empty path, `GET`, no headers, no body,
    /// identity decoder.
    pub fn new() -> Self {
        Self {
            config: Config::empty(),
        }
    }
}

impl Default for EndpointBuilder<(), Value> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, O> Clone for EndpointBuilder<A, O> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
        }
    }
}

impl<A, O> fmt::Debug for EndpointBuilder<A, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.config.fmt_fields("EndpointBuilder", f)
    }
}

impl<A, O> EndpointBuilder<A, O> {
    fn with(&self, update: impl FnOnce(&mut Config<A, O>)) -> Self {
        let mut config = self.config.clone();
        update(&mut config);
        Self { config }
    }

    /// Replace the base URL the path is joined onto.
    pub fn base_url(&self, base: impl Into<String>) -> Self {
        let base: Arc<str> = Arc::from(base.into());
        self.with(|c| c.base = Some(base))
    }

    /// Replace the path template.
    pub fn url(&self, template: impl Into<PathTemplate>) -> Self {
        let template = Arc::new(template.into());
        self.with(|c| c.template = template)
    }

    /// Replace the HTTP method.
    pub fn method(&self, method: Method) -> Self {
        self.with(|c| c.method = method)
    }

    /// Merge `headers` over the previous provider's result.
    pub fn headers(&self, headers: impl Into<Headers>) -> Self {
        let previous = Arc::clone(&self.config.headers);
        let extra: Headers = headers.into();
        self.with(|c| c.headers = Arc::new(move || previous().merge(extra.clone())))
    }

    /// Replace the header provider with `factory`, called on every request.
    pub fn headers_with<F, H>(&self, factory: F) -> Self
    where
        F: Fn() -> H + Send + Sync + 'static,
        H: Into<Headers>,
    {
        self.with(|c| c.headers = Arc::new(move || -> Headers { factory().into() }))
    }

    /// Shallow-merge extra transport options; `extra` wins on conflicts.
    pub fn options<I, K, V>(&self, extra: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut options = RequestOptions::clone(&self.config.options);
        for (key, value) in extra {
            options.insert(key.into(), value.into());
        }
        let options = Arc::new(options);
        self.with(|c| c.options = options)
    }

    /// Replace the body selector. `A2` becomes the argument type callers pass
    /// to `to_request_init` and `to_request`.
    pub fn expects<A2, B, F>(&self, selector: F) -> EndpointBuilder<A2, O>
    where
        F: Fn(A2) -> B + Send + Sync + 'static,
        B: Into<BodyValue>,
    {
        self.with_selector(Arc::new(move |args: A2| -> Result<BodyValue, BoxError> {
            Ok(selector(args).into())
        }))
    }

    /// Replace the body selector with one that can fail. Errors surface as
    /// `EndpointError::BodySelector`.
    pub fn try_expects<A2, B, E, F>(&self, selector: F) -> EndpointBuilder<A2, O>
    where
        F: Fn(A2) -> Result<B, E> + Send + Sync + 'static,
        B: Into<BodyValue>,
        E: Into<BoxError>,
    {
        self.with_selector(Arc::new(move |args: A2| -> Result<BodyValue, BoxError> {
            selector(args).map(Into::into).map_err(Into::into)
        }))
    }

    fn with_selector<A2>(&self, selector: BodySelector<A2>) -> EndpointBuilder<A2, O> {
        let c = &self.config;
        EndpointBuilder {
            config: Config {
                base: c.base.clone(),
                template: Arc::clone(&c.template),
                method: c.method,
                headers: Arc::clone(&c.headers),
                selector,
                options: Arc::clone(&c.options),
                decoder: Arc::clone(&c.decoder),
            },
        }
    }

    /// Replace the output decoder.
    pub fn returns<D>(&self, decoder: D) -> EndpointBuilder<A, D::Output>
    where
        D: Decoder + 'static,
    {
        let c = &self.config;
        EndpointBuilder {
            config: Config {
                base: c.base.clone(),
                template: Arc::clone(&c.template),
                method: c.method,
                headers: Arc::clone(&c.headers),
                selector: Arc::clone(&c.selector),
                options: Arc::clone(&c.options),
                decoder: Arc::new(decoder),
            },
        }
    }

    /// Decode responses into `T` with serde.
    pub fn returns_json<T: DeserializeOwned + 'static>(&self) -> EndpointBuilder<A, T> {
        self.returns(Json::<T>::new())
    }

    /// Freeze the configuration into an endpoint.
    pub fn build(&self) -> Endpoint<A, O> {
        Endpoint {
            config: self.config.clone(),
        }
    }
}

/// An immutable, reusable description of one HTTP operation.
pub struct Endpoint<A = (), O = Value> {
    config: Config<A, O>,
}

impl Endpoint<(), Value> {
    /// Start a builder rooted at `base`.
    pub fn base(base: impl Into<String>) -> EndpointBuilder<(), Value> {
        EndpointBuilder::new().base_url(base)
    }

    /// Start a builder for `template` with no base URL.
    pub fn url(template: impl Into<PathTemplate>) -> EndpointBuilder<(), Value> {
        EndpointBuilder::new().url(template)
    }
}

impl<A, O> Clone for Endpoint<A, O> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
        }
    }
}

impl<A, O> fmt::Debug for Endpoint<A, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.config.fmt_fields("Endpoint", f)
    }
}

impl<A, O> Endpoint<A, O> {
    pub fn method(&self) -> Method {
        self.config.method
    }

    pub fn template(&self) -> &PathTemplate {
        &self.config.template
    }

    pub fn base_url(&self) -> Option<&str> {
        self.config.base.as_deref()
    }

    /// Concrete URL for `params`, joined onto the base URL when one is set.
    pub fn to_url<P: PathValues + ?Sized>(&self, params: &P) -> Result<String, EndpointError> {
        let path = self.config.template.substitute(params)?;
        Ok(match &self.config.base {
            Some(base) => path::join_url(base, &path),
            None => path,
        })
    }

    /// Method, headers, body and options for one call. No I/O happens here.
    pub fn to_request_init(&self, args: A) -> Result<RequestInit, EndpointError> {
        let value = (self.config.selector)(args).map_err(EndpointError::BodySelector)?;
        let mut headers = (self.config.headers)();
        let body = body::assemble(value, &mut headers)?;
        Ok(RequestInit {
            method: self.config.method,
            headers,
            body,
            options: RequestOptions::clone(&self.config.options),
        })
    }

    /// A request bound to the URL for `params`, with a body built from `args`.
    pub fn to_request<P: PathValues + ?Sized>(
        &self,
        params: &P,
        args: A,
    ) -> Result<Request, EndpointError> {
        let url = self.to_url(params)?;
        let init = self.to_request_init(args)?;
        tracing::debug!(method = %init.method, url = %url, "built request");
        Ok(Request::new(url, init))
    }

    /// Run the output decoder over `raw`, returning its result unchanged.
    pub fn to_validation(&self, raw: &Value) -> Result<O, DecodeFailure> {
        self.config.decoder.decode(raw)
    }

    /// A builder seeded with this endpoint's configuration.
    pub fn to_builder(&self) -> EndpointBuilder<A, O> {
        EndpointBuilder {
            config: self.config.clone(),
        }
    }
}
