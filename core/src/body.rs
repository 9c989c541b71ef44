//! Request bodies and the rule that turns a selector's output into one.
//!
//! # Design
//! A body selector returns a `BodyValue`. Wire bodies (`Body`) are a closed
//! set of tags that transports know how to send as-is; they pass through
//! untouched. Anything else is carried as a `serde_json::Value`: a JSON string
//! is raw text and is attached as-is, other shapes are encoded to JSON text by
//! `assemble`. A JSON `null` counts as "no body".

use std::fmt;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use futures::stream::{BoxStream, Stream, StreamExt};
use serde::Serialize;
use serde_json::Value;

use crate::error::{BoxError, EndpointError};
use crate::headers::Headers;

pub const CONTENT_TYPE: &str = "content-type";
pub const APPLICATION_JSON: &str = "application/json";

/// Stream of body chunks.
pub type ByteStream = BoxStream<'static, Result<Bytes, BoxError>>;

/// Tag of a pass-through wire body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyKind {
    Text,
    Buffer,
    BufferView,
    Stream,
    Form,
    UrlEncoded,
}

/// A body that is sent exactly as given.
#[derive(Debug, Clone)]
pub enum Body {
    /// Raw text.
    Text(String),
    /// An owned binary buffer.
    Buffer(Bytes),
    /// A view into a larger buffer; shares the allocation it was sliced from.
    BufferView(Bytes),
    /// Binary stream, read at most once by the transport.
    Stream(BodyStream),
    /// Multipart form payload.
    Form(FormData),
    /// URL-encoded parameter set.
    UrlEncoded(UrlParams),
}

impl Body {
    pub fn kind(&self) -> BodyKind {
        match self {
            Body::Text(_) => BodyKind::Text,
            Body::Buffer(_) => BodyKind::Buffer,
            Body::BufferView(_) => BodyKind::BufferView,
            Body::Stream(_) => BodyKind::Stream,
            Body::Form(_) => BodyKind::Form,
            Body::UrlEncoded(_) => BodyKind::UrlEncoded,
        }
    }

    /// In-memory bytes of the body, if it has a byte representation without
    /// multipart framing or stream polling.
    pub fn as_bytes(&self) -> Option<Bytes> {
        match self {
            Body::Text(s) => Some(Bytes::copy_from_slice(s.as_bytes())),
            Body::Buffer(b) | Body::BufferView(b) => Some(b.clone()),
            Body::UrlEncoded(params) => Some(Bytes::from(params.encode())),
            Body::Stream(_) | Body::Form(_) => None,
        }
    }
}

impl PartialEq for Body {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Body::Text(a), Body::Text(b)) => a == b,
            (Body::Buffer(a), Body::Buffer(b)) => a == b,
            (Body::BufferView(a), Body::BufferView(b)) => a == b,
            (Body::Stream(a), Body::Stream(b)) => a.ptr_eq(b),
            (Body::Form(a), Body::Form(b)) => a == b,
            (Body::UrlEncoded(a), Body::UrlEncoded(b)) => a == b,
            _ => false,
        }
    }
}

/// A shared, take-once handle to a byte stream.
///
/// Clones refer to the same stream, so a request that is copied by a hook
/// still hands the original stream to the transport.
#[derive(Clone)]
pub struct BodyStream(Arc<Mutex<Option<ByteStream>>>);

impl BodyStream {
    pub fn new<S, E>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        let stream: ByteStream = stream
            .map(|chunk| chunk.map_err(Into::<BoxError>::into))
            .boxed();
        Self(Arc::new(Mutex::new(Some(stream))))
    }

    /// Take the stream out. Returns `None` once it has been taken.
    pub fn take(&self) -> Option<ByteStream> {
        match self.0.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }

    /// True when both handles refer to the same stream.
    pub fn ptr_eq(&self, other: &BodyStream) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for BodyStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyStream").finish_non_exhaustive()
    }
}

/// One part of a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File {
        filename: String,
        content_type: Option<String>,
        data: Bytes,
    },
}

/// Multipart form payload as ordered named parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    parts: Vec<(String, FormValue)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push((name.into(), FormValue::Text(value.into())));
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        filename: impl Into<String>,
        content_type: Option<&str>,
        data: impl Into<Bytes>,
    ) -> Self {
        self.parts.push((
            name.into(),
            FormValue::File {
                filename: filename.into(),
                content_type: content_type.map(str::to_string),
                data: data.into(),
            },
        ));
        self
    }

    pub fn parts(&self) -> &[(String, FormValue)] {
        &self.parts
    }
}

/// URL-encoded parameter set (`a=1&b=2`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlParams(Vec<(String, String)>);

impl UrlParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.push((name.into(), value.into()));
        self
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }

    /// `application/x-www-form-urlencoded` serialization.
    pub fn encode(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.0.iter())
            .finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for UrlParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl fmt::Display for UrlParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// What a body selector produces.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyValue {
    /// No body.
    None,
    /// A wire body, attached unchanged.
    Wire(Body),
    /// Any other shape. Strings are sent as raw text, the rest as JSON.
    Json(Value),
}

impl BodyValue {
    /// Serialize `value` into a JSON body value.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, EndpointError> {
        Ok(BodyValue::Json(serde_json::to_value(value)?))
    }
}

impl From<()> for BodyValue {
    fn from(_: ()) -> Self {
        BodyValue::None
    }
}

impl From<Body> for BodyValue {
    fn from(body: Body) -> Self {
        BodyValue::Wire(body)
    }
}

impl From<String> for BodyValue {
    fn from(text: String) -> Self {
        BodyValue::Wire(Body::Text(text))
    }
}

impl From<&str> for BodyValue {
    fn from(text: &str) -> Self {
        BodyValue::Wire(Body::Text(text.to_string()))
    }
}

impl From<Bytes> for BodyValue {
    fn from(bytes: Bytes) -> Self {
        BodyValue::Wire(Body::Buffer(bytes))
    }
}

impl From<Vec<u8>> for BodyValue {
    fn from(bytes: Vec<u8>) -> Self {
        BodyValue::Wire(Body::Buffer(Bytes::from(bytes)))
    }
}

impl From<BodyStream> for BodyValue {
    fn from(stream: BodyStream) -> Self {
        BodyValue::Wire(Body::Stream(stream))
    }
}

impl From<FormData> for BodyValue {
    fn from(form: FormData) -> Self {
        BodyValue::Wire(Body::Form(form))
    }
}

impl From<UrlParams> for BodyValue {
    fn from(params: UrlParams) -> Self {
        BodyValue::Wire(Body::UrlEncoded(params))
    }
}

impl From<Value> for BodyValue {
    fn from(value: Value) -> Self {
        BodyValue::Json(value)
    }
}

impl<T: Into<BodyValue>> From<Option<T>> for BodyValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(BodyValue::None, Into::into)
    }
}

/// Turn a selector's output into the outgoing body.
///
/// JSON bodies get `content-type: application/json` unless `headers` already
/// carries a content type; text and wire bodies never touch `headers`.
pub fn assemble(value: BodyValue, headers: &mut Headers) -> Result<Option<Body>, EndpointError> {
    match value {
        BodyValue::None | BodyValue::Json(Value::Null) => Ok(None),
        BodyValue::Wire(body) => Ok(Some(body)),
        BodyValue::Json(Value::String(text)) => Ok(Some(Body::Text(text))),
        BodyValue::Json(value) => {
            let text = serde_json::to_string(&value)?;
            if !headers.contains(CONTENT_TYPE) {
                headers.insert(CONTENT_TYPE, APPLICATION_JSON);
            }
            Ok(Some(Body::Text(text)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_body() {
        let mut headers = Headers::new();
        assert_eq!(assemble(BodyValue::None, &mut headers).unwrap(), None);
        assert_eq!(assemble(Value::Null.into(), &mut headers).unwrap(), None);
        assert_eq!(assemble(None::<String>.into(), &mut headers).unwrap(), None);
        assert!(headers.is_empty());
    }

    #[test]
    fn wire_bodies_pass_through_without_headers() {
        let buffer = Bytes::from_static(b"\x00\x01\x02");
        let view = Bytes::from_static(b"0123456789").slice(2..5);
        let wires = vec![
            Body::Text("plain".to_string()),
            Body::Buffer(buffer),
            Body::BufferView(view),
            Body::Form(FormData::new().text("a", "1")),
            Body::UrlEncoded(UrlParams::new().append("q", "x y")),
        ];
        for wire in wires {
            let mut headers = Headers::new();
            let body = assemble(wire.clone().into(), &mut headers).unwrap();
            assert_eq!(body, Some(wire));
            assert!(headers.is_empty());
        }
    }

    #[test]
    fn stream_passes_through_by_identity() {
        let stream = BodyStream::new(futures::stream::iter(vec![Ok::<_, BoxError>(
            Bytes::from_static(b"chunk"),
        )]));
        let mut headers = Headers::new();
        let body = assemble(stream.clone().into(), &mut headers).unwrap();
        match body {
            Some(Body::Stream(out)) => assert!(out.ptr_eq(&stream)),
            other => panic!("expected stream body, got {other:?}"),
        }
    }

    #[test]
    fn json_value_is_encoded() {
        let mut headers = Headers::new();
        let body = assemble(json!({"login": "a", "n": 1}).into(), &mut headers).unwrap();
        assert_eq!(body, Some(Body::Text(r#"{"login":"a","n":1}"#.to_string())));
        assert_eq!(headers.get("Content-Type"), Some(APPLICATION_JSON));
    }

    #[test]
    fn json_string_is_raw_text() {
        let mut headers = Headers::new();
        let body = assemble(json!("hello").into(), &mut headers).unwrap();
        assert_eq!(body, Some(Body::Text("hello".to_string())));
        assert!(headers.is_empty());

        let body = assemble(json!("{not json}").into(), &mut headers).unwrap();
        assert_eq!(body, Some(Body::Text("{not json}".to_string())));
        assert!(headers.is_empty());
    }

    #[test]
    fn json_does_not_override_existing_content_type() {
        let mut headers = Headers::from([("Content-Type", "application/vnd.api+json")]);
        assemble(json!([1, 2]).into(), &mut headers).unwrap();
        assert_eq!(headers.get("content-type"), Some("application/vnd.api+json"));
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn serializable_struct_becomes_json() {
        #[derive(Serialize)]
        struct Login<'a> {
            login: &'a str,
        }
        let value = BodyValue::json(&Login { login: "me" }).unwrap();
        assert_eq!(value, BodyValue::Json(json!({"login": "me"})));
    }

    #[test]
    fn url_params_encode() {
        let params: UrlParams = [("q", "a b"), ("x", "&")].into_iter().collect();
        assert_eq!(params.encode(), "q=a+b&x=%26");
        assert_eq!(
            Body::UrlEncoded(params).as_bytes().unwrap(),
            Bytes::from_static(b"q=a+b&x=%26")
        );
    }

    #[test]
    fn stream_can_be_taken_once() {
        let stream = BodyStream::new(futures::stream::empty::<Result<Bytes, BoxError>>());
        let clone = stream.clone();
        assert!(clone.take().is_some());
        assert!(stream.take().is_none());
    }
}
