//! Path templates with `{name}` placeholders.
//!
//! # Design
//! A template is split on `/` once, when it is created. A segment that is
//! exactly `{identifier}` is a parameter; every other segment is kept
//! verbatim. Substitution walks the parsed segments and looks each parameter
//! up in a `PathValues` source, failing fast on the first missing name rather
//! than embedding a placeholder in the URL. Keys the template does not name
//! are ignored.
//!
//! Values are inserted verbatim, with no percent-encoding. They must already
//! be URL-safe: a value containing `/`, `?`, `#` or a space changes the shape
//! of the resulting URL. Encode such values before passing them in.

use std::borrow::{Borrow, Cow};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hash};

use serde_json::Value;

use crate::error::EndpointError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A parsed path template such as `/api/v1/thing/{id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
    names: Vec<String>,
}

impl PathTemplate {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let segments: Vec<Segment> = raw.split('/').map(parse_segment).collect();

        let mut names: Vec<String> = Vec::new();
        for segment in &segments {
            if let Segment::Param(name) = segment {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }

        Self {
            raw,
            segments,
            names,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Distinct parameter names in left-to-right order.
    pub fn parameter_names(&self) -> &[String] {
        &self.names
    }

    /// Replace every parameter segment with its value from `values`.
    ///
    /// Values are not percent-encoded; see the module docs.
    pub fn substitute<P: PathValues + ?Sized>(&self, values: &P) -> Result<String, EndpointError> {
        let mut parts: Vec<Cow<'_, str>> = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => parts.push(Cow::Borrowed(text.as_str())),
                Segment::Param(name) => {
                    let value =
                        values
                            .path_value(name)
                            .ok_or_else(|| EndpointError::MissingParameter {
                                name: name.clone(),
                                template: self.raw.clone(),
                            })?;
                    parts.push(Cow::Owned(value.into_owned()));
                }
            }
        }
        Ok(parts.join("/"))
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for PathTemplate {
    fn from(raw: &str) -> Self {
        PathTemplate::new(raw)
    }
}

impl From<String> for PathTemplate {
    fn from(raw: String) -> Self {
        PathTemplate::new(raw)
    }
}

fn parse_segment(segment: &str) -> Segment {
    let name = segment
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .filter(|name| is_identifier(name));
    match name {
        Some(name) => Segment::Param(name.to_string()),
        None => Segment::Literal(segment.to_string()),
    }
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Join `path` onto `base` with exactly one `/` between them.
pub fn join_url(base: &str, path: &str) -> String {
    let base = base.strip_suffix('/').unwrap_or(base);
    let path = path.strip_prefix('/').unwrap_or(path);
    format!("{base}/{path}")
}

/// A source of path parameter values, looked up by name.
pub trait PathValues {
    fn path_value(&self, name: &str) -> Option<Cow<'_, str>>;
}

/// No parameters at all.
impl PathValues for () {
    fn path_value(&self, _name: &str) -> Option<Cow<'_, str>> {
        None
    }
}

impl<K: AsRef<str>, V: fmt::Display> PathValues for [(K, V)] {
    fn path_value(&self, name: &str) -> Option<Cow<'_, str>> {
        self.iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| Cow::Owned(v.to_string()))
    }
}

impl<K: AsRef<str>, V: fmt::Display, const N: usize> PathValues for [(K, V); N] {
    fn path_value(&self, name: &str) -> Option<Cow<'_, str>> {
        self.as_slice().path_value(name)
    }
}

impl<K: AsRef<str>, V: fmt::Display> PathValues for Vec<(K, V)> {
    fn path_value(&self, name: &str) -> Option<Cow<'_, str>> {
        self.as_slice().path_value(name)
    }
}

impl<K, V, S> PathValues for HashMap<K, V, S>
where
    K: Borrow<str> + Hash + Eq,
    V: fmt::Display,
    S: BuildHasher,
{
    fn path_value(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).map(|v| Cow::Owned(v.to_string()))
    }
}

impl<K, V> PathValues for BTreeMap<K, V>
where
    K: Borrow<str> + Ord,
    V: fmt::Display,
{
    fn path_value(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).map(|v| Cow::Owned(v.to_string()))
    }
}

/// JSON objects; strings are used unquoted, `null` counts as missing.
impl PathValues for serde_json::Map<String, Value> {
    fn path_value(&self, name: &str) -> Option<Cow<'_, str>> {
        match self.get(name)? {
            Value::Null => None,
            Value::String(s) => Some(Cow::Borrowed(s.as_str())),
            other => Some(Cow::Owned(other.to_string())),
        }
    }
}

impl<P: PathValues + ?Sized> PathValues for &P {
    fn path_value(&self, name: &str) -> Option<Cow<'_, str>> {
        (**self).path_value(name)
    }
}
