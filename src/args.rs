//! Call arguments shared by every resource operation.
//!
//! An operation takes an optional path segment, an optional document body, a
//! query object and request headers. [`Args`] collects them either through the
//! builder methods or by sniffing a positional list of JSON values, which is
//! what the CLI and the `invoke` entry points use.

use std::collections::BTreeMap;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS, NON_ALPHANUMERIC};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Characters escaped by `encodeURI`: reserved delimiters such as `/`, `,`,
/// `:` and `?` pass through.
const URI: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Characters escaped by `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub(crate) fn encode_uri(input: &str) -> String {
    utf8_percent_encode(input, URI).to_string()
}

pub(crate) fn encode_component(input: &str) -> String {
    utf8_percent_encode(input, URI_COMPONENT).to_string()
}

/// JSON truthiness: `null`, `false`, `0`, `""` and absent values are falsy.
/// Arrays and objects are truthy even when empty.
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Render a JSON value the way it appears in a path or query string.
pub(crate) fn render(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::Array(items) => items.iter().map(render).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// A path segment, or a list of segments joined with `,`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathArg(Vec<String>);

impl PathArg {
    pub fn parts(&self) -> &[String] {
        &self.0
    }

    pub fn joined(&self) -> String {
        self.0.join(",")
    }
}

impl From<&str> for PathArg {
    fn from(value: &str) -> Self {
        PathArg(vec![value.to_string()])
    }
}

impl From<String> for PathArg {
    fn from(value: String) -> Self {
        PathArg(vec![value])
    }
}

impl From<&String> for PathArg {
    fn from(value: &String) -> Self {
        PathArg(vec![value.clone()])
    }
}

impl From<Vec<String>> for PathArg {
    fn from(value: Vec<String>) -> Self {
        PathArg(value)
    }
}

impl From<Vec<&str>> for PathArg {
    fn from(value: Vec<&str>) -> Self {
        PathArg(value.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for PathArg {
    fn from(value: &[&str]) -> Self {
        PathArg(value.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for PathArg {
    fn from(value: [&str; N]) -> Self {
        PathArg(value.iter().map(|s| s.to_string()).collect())
    }
}

/// Normalised arguments of one call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    /// Already URI-encoded.
    path: Option<String>,
    body: Option<Value>,
    query: Map<String, Value>,
    headers: BTreeMap<String, String>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the path segment. Lists are joined with `,`.
    pub fn path(mut self, path: impl Into<PathArg>) -> Self {
        let joined = path.into().joined();
        self.path = (!joined.is_empty()).then(|| encode_uri(&joined));
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Build arguments from positional values ordered
    /// `[path], [doc], [query], [headers]`.
    ///
    /// A leading array or truthy scalar is taken as the path. Anything else
    /// stays in place: a leading object fills the body or query slot, and a
    /// leading falsy value fills it as "empty". With `with_doc` set, an object
    /// body without an explicit path lends its `_id` (or `id`) as the path.
    pub fn from_values(values: Vec<Value>, with_doc: bool) -> Result<Self> {
        let mut rest = values.into_iter().peekable();
        let mut args = Args::new();

        let leading = match rest.peek() {
            Some(Value::Array(items)) => Some(render_list(items)),
            Some(value) if truthy(value) && !value.is_object() => Some(render(value)),
            _ => None,
        };
        if let Some(path) = leading {
            rest.next();
            if !path.is_empty() {
                args.path = Some(encode_uri(&path));
            }
        }

        if with_doc {
            args.body = rest.next().filter(truthy);
        }

        match rest.next() {
            Some(Value::Object(query)) => args.query = query,
            Some(other) if truthy(&other) => {
                return Err(Error::invalid_argument(format!(
                    "query must be an object, got {other}"
                )))
            }
            _ => {}
        }

        match rest.next() {
            Some(Value::Object(headers)) => {
                args.headers = headers.iter().map(|(k, v)| (k.clone(), render(v))).collect();
            }
            Some(other) if truthy(&other) => {
                return Err(Error::invalid_argument(format!(
                    "headers must be an object, got {other}"
                )))
            }
            _ => {}
        }

        if let Some(extra) = rest.next() {
            return Err(Error::invalid_argument(format!("unexpected argument {extra}")));
        }

        if with_doc && args.path.is_none() {
            if let Some(Value::Object(doc)) = &args.body {
                let id = ["_id", "id"]
                    .iter()
                    .filter_map(|key| doc.get(*key))
                    .find(|v| truthy(v));
                if let Some(id) = id {
                    args.path = Some(encode_component(&render(id)));
                }
            }
        }

        Ok(args)
    }

    /// The encoded path segment, or `""`.
    pub fn segment(&self) -> &str {
        self.path.as_deref().unwrap_or("")
    }

    pub fn document(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn query_map(&self) -> &Map<String, Value> {
        &self.query
    }

    pub fn header_map(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Query parameters rendered as strings.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.query
            .iter()
            .map(|(k, v)| (k.clone(), render(v)))
            .collect()
    }

    /// Replace the path with an already-encoded route.
    pub(crate) fn route(mut self, route: impl Into<String>) -> Self {
        let route = route.into();
        self.path = (!route.is_empty()).then_some(route);
        self
    }

    pub(crate) fn take_body(&mut self) -> Option<Value> {
        self.body.take()
    }
}

fn render_list(items: &[Value]) -> String {
    items.iter().map(render).collect::<Vec<_>>().join(",")
}
