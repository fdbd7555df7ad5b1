//! Request dispatch shared by the client, index and type resources.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::transport::{Credentials, Method, Transport, TransportRequest};
use crate::args::{encode_component, Args};
use crate::error::Result;
use crate::response::Reply;

const JSON: &str = "application/json";
const NDJSON: &str = "application/x-ndjson";

/// A location in the service (root, index or type) plus everything needed
/// to send requests below it.
#[derive(Clone)]
pub struct Endpoint {
    root: String,
    prefix: String,
    credentials: Option<Credentials>,
    default_headers: BTreeMap<String, String>,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("root", &self.root)
            .field("prefix", &self.prefix)
            .field("credentials", &self.credentials)
            .field("default_headers", &self.default_headers)
            .finish_non_exhaustive()
    }
}

impl Endpoint {
    pub(crate) fn new(
        root: impl Into<String>,
        credentials: Option<Credentials>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            root: root.into(),
            prefix: String::new(),
            credentials,
            default_headers: BTreeMap::new(),
            transport,
        }
    }

    pub(crate) fn with_default_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.default_headers = headers;
        self
    }

    /// Endpoint one level down, named by an unencoded segment.
    pub(crate) fn child(&self, name: &str) -> Endpoint {
        let mut child = self.clone();
        if !name.is_empty() {
            child.prefix = format!("{}/{}", self.prefix, encode_component(name));
        }
        child
    }

    /// Full URI of this endpoint.
    pub fn uri(&self) -> String {
        format!("{}{}", self.root, self.prefix)
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Turn call arguments into a transport request without sending it.
    ///
    /// Bodies are serialised to JSON, except below `_bulk`, where a string
    /// body is already newline-delimited JSON and goes out as is.
    pub fn prepare(&self, method: Method, mut args: Args) -> Result<TransportRequest> {
        let path = match args.segment() {
            "" => self.prefix.clone(),
            segment => format!("{}/{}", self.prefix, segment),
        };
        let bulk = path.ends_with("/_bulk");

        let body = match args.take_body() {
            None => None,
            Some(Value::String(raw)) if bulk => Some(raw).filter(|raw| !raw.is_empty()),
            Some(value) => Some(serde_json::to_string(&value)?),
        };

        let mut headers = self.default_headers.clone();
        headers.extend(
            args.header_map()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        if !headers.keys().any(|k| k.eq_ignore_ascii_case("content-type")) {
            let content_type = if bulk { NDJSON } else { JSON };
            headers.insert("Content-Type".to_string(), content_type.to_string());
        }

        Ok(TransportRequest {
            method,
            root: self.root.clone(),
            path,
            query: args.query_pairs(),
            headers,
            body,
            credentials: self.credentials.clone(),
        })
    }

    /// Send a request and normalise the response.
    pub async fn request(&self, method: Method, args: Args) -> Result<Reply> {
        let request = self.prepare(method, args)?;
        debug!("{} {}", request.method, request.url());

        let response = self.transport.send(request).await?;
        Reply::from_response(method, response)
    }
}
