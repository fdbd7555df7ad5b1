//! Pluggable HTTP transports.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use elasticsearch::{
    auth::Credentials as EsCredentials,
    http::{
        headers::{HeaderMap, HeaderName, HeaderValue},
        transport::{SingleNodeConnectionPool, TransportBuilder},
        Method as EsMethod,
    },
    Elasticsearch,
};
use url::Url;

use crate::config::SageConfig;
use crate::error::{Error, Result};
use crate::uri::parse_uri;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
    Head,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Basic-auth credentials embedded in a connection URI.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub pass: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("pass", &"***")
            .finish()
    }
}

/// A fully prepared request, ready to hand to a [`Transport`].
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: Method,
    /// Service root, e.g. `http://127.0.0.1:9200`.
    pub root: String,
    /// Path below the root, starting with `/`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
    pub credentials: Option<Credentials>,
}

impl TransportRequest {
    /// Root and path, without the query string.
    pub fn url(&self) -> String {
        format!("{}{}", self.root, self.path)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    /// Header names are lowercase.
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

/// Sends one request and returns the raw response. Non-2xx statuses are
/// responses, not errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse>;
}

/// Transport backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        Self::from_config(&SageConfig::default())
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Client with the configured request timeout. Headers, including the
    /// user agent, travel on each request.
    pub fn from_config(config: &SageConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
        let mut url = Url::parse(&request.url())?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }

        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Put => reqwest::Method::PUT,
            Method::Post => reqwest::Method::POST,
            Method::Delete => reqwest::Method::DELETE,
            Method::Head => reqwest::Method::HEAD,
        };

        let mut builder = self.client.request(method, url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(credentials) = &request.credentials {
            builder = builder.basic_auth(&credentials.user, Some(&credentials.pass));
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.text().await?;

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

/// Transport that reuses an official [`Elasticsearch`] client and its
/// connection pool.
///
/// The node origin and credentials belong to the wrapped client. The path of
/// the request root (a proxy prefix such as `/es`) is kept in front of the
/// request path, so the wrapped client's node URL should be the bare origin.
#[derive(Clone)]
pub struct EsTransport {
    client: Elasticsearch,
}

impl EsTransport {
    pub fn new(client: Elasticsearch) -> Self {
        Self { client }
    }

    /// Single-node client for the origin of `uri`, authenticating with any
    /// credentials embedded in it.
    pub fn connect(uri: &str) -> Result<Self> {
        Self::build(uri, None)
    }

    /// Like [`EsTransport::connect`] for `config.url`, with the configured
    /// request timeout.
    pub fn from_config(config: &SageConfig) -> Result<Self> {
        Self::build(&config.url, Some(Duration::from_secs(config.timeout_secs)))
    }

    fn build(uri: &str, timeout: Option<Duration>) -> Result<Self> {
        let parsed = parse_uri(Some(uri))?;
        let conn_pool = SingleNodeConnectionPool::new(Url::parse(&parsed.host)?);
        let mut builder = TransportBuilder::new(conn_pool).disable_proxy();
        if let Some(credentials) = parsed.credentials {
            builder = builder.auth(EsCredentials::Basic(credentials.user, credentials.pass));
        }
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let transport = builder
            .build()
            .map_err(|e| Error::Setup(e.to_string()))?;

        Ok(Self::new(Elasticsearch::new(transport)))
    }

    /// Get the underlying Elasticsearch client
    pub fn client(&self) -> &Elasticsearch {
        &self.client
    }
}

#[async_trait]
impl Transport for EsTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
        let method = match request.method {
            Method::Get => EsMethod::Get,
            Method::Put => EsMethod::Put,
            Method::Post => EsMethod::Post,
            Method::Delete => EsMethod::Delete,
            Method::Head => EsMethod::Head,
        };

        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::invalid_argument(format!("header {name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::invalid_argument(format!("header {name}: {e}")))?;
            headers.insert(name, value);
        }

        let root = Url::parse(&request.root)?;
        let path = format!("{}{}", root.path().trim_end_matches('/'), request.path);

        let query = (!request.query.is_empty()).then_some(&request.query);
        let response = self
            .client
            .transport()
            .send(method, &path, headers, query, request.body, None)
            .await?;

        let status = response.status_code().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.text().await?;

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}
