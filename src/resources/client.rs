//! Cluster-level calls and connection setup.

use std::sync::Arc;

use serde_json::Value;

use super::{leading_string, put_or_get, unknown, Index, Outcome};
use crate::args::{encode_component, Args, PathArg};
use crate::config::{SageConfig, TransportKind};
use crate::error::{Error, Result};
use crate::http::{Endpoint, EsTransport, HttpTransport, Method, Transport};
use crate::response::Reply;
use crate::uri::{parse_uri, split_index};

/// What a connection URI points at.
#[derive(Debug, Clone)]
pub enum Connection {
    Client(Client),
    /// The URI path named an index.
    Index(Index),
}

impl Connection {
    pub fn client(&self) -> &Client {
        match self {
            Connection::Client(client) => client,
            Connection::Index(index) => index.client(),
        }
    }
}

/// Connect over HTTP. A URI whose path ends in a segment yields an
/// [`Index`] for that segment; anything else yields a [`Client`].
pub fn connect(uri: &str) -> Result<Connection> {
    connect_with(uri, Arc::new(HttpTransport::new()?))
}

pub fn connect_with(uri: &str, transport: Arc<dyn Transport>) -> Result<Connection> {
    let parsed = parse_uri(Some(uri))?;
    let (prefix, index) = split_index(&parsed.path)?;
    let root = format!("{}{}", parsed.host, prefix);
    let client = Client::from_endpoint(Endpoint::new(root, parsed.credentials, transport));

    Ok(match index {
        Some(name) => Connection::Index(client.index(name)),
        None => Connection::Client(client),
    })
}

#[derive(Debug, Clone)]
pub struct Client {
    endpoint: Endpoint,
}

impl Client {
    /// Client for the service at `uri`, over HTTP. Credentials embedded in the
    /// URI are used for basic auth.
    pub fn new(uri: &str) -> Result<Self> {
        Self::with_transport(uri, Arc::new(HttpTransport::new()?))
    }

    pub fn with_transport(uri: &str, transport: Arc<dyn Transport>) -> Result<Self> {
        let parsed = parse_uri(Some(uri))?;
        let root = format!("{}{}", parsed.host, parsed.path);
        Ok(Self::from_endpoint(Endpoint::new(
            root,
            parsed.credentials,
            transport,
        )))
    }

    /// Client for `config.url` over the configured transport.
    pub fn from_config(config: &SageConfig) -> Result<Self> {
        let transport: Arc<dyn Transport> = match config.transport {
            TransportKind::Http => Arc::new(HttpTransport::from_config(config)?),
            TransportKind::Elasticsearch => Arc::new(EsTransport::from_config(config)?),
        };
        Self::from_config_with(config, transport)
    }

    /// Client for `config.url` over `transport`. The configured headers and
    /// user agent go out with every request.
    pub fn from_config_with(config: &SageConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let mut headers = config.headers.clone();
        if let Some(user_agent) = &config.user_agent {
            if !headers.keys().any(|k| k.eq_ignore_ascii_case("user-agent")) {
                headers.insert("User-Agent".to_string(), user_agent.clone());
            }
        }

        let client = Self::with_transport(&config.url, transport)?;
        Ok(Self::from_endpoint(client.endpoint.with_default_headers(headers)))
    }

    pub(crate) fn from_endpoint(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }

    pub fn uri(&self) -> String {
        self.endpoint.uri()
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Select one or more indexes. Names are sorted so that `"b,a"` and
    /// `["a", "b"]` address the same resource.
    pub fn index(&self, names: impl Into<PathArg>) -> Index {
        let mut names = names_of(names.into());
        names.sort_unstable();
        Index::new(self.clone(), names.join(","))
    }

    /// Create a river from the body, or read its `_meta` without one.
    pub async fn river(&self, name: &str, args: Args) -> Result<Reply> {
        let method = put_or_get(&args);
        let args = args.route(format!("_river/{}/_meta", encode_component(name)));
        self.endpoint.request(method, args).await
    }

    pub async fn unriver(&self, name: &str, args: Args) -> Result<Reply> {
        let args = args.route(format!("_river/{}", encode_component(name)));
        self.endpoint.request(Method::Delete, args).await
    }

    /// Node stats, for all nodes or the ones named by the args path.
    pub async fn stats(&self, args: Args) -> Result<Reply> {
        let route = match args.segment() {
            "" => "_nodes/stats".to_string(),
            nodes => format!("_nodes/{nodes}/stats"),
        };
        self.endpoint.request(Method::Get, args.route(route)).await
    }

    pub async fn health(&self, args: Args) -> Result<Reply> {
        self.endpoint
            .request(Method::Get, args.route("_cluster/health"))
            .await
    }

    /// Cluster state, optionally narrowed by the args path.
    pub async fn state(&self, args: Args) -> Result<Reply> {
        let route = under("_cluster/state", args.segment());
        self.endpoint.request(Method::Get, args.route(route)).await
    }

    /// Node info, for all nodes or the ones named by the args path.
    pub async fn nodes(&self, args: Args) -> Result<Reply> {
        let route = under("_nodes", args.segment());
        self.endpoint.request(Method::Get, args.route(route)).await
    }

    /// Update cluster settings from the body, or read them without one.
    pub async fn config(&self, args: Args) -> Result<Reply> {
        let method = put_or_get(&args);
        self.endpoint
            .request(method, args.route("_cluster/settings"))
            .await
    }

    /// Store the template named by the args path, or read it without a body.
    pub async fn tmpl(&self, args: Args) -> Result<Reply> {
        let method = put_or_get(&args);
        let route = under("_template", args.segment());
        self.endpoint.request(method, args.route(route)).await
    }

    pub async fn untmpl(&self, args: Args) -> Result<Reply> {
        if args.segment().is_empty() {
            return Err(Error::invalid_argument("template name required"));
        }
        let route = under("_template", args.segment());
        self.endpoint.request(Method::Delete, args.route(route)).await
    }

    /// Run a cluster-level operation by name with positional arguments.
    pub async fn invoke(&self, op: &str, values: Vec<Value>) -> Result<Outcome> {
        let reply = match op {
            "river" => {
                let (name, rest) = leading_string(values, op)?;
                self.river(&name, Args::from_values(rest, true)?).await?
            }
            "unriver" => {
                let (name, rest) = leading_string(values, op)?;
                self.unriver(&name, Args::from_values(rest, false)?).await?
            }
            "stats" => self.stats(Args::from_values(values, false)?).await?,
            "health" => self.health(Args::from_values(values, false)?).await?,
            "state" => self.state(Args::from_values(values, false)?).await?,
            "nodes" => self.nodes(Args::from_values(values, false)?).await?,
            "config" => self.config(Args::from_values(values, true)?).await?,
            "tmpl" => self.tmpl(Args::from_values(values, true)?).await?,
            "untmpl" => self.untmpl(Args::from_values(values, false)?).await?,
            _ => return Err(unknown(op)),
        };
        Ok(Outcome::Reply(reply))
    }
}

fn under(base: &str, segment: &str) -> String {
    if segment.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{segment}")
    }
}

fn names_of(names: PathArg) -> Vec<String> {
    names
        .parts()
        .iter()
        .flat_map(|part| part.split(','))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
