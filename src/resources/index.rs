//! Index-level calls.

use serde_json::Value;

use super::{documents, put_or_get, unknown, Client, DocType, Documents, Outcome};
use crate::args::Args;
use crate::error::Result;
use crate::http::{Endpoint, Method};
use crate::response::Reply;

/// One index, or several addressed together as `a,b`.
///
/// Besides the index calls below, an `Index` takes every [`Documents`] call;
/// document paths are then `type/id`.
#[derive(Debug, Clone)]
pub struct Index {
    client: Client,
    name: String,
    endpoint: Endpoint,
}

impl Index {
    pub(crate) fn new(client: Client, name: String) -> Self {
        let endpoint = client.endpoint().child(&name);
        Self {
            client,
            name,
            endpoint,
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uri(&self) -> String {
        self.endpoint.uri()
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Select a type within this index.
    pub fn doc_type(&self, name: &str) -> DocType {
        DocType::new(self.clone(), name)
    }

    /// Create the index; an optional body carries settings and mappings.
    pub async fn create(&self, args: Args) -> Result<Reply> {
        self.endpoint.request(Method::Put, args).await
    }

    pub async fn destroy(&self, args: Args) -> Result<Reply> {
        self.endpoint.request(Method::Delete, args).await
    }

    /// `true` when a `HEAD` on the index answers 200.
    pub async fn exists(&self, args: Args) -> Result<bool> {
        let reply = self.endpoint.request(Method::Head, args).await?;
        Ok(reply.status == 200)
    }

    pub async fn close(&self, args: Args) -> Result<Reply> {
        self.call(Method::Post, "_close", args).await
    }

    pub async fn open(&self, args: Args) -> Result<Reply> {
        self.call(Method::Post, "_open", args).await
    }

    pub async fn refresh(&self, args: Args) -> Result<Reply> {
        self.call(Method::Post, "_refresh", args).await
    }

    /// Flush index data to storage, freeing memory.
    pub async fn flush(&self, args: Args) -> Result<Reply> {
        self.call(Method::Post, "_flush", args).await
    }

    /// Clear the index caches.
    pub async fn clear(&self, args: Args) -> Result<Reply> {
        self.call(Method::Get, "_cache/clear", args).await
    }

    pub async fn optimize(&self, args: Args) -> Result<Reply> {
        self.call(Method::Post, "_optimize", args).await
    }

    /// Snapshot through the index gateway.
    pub async fn snapshot(&self, args: Args) -> Result<Reply> {
        self.call(Method::Post, "_gateway/snapshot", args).await
    }

    /// Update settings from the body, or read them without one.
    pub async fn settings(&self, args: Args) -> Result<Reply> {
        let method = put_or_get(&args);
        self.call(method, "_settings", args).await
    }

    /// Put the mapping in the body for the type named by the args path, or
    /// read mappings without a body.
    pub async fn map(&self, args: Args) -> Result<Reply> {
        let method = put_or_get(&args);
        let route = mapping_route(args.segment());
        self.endpoint.request(method, args.route(route)).await
    }

    /// Delete the mapping of the type named by the args path.
    pub async fn unmap(&self, args: Args) -> Result<Reply> {
        let route = mapping_route(args.segment());
        self.endpoint.request(Method::Delete, args.route(route)).await
    }

    pub async fn stats(&self, args: Args) -> Result<Reply> {
        self.call(Method::Get, "_stats", args).await
    }

    pub async fn status(&self, args: Args) -> Result<Reply> {
        self.call(Method::Get, "_status", args).await
    }

    pub async fn segments(&self, args: Args) -> Result<Reply> {
        self.call(Method::Get, "_segments", args).await
    }

    /// Run an index or document operation by name with positional arguments.
    pub async fn invoke(&self, op: &str, values: Vec<Value>) -> Result<Outcome> {
        let reply = match op {
            "create" => self.create(Args::from_values(values, true)?).await?,
            "settings" => self.settings(Args::from_values(values, true)?).await?,
            "map" => self.map(Args::from_values(values, true)?).await?,
            "exists" => {
                let exists = self.exists(Args::from_values(values, false)?).await?;
                return Ok(Outcome::Exists(exists));
            }
            "destroy" | "close" | "open" | "refresh" | "flush" | "clear" | "optimize"
            | "snapshot" | "unmap" | "stats" | "status" | "segments" => {
                let args = Args::from_values(values, false)?;
                match op {
                    "destroy" => self.destroy(args).await?,
                    "close" => self.close(args).await?,
                    "open" => self.open(args).await?,
                    "refresh" => self.refresh(args).await?,
                    "flush" => self.flush(args).await?,
                    "clear" => self.clear(args).await?,
                    "optimize" => self.optimize(args).await?,
                    "snapshot" => self.snapshot(args).await?,
                    "unmap" => self.unmap(args).await?,
                    "stats" => self.stats(args).await?,
                    "status" => self.status(args).await?,
                    _ => self.segments(args).await?,
                }
            }
            _ => {
                return documents::invoke(self, op, values)
                    .await?
                    .ok_or_else(|| unknown(op))
            }
        };
        Ok(Outcome::Reply(reply))
    }

    async fn call(&self, method: Method, route: &str, args: Args) -> Result<Reply> {
        self.endpoint.request(method, args.route(route)).await
    }
}

impl Documents for Index {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn mapping_route(doc_type: &str) -> String {
    if doc_type.is_empty() {
        "_mapping".to_string()
    } else {
        format!("{doc_type}/_mapping")
    }
}
