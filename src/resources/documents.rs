//! Document operations shared by indexes and types.

use async_trait::async_trait;
use serde_json::Value;

use super::{leading, leading_string, Outcome};
use crate::args::{encode_component, render, truthy, Args};
use crate::bulk;
use crate::error::{Error, Result};
use crate::http::{Endpoint, Method};
use crate::response::Reply;

/// Document-level calls. Paths are relative to the implementor: below a type
/// a document is addressed by its id, below an index by `type/id`.
///
/// Ids passed to `put`, `del`, `up` and `mlt` (or found in the document) are
/// one path segment, so `/`, `?` and `#` in them are escaped. Explicit
/// `Args::path` routes keep their slashes.
#[async_trait]
pub trait Documents: Send + Sync {
    fn endpoint(&self) -> &Endpoint;

    /// Name of the index or type; document writes refuse to run without one.
    fn name(&self) -> &str;

    /// Fetch several documents through `_mget`; the body lists them.
    async fn all(&self, args: Args) -> Result<Reply> {
        self.endpoint().request(Method::Get, args.route("_mget")).await
    }

    /// Run a search; the body is the search request.
    async fn find(&self, args: Args) -> Result<Reply> {
        self.endpoint().request(Method::Post, args.route("_search")).await
    }

    /// Fetch the document at the args path.
    async fn get(&self, args: Args) -> Result<Reply> {
        self.endpoint().request(Method::Get, args).await
    }

    /// Post one document, or a bulk request when `docs` is an array.
    ///
    /// Single documents without an id get one generated by the service.
    async fn post(&self, docs: Value, args: Args) -> Result<Reply> {
        match docs {
            Value::Array(docs) => {
                let body = bulk::encode(&docs)?;
                let args = args.route("_bulk").body(Value::String(body));
                self.endpoint().request(Method::Post, args).await
            }
            doc => self.endpoint().request(Method::Post, args.body(doc)).await,
        }
    }

    /// Store a document under its `_id` (or `id`).
    async fn put(&self, doc: Value, args: Args) -> Result<Reply> {
        if self.name().is_empty() {
            return Err(Error::MissingId);
        }
        let id = document_id(&doc).ok_or(Error::MissingId)?;
        let args = args.route(encode_component(&id)).body(doc);
        self.endpoint().request(Method::Put, args).await
    }

    /// Delete a document, or several through a bulk request when `docs` is an
    /// array. A bare string or number is taken as the id.
    async fn del(&self, docs: Value, args: Args) -> Result<Reply> {
        if let Value::Array(docs) = &docs {
            let actions = docs.iter().map(bulk::delete_descriptor).collect();
            return self.post(Value::Array(actions), args).await;
        }

        if self.name().is_empty() {
            return Err(Error::MissingId);
        }
        let id = match &docs {
            Value::Object(_) => document_id(&docs),
            other => Some(render(other)).filter(|_| truthy(other)),
        }
        .ok_or(Error::MissingId)?;

        self.endpoint()
            .request(Method::Delete, args.route(encode_component(&id)))
            .await
    }

    /// Partially update a document through `{id}/_update`.
    async fn up(&self, id: &str, doc: Value, args: Args) -> Result<Reply> {
        if self.name().is_empty() || id.is_empty() {
            return Err(Error::MissingId);
        }
        let args = args
            .route(format!("{}/_update", encode_component(id)))
            .body(doc);
        self.endpoint().request(Method::Post, args).await
    }

    /// More-like-this search seeded by a document. A list `mlt_fields`
    /// query value is sent comma-joined.
    async fn mlt(&self, id: &str, args: Args) -> Result<Reply> {
        if id.is_empty() {
            return Err(Error::MissingId);
        }
        let args = args.route(format!("{}/_mlt", encode_component(id)));
        self.endpoint().request(Method::Get, args).await
    }
}

fn document_id(doc: &Value) -> Option<String> {
    ["_id", "id"]
        .iter()
        .filter_map(|key| doc.get(*key))
        .find(|v| truthy(v))
        .map(render)
}

/// Run a document operation by name with positional arguments. Returns
/// `None` for names that are not document operations.
pub(crate) async fn invoke<D>(target: &D, op: &str, values: Vec<Value>) -> Result<Option<Outcome>>
where
    D: Documents + ?Sized,
{
    let reply = match op {
        "all" => target.all(Args::from_values(values, true)?).await?,
        "find" => target.find(Args::from_values(values, true)?).await?,
        "get" => target.get(Args::from_values(values, false)?).await?,
        "post" | "put" | "del" => {
            let (docs, rest) = leading(values, op)?;
            let args = Args::from_values(rest, false)?;
            match op {
                "post" => target.post(docs, args).await?,
                "put" => target.put(docs, args).await?,
                _ => target.del(docs, args).await?,
            }
        }
        "up" => {
            let (id, rest) = leading_string(values, op)?;
            let (doc, rest) = leading(rest, op)?;
            target.up(&id, doc, Args::from_values(rest, false)?).await?
        }
        "mlt" => {
            let (id, rest) = leading_string(values, op)?;
            target.mlt(&id, Args::from_values(rest, false)?).await?
        }
        _ => return Ok(None),
    };

    Ok(Some(Outcome::Reply(reply)))
}
