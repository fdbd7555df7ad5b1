//! Bulk operations: newline-delimited JSON encoding and a buffered indexer.

use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::args::truthy;
use crate::error::{Error, Result};
use crate::resources::Documents;
use crate::response::Data;

/// Encode documents as bulk actions.
///
/// Each document yields an `index` action, or a `delete` action when its
/// `_deleted` field is truthy. Fields starting with `_` become action
/// metadata; the rest form the source line, which delete actions omit.
pub fn encode(docs: &[Value]) -> Result<String> {
    let mut buf = String::new();

    for doc in docs {
        let Value::Object(fields) = doc else {
            return Err(Error::invalid_argument(format!(
                "bulk entries must be objects, got {doc}"
            )));
        };

        let deleted = fields.get("_deleted").is_some_and(truthy);
        let mut meta = Map::new();
        let mut source = Map::new();
        for (key, value) in fields {
            if key == "_deleted" {
                continue;
            }
            if key.starts_with('_') {
                meta.insert(key.clone(), value.clone());
            } else {
                source.insert(key.clone(), value.clone());
            }
        }

        let action = if deleted { "delete" } else { "index" };
        buf.push_str(&serde_json::to_string(&json!({ action: meta }))?);
        buf.push('\n');
        if !deleted {
            buf.push_str(&serde_json::to_string(&source)?);
            buf.push('\n');
        }
    }

    Ok(buf)
}

/// Turn a document (or a bare id) into a delete descriptor for [`encode`].
pub fn delete_descriptor(doc: &Value) -> Value {
    let mut descriptor = Map::new();

    if let Value::Object(fields) = doc {
        for key in ["index", "type", "id", "version"] {
            let meta_key = format!("_{key}");
            let value = [meta_key.as_str(), key]
                .iter()
                .filter_map(|k| fields.get(*k))
                .find(|v| truthy(v));
            if let Some(value) = value {
                descriptor.insert(meta_key, value.clone());
            }
        }
    } else if truthy(doc) {
        descriptor.insert("_id".to_string(), doc.clone());
    }

    descriptor.insert("_deleted".to_string(), Value::Bool(true));
    Value::Object(descriptor)
}

/// Count bulk items whose action result carries an `error`.
pub fn count_errors(data: &Data) -> usize {
    let Data::List(items) = data else {
        return 0;
    };
    items
        .iter()
        .filter(|item| {
            item.as_object()
                .is_some_and(|actions| actions.values().any(|r| r.get("error").is_some_and(truthy)))
        })
        .count()
}

/// Buffers documents for a [`Documents`] target and sends them as bulk
/// requests of `batch_size` documents.
pub struct BulkIndexer<D: Documents> {
    target: D,
    batch_size: usize,
    buffer: Vec<Value>,
    total_indexed: usize,
    total_errors: usize,
}

impl<D: Documents> BulkIndexer<D> {
    /// A `batch_size` of zero is treated as one.
    pub fn new(target: D, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            target,
            batch_size,
            buffer: Vec::with_capacity(batch_size),
            total_indexed: 0,
            total_errors: 0,
        }
    }

    /// Queue `doc`; a full buffer is sent right away.
    pub async fn add(&mut self, doc: Value) -> Result<()> {
        self.buffer.push(doc);

        if self.buffer.len() >= self.batch_size {
            self.flush().await?;
        }

        Ok(())
    }

    /// Send whatever is buffered as one `_bulk` request.
    pub async fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let docs = std::mem::replace(&mut self.buffer, Vec::with_capacity(self.batch_size));
        let count = docs.len();

        debug!("Flushing {} documents to {}", count, self.target.endpoint().uri());

        let reply = self
            .target
            .post(Value::Array(docs), Default::default())
            .await?;

        let errors = count_errors(&reply.data);
        if errors > 0 {
            warn!(
                "Bulk request had {} errors out of {} documents",
                errors, count
            );
        }

        self.total_errors += errors;
        self.total_indexed += count - errors.min(count);

        Ok(())
    }

    /// Send the remainder and return `(indexed, errors)`.
    pub async fn finish(mut self) -> Result<(usize, usize)> {
        self.flush().await?;
        Ok((self.total_indexed, self.total_errors))
    }

    /// `(indexed, errors)` so far, not counting the buffer.
    pub fn stats(&self) -> (usize, usize) {
        (self.total_indexed, self.total_errors)
    }
}
