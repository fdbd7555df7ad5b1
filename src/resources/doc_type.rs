//! Type-level calls.

use serde_json::Value;

use super::{documents, unknown, Documents, Index, Outcome};
use crate::error::Result;
use crate::http::Endpoint;

/// A document type within an index. All calls come from [`Documents`].
#[derive(Debug, Clone)]
pub struct DocType {
    index: Index,
    name: String,
    endpoint: Endpoint,
}

impl DocType {
    pub(crate) fn new(index: Index, name: &str) -> Self {
        let endpoint = index.endpoint().child(name);
        Self {
            index,
            name: name.to_string(),
            endpoint,
        }
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uri(&self) -> String {
        self.endpoint.uri()
    }

    /// Run a document operation by name with positional arguments.
    pub async fn invoke(&self, op: &str, values: Vec<Value>) -> Result<Outcome> {
        documents::invoke(self, op, values)
            .await?
            .ok_or_else(|| unknown(op))
    }
}

impl Documents for DocType {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::Args;
    use crate::error::Error;
    use crate::http::testing::MockTransport;
    use crate::http::Method;
    use crate::resources::Client;
    use serde_json::json;
    use std::sync::Arc;

    fn doc_type() -> (Arc<MockTransport>, DocType) {
        let mock = Arc::new(MockTransport::default());
        let client = Client::with_transport("http://127.0.0.1:9200", mock.clone()).unwrap();
        (mock, client.index("sage-test").doc_type("type1"))
    }

    fn docs() -> Vec<Value> {
        (1..10)
            .map(|i| json!({"_id": i.to_string(), "hello": format!("World{i}")}))
            .collect()
    }

    #[test]
    fn test_uri() {
        let (_, doc_type) = doc_type();
        assert_eq!(doc_type.uri(), "http://127.0.0.1:9200/sage-test/type1");
        assert_eq!(doc_type.index().name(), "sage-test");
    }

    #[tokio::test]
    async fn test_post_single_document() {
        let (mock, doc_type) = doc_type();
        mock.respond(
            201,
            json!({"ok": true, "_index": "sage-test", "_type": "type1", "_id": "gen", "_version": 1}),
        );

        let reply = doc_type
            .post(json!({"hello": "World"}), Args::new())
            .await
            .unwrap();

        let sent = mock.last();
        assert_eq!(sent.method, Method::Post);
        assert_eq!(sent.path, "/sage-test/type1");
        assert_eq!(sent.body.as_deref(), Some(r#"{"hello":"World"}"#));
        let doc = reply.doc().unwrap();
        assert_eq!(doc["id"], json!("gen"));
        assert_eq!(doc["version"], json!(1));
    }

    #[tokio::test]
    async fn test_post_array_is_bulk() {
        let (mock, doc_type) = doc_type();
        let items: Vec<Value> = (1..10)
            .map(|i| json!({"index": {"_id": i.to_string(), "ok": true}}))
            .collect();
        mock.respond(200, json!({"took": 5, "items": items}));

        let reply = doc_type.post(Value::Array(docs()), Args::new()).await.unwrap();

        let sent = mock.last();
        assert_eq!(sent.path, "/sage-test/type1/_bulk");
        assert_eq!(sent.headers["Content-Type"], "application/x-ndjson");
        let body = sent.body.unwrap();
        assert_eq!(body.lines().count(), 18);
        assert!(body.starts_with("{\"index\":{\"_id\":\"1\"}}\n{\"hello\":\"World1\"}\n"));

        let list = reply.list().unwrap();
        assert_eq!(list.len(), 9);
        assert_eq!(list.meta("took"), Some(&json!(5)));
    }

    #[tokio::test]
    async fn test_put_uses_document_id() {
        let (mock, doc_type) = doc_type();
        let doc = json!({"_id": "0", "hello": "World"});

        doc_type.put(doc.clone(), Args::new()).await.unwrap();
        let sent = mock.last();
        assert_eq!(sent.method, Method::Put);
        assert_eq!(sent.path, "/sage-test/type1/0");
        assert_eq!(sent.body, Some(doc.to_string()));

        doc_type
            .put(json!({"id": "a b"}), Args::new())
            .await
            .unwrap();
        assert_eq!(mock.last().path, "/sage-test/type1/a%20b");
    }

    #[tokio::test]
    async fn test_writes_require_id_and_name() {
        let (mock, doc_type) = doc_type();

        let err = doc_type.put(json!({"hello": "World"}), Args::new()).await;
        assert!(matches!(err, Err(Error::MissingId)));
        let err = doc_type.del(json!({"hello": "World"}), Args::new()).await;
        assert!(matches!(err, Err(Error::MissingId)));
        let err = doc_type.up("", json!({}), Args::new()).await;
        assert!(matches!(err, Err(Error::MissingId)));
        let err = doc_type.mlt("", Args::new()).await;
        assert!(matches!(err, Err(Error::MissingId)));

        let unnamed = doc_type.index().doc_type("");
        let err = unnamed.put(json!({"_id": "1"}), Args::new()).await;
        assert!(matches!(err, Err(Error::MissingId)));

        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_ids_stay_one_segment() {
        let (mock, doc_type) = doc_type();

        doc_type.put(json!({"_id": "a#b", "n": 1}), Args::new()).await.unwrap();
        let sent = mock.last();
        assert_eq!(sent.path, "/sage-test/type1/a%23b");
        let url = url::Url::parse(&sent.url()).unwrap();
        assert_eq!(url.path(), "/sage-test/type1/a%23b");
        assert_eq!(url.fragment(), None);

        doc_type.del(json!("a?b"), Args::new()).await.unwrap();
        let sent = mock.last();
        assert_eq!(sent.path, "/sage-test/type1/a%3Fb");
        assert_eq!(url::Url::parse(&sent.url()).unwrap().query(), None);

        doc_type.up("x/y", json!({"doc": {}}), Args::new()).await.unwrap();
        assert_eq!(mock.last().path, "/sage-test/type1/x%2Fy/_update");

        doc_type.mlt("q#1", Args::new()).await.unwrap();
        assert_eq!(mock.last().path, "/sage-test/type1/q%231/_mlt");

        doc_type
            .invoke("put", vec![json!({"id": "c?d"})])
            .await
            .unwrap();
        assert_eq!(mock.last().path, "/sage-test/type1/c%3Fd");
    }

    #[tokio::test]
    async fn test_get_and_delete() {
        let (mock, doc_type) = doc_type();
        mock.respond(
            200,
            json!({"_index": "sage-test", "_type": "type1", "_id": "0", "_version": 1, "exists": true, "_source": {"hello": "World"}}),
        );

        let reply = doc_type.get(Args::new().path("0")).await.unwrap();
        assert_eq!(mock.last().path, "/sage-test/type1/0");
        assert_eq!(reply.doc().unwrap()["version"], json!(1));

        doc_type.del(json!({"_id": "0"}), Args::new()).await.unwrap();
        assert_eq!((mock.last().method, mock.last().path), (Method::Delete, "/sage-test/type1/0".to_string()));

        doc_type.del(json!(5), Args::new()).await.unwrap();
        assert_eq!(mock.last().path, "/sage-test/type1/5");
    }

    #[tokio::test]
    async fn test_delete_array_is_bulk() {
        let (mock, doc_type) = doc_type();
        let docs: Vec<Value> = docs()
            .into_iter()
            .map(|mut doc| {
                doc["_version"] = json!(1);
                doc
            })
            .collect();

        doc_type.del(Value::Array(docs), Args::new()).await.unwrap();

        let sent = mock.last();
        assert_eq!(sent.method, Method::Post);
        assert_eq!(sent.path, "/sage-test/type1/_bulk");
        let body = sent.body.unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], r#"{"delete":{"_id":"1","_version":1}}"#);
    }

    #[tokio::test]
    async fn test_update_and_more_like_this() {
        let (mock, doc_type) = doc_type();

        let script = json!({"script": "ctx._source.foobar = \"baz\""});
        doc_type.up("0", script.clone(), Args::new()).await.unwrap();
        let sent = mock.last();
        assert_eq!((sent.method, sent.path.as_str()), (Method::Post, "/sage-test/type1/0/_update"));
        assert_eq!(sent.body, Some(script.to_string()));

        mock.respond(200, json!({"hits": {"total": 0, "hits": []}}));
        let reply = doc_type
            .mlt(
                "0",
                Args::new()
                    .query("mlt_fields", json!(["text"]))
                    .query("min_doc_freq", 1),
            )
            .await
            .unwrap();
        let sent = mock.last();
        assert_eq!(sent.path, "/sage-test/type1/0/_mlt");
        assert!(sent.query.contains(&("mlt_fields".to_string(), "text".to_string())));
        assert!(reply.list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_and_all() {
        let (mock, doc_type) = doc_type();

        doc_type
            .find(Args::new().body(json!({"query": {"match_all": {}}})))
            .await
            .unwrap();
        assert_eq!((mock.last().method, mock.last().path), (Method::Post, "/sage-test/type1/_search".to_string()));

        mock.respond(200, json!({"docs": [{"_id": "1", "exists": true}]}));
        let reply = doc_type
            .all(Args::new().body(json!({"ids": ["1"]})))
            .await
            .unwrap();
        assert_eq!((mock.last().method, mock.last().path), (Method::Get, "/sage-test/type1/_mget".to_string()));
        assert_eq!(reply.list().unwrap()[0]["id"], json!("1"));
    }

    #[tokio::test]
    async fn test_invoke_positional() {
        let (mock, doc_type) = doc_type();

        doc_type
            .invoke("up", vec![json!("0"), json!({"doc": {"a": 1}}), json!({"retry_on_conflict": 3})])
            .await
            .unwrap();
        let sent = mock.last();
        assert_eq!(sent.path, "/sage-test/type1/0/_update");
        assert_eq!(sent.query, vec![("retry_on_conflict".to_string(), "3".to_string())]);

        doc_type
            .invoke("get", vec![json!("0"), json!({"fields": ["a", "b"]})])
            .await
            .unwrap();
        let sent = mock.last();
        assert_eq!(sent.path, "/sage-test/type1/0");
        assert_eq!(sent.query, vec![("fields".to_string(), "a,b".to_string())]);

        let err = doc_type.invoke("up", vec![]).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(doc_type.invoke("stats", vec![]).await.is_err());
    }
}
