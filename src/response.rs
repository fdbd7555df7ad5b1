//! Response coercion.
//!
//! Search, bulk and multi-get payloads come back as lists; everything else is
//! a single document. Documents get both spellings of their identifier and
//! version (`_id`/`id`, `_version`/`version`) so callers can use either.

use std::collections::BTreeMap;
use std::ops::Deref;

use serde_json::{Map, Value};

use crate::args::truthy;
use crate::error::{Error, Result};
use crate::http::{Method, TransportResponse};

/// Normalised response payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    /// `HEAD` responses and empty bodies.
    Empty,
    Doc(Value),
    List(DocList),
}

/// A list-shaped payload: the entries plus the payload's own fields.
#[derive(Debug, Clone, PartialEq)]
pub struct DocList {
    docs: Vec<Value>,
    meta: Map<String, Value>,
    raw: Value,
}

impl DocList {
    pub fn docs(&self) -> &[Value] {
        &self.docs
    }

    pub fn into_docs(self) -> Vec<Value> {
        self.docs
    }

    /// Look up a top-level field such as `took`, or a field of the `hits`
    /// object such as `total` and `max_score`.
    pub fn meta(&self, key: &str) -> Option<&Value> {
        self.meta.get(key)
    }

    /// Total hit count, for both the plain and the `{"value": n}` shapes.
    pub fn total(&self) -> Option<u64> {
        match self.meta.get("total")? {
            Value::Number(n) => n.as_u64(),
            Value::Object(total) => total.get("value").and_then(Value::as_u64),
            _ => None,
        }
    }

    /// The payload exactly as the service returned it.
    pub fn raw(&self) -> &Value {
        &self.raw
    }
}

impl Deref for DocList {
    type Target = [Value];

    fn deref(&self) -> &[Value] {
        &self.docs
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub data: Data,
    pub status: u16,
    pub headers: BTreeMap<String, String>,
}

impl Reply {
    pub(crate) fn from_response(method: Method, response: TransportResponse) -> Result<Self> {
        let TransportResponse {
            status,
            headers,
            body,
        } = response;

        if method == Method::Head || body.trim().is_empty() {
            return Ok(Reply {
                data: Data::Empty,
                status,
                headers,
            });
        }

        let json: Value = serde_json::from_str(&body)?;
        if let Some(reason) = error_reason(&json) {
            return Err(Error::Service { status, reason });
        }

        Ok(Reply {
            data: normalize(json),
            status,
            headers,
        })
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn doc(&self) -> Option<&Value> {
        match &self.data {
            Data::Doc(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn list(&self) -> Option<&DocList> {
        match &self.data {
            Data::List(list) => Some(list),
            _ => None,
        }
    }

    /// Collapse into one JSON value: the document, the list entries as an
    /// array, or `null` when there was no body.
    pub fn into_value(self) -> Value {
        match self.data {
            Data::Empty => Value::Null,
            Data::Doc(doc) => doc,
            Data::List(list) => Value::Array(list.into_docs()),
        }
    }
}

/// Detect list-shaped payloads and backfill document metadata.
pub fn normalize(json: Value) -> Data {
    let entries = ["items", "docs"]
        .iter()
        .find_map(|key| json.get(*key).and_then(Value::as_array))
        .or_else(|| json.get("hits")?.get("hits")?.as_array());

    let Some(entries) = entries else {
        let mut doc = json;
        backfill_meta(&mut doc);
        return Data::Doc(doc);
    };

    let docs = entries
        .iter()
        .cloned()
        .map(|mut doc| {
            backfill_meta(&mut doc);
            doc
        })
        .collect();

    let mut meta = json.as_object().cloned().unwrap_or_default();
    if let Some(Value::Object(hits)) = json.get("hits") {
        meta.extend(hits.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    Data::List(DocList {
        docs,
        meta,
        raw: json,
    })
}

/// Give a document both `id`/`_id` and `version`/`_version` when exactly
/// one of each pair is set.
pub fn backfill_meta(doc: &mut Value) {
    if let Value::Object(map) = doc {
        alias(map, "id", "_id");
        alias(map, "version", "_version");
    }
}

fn alias(map: &mut Map<String, Value>, plain: &str, meta: &str) {
    let has_plain = map.get(plain).is_some_and(truthy);
    let has_meta = map.get(meta).is_some_and(truthy);
    if has_plain == has_meta {
        return;
    }

    let (from, to) = if has_meta { (meta, plain) } else { (plain, meta) };
    if let Some(value) = map.get(from).cloned() {
        map.insert(to.to_string(), value);
    }
}

fn error_reason(json: &Value) -> Option<String> {
    let error = json.get("error").filter(|e| truthy(e))?;
    Some(match error {
        Value::String(s) => s.clone(),
        Value::Object(obj) => obj
            .get("reason")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(status: u16, body: &str) -> TransportResponse {
        TransportResponse {
            status,
            headers: BTreeMap::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_backfill_from_underscore_fields() {
        let mut doc = json!({"_id": "0", "_version": 3, "_source": {"hello": "World"}});
        backfill_meta(&mut doc);
        assert_eq!(doc["id"], json!("0"));
        assert_eq!(doc["version"], json!(3));
    }

    #[test]
    fn test_backfill_from_plain_fields() {
        let mut doc = json!({"id": "abc", "version": 1});
        backfill_meta(&mut doc);
        assert_eq!(doc["_id"], json!("abc"));
        assert_eq!(doc["_version"], json!(1));
    }

    #[test]
    fn test_backfill_leaves_conflicts_alone() {
        let mut doc = json!({"id": "a", "_id": "b"});
        backfill_meta(&mut doc);
        assert_eq!(doc, json!({"id": "a", "_id": "b"}));

        let mut doc = json!({"hello": "World"});
        backfill_meta(&mut doc);
        assert_eq!(doc, json!({"hello": "World"}));
    }

    #[test]
    fn test_backfill_overwrites_falsy_alias() {
        let mut doc = json!({"_id": "7", "id": ""});
        backfill_meta(&mut doc);
        assert_eq!(doc["id"], json!("7"));
    }

    #[test]
    fn test_search_payload_is_list() {
        let payload = json!({
            "took": 2,
            "hits": {
                "total": 2,
                "max_score": 1.0,
                "hits": [
                    {"_id": "1", "_version": 1, "_source": {}},
                    {"_id": "2", "_source": {}}
                ]
            }
        });

        let Data::List(list) = normalize(payload.clone()) else {
            panic!("expected a list");
        };
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["id"], json!("1"));
        assert_eq!(list[0]["version"], json!(1));
        assert_eq!(list[1]["id"], json!("2"));
        assert_eq!(list.meta("took"), Some(&json!(2)));
        assert_eq!(list.meta("max_score"), Some(&json!(1.0)));
        assert_eq!(list.total(), Some(2));
        assert_eq!(list.raw(), &payload);
    }

    #[test]
    fn test_bulk_and_mget_payloads_are_lists() {
        let bulk = json!({"took": 3, "items": [{"index": {"_id": "1", "ok": true}}]});
        assert!(matches!(normalize(bulk), Data::List(l) if l.len() == 1));

        let mget = json!({"docs": [{"_id": "1", "exists": true}]});
        let Data::List(list) = normalize(mget) else {
            panic!("expected a list");
        };
        assert_eq!(list[0]["id"], json!("1"));

        let empty = json!({"items": []});
        assert!(matches!(normalize(empty), Data::List(l) if l.is_empty()));
    }

    #[test]
    fn test_total_object_shape() {
        let payload = json!({"hits": {"total": {"value": 9, "relation": "eq"}, "hits": []}});
        let Data::List(list) = normalize(payload) else {
            panic!("expected a list");
        };
        assert_eq!(list.total(), Some(9));
    }

    #[test]
    fn test_singleton_payload() {
        let data = normalize(json!({"ok": true, "_index": "sage-test", "_id": "0"}));
        let Data::Doc(doc) = data else {
            panic!("expected a document");
        };
        assert_eq!(doc["id"], json!("0"));
    }

    #[test]
    fn test_error_field_becomes_service_error() {
        let err = Reply::from_response(
            Method::Get,
            response(404, r#"{"error":"IndexMissingException[[nope] missing]","status":404}"#),
        )
        .unwrap_err();
        match err {
            Error::Service { status, reason } => {
                assert_eq!(status, 404);
                assert!(reason.starts_with("IndexMissingException"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = Reply::from_response(
            Method::Put,
            response(400, r#"{"error":{"type":"x","reason":"bad mapping"}}"#),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Service { reason, .. } if reason == "bad mapping"));
    }

    #[test]
    fn test_head_and_empty_bodies() {
        let reply = Reply::from_response(Method::Head, response(404, "")).unwrap();
        assert_eq!(reply.data, Data::Empty);
        assert_eq!(reply.status, 404);
        assert!(!reply.is_success());

        let reply = Reply::from_response(Method::Delete, response(200, "  ")).unwrap();
        assert_eq!(reply.into_value(), Value::Null);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let err = Reply::from_response(Method::Get, response(200, "<html>")).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}
