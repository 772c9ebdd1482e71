//! Managed document database over the Firestore REST API

use super::{
    new_document_id, Direction, Document, DocumentStore, FieldTransform, Query, StoredDocument,
};
use crate::config::FirestoreConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};

pub struct FirestoreStore {
    client: Client,
    base_url: String,
    project_id: String,
    database: String,
    bearer_token: Option<String>,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RunQueryItem {
    document: Option<FirestoreDocument>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl FirestoreStore {
    pub fn new(config: &FirestoreConfig) -> Result<Self> {
        let project_id = config
            .project_id
            .clone()
            .ok_or_else(|| Error::Config("Missing FIRESTORE_PROJECT_ID".to_string()))?;

        Ok(Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            project_id,
            database: config.database.clone(),
            bearer_token: config.bearer_token.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// Resource name prefix, e.g. `projects/p/databases/(default)/documents`
    fn documents_path(&self) -> String {
        format!(
            "projects/{}/databases/{}/documents",
            self.project_id, self.database
        )
    }

    fn document_name(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}", self.documents_path(), collection, id)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let mut builder = self.client.request(method, url);
        if let Some(token) = &self.bearer_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(key) = &self.api_key {
            builder = builder.query(&[("key", key)]);
        }
        builder
    }

    async fn commit(&self, collection: &str, id: &str, write: Value) -> Result<()> {
        let url = self.url(&format!("{}:commit", self.documents_path()));
        let response = self
            .request(Method::POST, &url)
            .json(&json!({ "writes": [write] }))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::not_found(collection, id));
        }
        check_status(response).await?;
        Ok(())
    }

    fn write(
        &self,
        collection: &str,
        id: &str,
        fields: &Document,
        transforms: &[FieldTransform],
        mask: Option<Vec<String>>,
        exists: bool,
    ) -> Value {
        let mut write = json!({
            "update": {
                "name": self.document_name(collection, id),
                "fields": encode_fields(fields),
            },
            "currentDocument": { "exists": exists },
        });

        if let Some(paths) = mask {
            write["updateMask"] = json!({ "fieldPaths": paths });
        }
        if !transforms.is_empty() {
            write["updateTransforms"] = Value::Array(transforms.iter().map(encode_transform).collect());
        }
        write
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);
    Err(Error::Store(format!("Firestore API error ({status}): {message}")))
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn add(
        &self,
        collection: &str,
        fields: Document,
        transforms: &[FieldTransform],
    ) -> Result<String> {
        let id = new_document_id();
        let write = self.write(collection, &id, &fields, transforms, None, false);
        self.commit(collection, &id, write).await?;
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let url = self.url(&self.document_name(collection, id));
        let response = self.request(Method::GET, &url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let doc: FirestoreDocument = check_status(response).await?.json().await?;
        Ok(Some(decode_fields(doc.fields)))
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
        transforms: &[FieldTransform],
    ) -> Result<()> {
        let mask = fields.keys().cloned().collect();
        let write = self.write(collection, id, &fields, transforms, Some(mask), true);
        self.commit(collection, id, write).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let url = self.url(&self.document_name(collection, id));
        let response = self.request(Method::DELETE, &url).send().await?;
        check_status(response).await?;
        Ok(())
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<StoredDocument>> {
        let url = self.url(&format!("{}:runQuery", self.documents_path()));
        let body = json!({ "structuredQuery": structured_query(collection, query) });

        let response = self.request(Method::POST, &url).json(&body).send().await?;
        let items: Vec<RunQueryItem> = check_status(response).await?.json().await?;

        let docs = items
            .into_iter()
            .filter_map(|item| item.document)
            .map(|doc| StoredDocument {
                id: doc.name.rsplit('/').next().unwrap_or_default().to_string(),
                fields: decode_fields(doc.fields),
            })
            .collect();
        Ok(docs)
    }

    fn provider_name(&self) -> &str {
        "firestore"
    }
}

fn structured_query(collection: &str, query: &Query) -> Value {
    let mut structured = json!({ "from": [{ "collectionId": collection }] });

    let filters: Vec<Value> = query
        .filters
        .iter()
        .map(|(field, value)| {
            json!({
                "fieldFilter": {
                    "field": { "fieldPath": field },
                    "op": "EQUAL",
                    "value": encode_value(value),
                }
            })
        })
        .collect();

    match filters.len() {
        0 => {}
        1 => structured["where"] = filters.into_iter().next().unwrap_or(Value::Null),
        _ => {
            structured["where"] = json!({
                "compositeFilter": { "op": "AND", "filters": filters }
            })
        }
    }

    if let Some(order) = &query.order_by {
        let direction = match order.direction {
            Direction::Ascending => "ASCENDING",
            Direction::Descending => "DESCENDING",
        };
        structured["orderBy"] = json!([{
            "field": { "fieldPath": order.field },
            "direction": direction,
        }]);
    }

    if let Some(limit) = query.limit {
        structured["limit"] = json!(limit);
    }

    structured
}

fn encode_transform(transform: &FieldTransform) -> Value {
    match transform {
        FieldTransform::ServerTimestamp(field) => json!({
            "fieldPath": field,
            "setToServerValue": "REQUEST_TIME",
        }),
        FieldTransform::Increment(field, by) => json!({
            "fieldPath": field,
            "increment": { "integerValue": by.to_string() },
        }),
    }
}

fn encode_fields(fields: &Document) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(k, v)| (k.clone(), encode_value(v)))
            .collect(),
    )
}

/// Convert a JSON value to the typed Firestore value representation
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({ "integerValue": i.to_string() })
            } else if let Some(u) = n.as_u64() {
                json!({ "integerValue": u.to_string() })
            } else {
                json!({ "doubleValue": n.as_f64().unwrap_or(0.0) })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

fn decode_fields(fields: Map<String, Value>) -> Document {
    fields
        .into_iter()
        .map(|(k, v)| (k, decode_value(v)))
        .collect()
}

/// Convert a typed Firestore value back to plain JSON. Timestamps, bytes and
/// references decode to strings.
pub fn decode_value(value: Value) -> Value {
    let Value::Object(mut typed) = value else {
        return Value::Null;
    };

    if let Some(v) = typed.remove("integerValue") {
        return match &v {
            Value::String(s) => s.parse::<i64>().map(Value::from).unwrap_or(Value::Null),
            Value::Number(_) => v,
            _ => Value::Null,
        };
    }
    if let Some(v) = typed.remove("doubleValue") {
        return match v {
            Value::Number(_) => v,
            _ => Value::Null,
        };
    }
    if let Some(v) = typed.remove("arrayValue") {
        let values = match v {
            Value::Object(mut inner) => match inner.remove("values") {
                Some(Value::Array(items)) => items.into_iter().map(decode_value).collect(),
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };
        return Value::Array(values);
    }
    if let Some(v) = typed.remove("mapValue") {
        let fields = match v {
            Value::Object(mut inner) => match inner.remove("fields") {
                Some(Value::Object(fields)) => fields,
                _ => Map::new(),
            },
            _ => Map::new(),
        };
        return Value::Object(decode_fields(fields));
    }
    for key in [
        "stringValue",
        "booleanValue",
        "timestampValue",
        "bytesValue",
        "referenceValue",
        "geoPointValue",
    ] {
        if let Some(v) = typed.remove(key) {
            return v;
        }
    }
    Value::Null
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_resource_fields() {
        let value = json!({
            "name": "q1.pdf",
            "size": 2048,
            "chunks": [{ "index": 0, "embedding": [0.5, -0.25] }],
            "topic": null,
        });
        let encoded = encode_value(&value);
        let fields = &encoded["mapValue"]["fields"];

        assert_eq!(fields["name"], json!({ "stringValue": "q1.pdf" }));
        assert_eq!(fields["size"], json!({ "integerValue": "2048" }));
        assert_eq!(fields["topic"], json!({ "nullValue": null }));

        let chunk = &fields["chunks"]["arrayValue"]["values"][0]["mapValue"]["fields"];
        assert_eq!(chunk["index"], json!({ "integerValue": "0" }));
        assert_eq!(
            chunk["embedding"]["arrayValue"]["values"][1],
            json!({ "doubleValue": -0.25 })
        );
    }

    #[test]
    fn test_decode_timestamp_and_empty_array() {
        let fields: Map<String, Value> = serde_json::from_value(json!({
            "createdAt": { "timestampValue": "2024-06-01T12:00:00.123456Z" },
            "comments": { "arrayValue": {} },
            "likes": { "integerValue": "7" },
        }))
        .unwrap();

        let doc = decode_fields(fields);
        assert_eq!(doc["createdAt"], "2024-06-01T12:00:00.123456Z");
        assert_eq!(doc["comments"], json!([]));
        assert_eq!(doc["likes"], 7);
    }

    #[test]
    fn test_structured_query_for_chat_history() {
        let query = Query::new()
            .where_eq("userId", "u-42")
            .order_by("timestamp", Direction::Descending);
        let structured = structured_query("chats", &query);

        assert_eq!(structured["from"][0]["collectionId"], "chats");
        assert_eq!(structured["where"]["fieldFilter"]["op"], "EQUAL");
        assert_eq!(
            structured["where"]["fieldFilter"]["value"],
            json!({ "stringValue": "u-42" })
        );
        assert_eq!(structured["orderBy"][0]["direction"], "DESCENDING");
    }

    #[test]
    fn test_write_carries_transforms_and_precondition() {
        let store = FirestoreStore::new(&FirestoreConfig {
            project_id: Some("desk".to_string()),
            database: "(default)".to_string(),
            base_url: "http://localhost:8080/v1/".to_string(),
            bearer_token: None,
            api_key: None,
        })
        .unwrap();

        let write = store.write(
            "ideas",
            "abc",
            &Document::new(),
            &[FieldTransform::increment("likes", 1)],
            Some(vec![]),
            true,
        );
        assert_eq!(
            write["update"]["name"],
            "projects/desk/databases/(default)/documents/ideas/abc"
        );
        assert_eq!(write["currentDocument"]["exists"], true);
        assert_eq!(write["updateMask"]["fieldPaths"], json!([]));
        assert_eq!(
            write["updateTransforms"][0]["increment"],
            json!({ "integerValue": "1" })
        );
        assert_eq!(store.url("x"), "http://localhost:8080/v1/x");
    }

    #[test]
    fn test_missing_project_is_config_error() {
        let config = crate::Config::default();
        assert!(matches!(
            FirestoreStore::new(&config.store.firestore),
            Err(Error::Config(_))
        ));
    }
}
