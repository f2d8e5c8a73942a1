//! Document conversion helpers shared by the store accessors.
//!
//! The trait seam between the HTTP layer and the stores speaks
//! `serde_json::Value`; inside the MongoDB accessors everything is BSON.
//! These helpers translate between the two and normalize the wire
//! representation: `_id` becomes a 24-character hex string and timestamps
//! become RFC 3339 strings, so clients never see extended-JSON wrappers
//! like `{"$oid": ...}`.

use chrono::SecondsFormat;
use mongodb::bson::{oid::ObjectId, Bson, DateTime, Document};
use serde_json::{Map, Value};

use crate::error::StoreError;

/// Field stamped on every listing at creation time.
pub const CREATED_AT_FIELD: &str = "created_at";

/// Parse an opaque wire identifier into an ObjectId.
pub fn parse_object_id(id: &str) -> Result<ObjectId, StoreError> {
    ObjectId::parse_str(id).map_err(|_| StoreError::InvalidId(id.to_string()))
}

/// Convert a client-submitted JSON body into a BSON document.
///
/// Only JSON objects are storable; arrays and scalars are rejected.
pub fn json_to_document(value: &Value) -> Result<Document, StoreError> {
    if !value.is_object() {
        return Err(StoreError::InvalidDocument(
            "request body must be a JSON object".to_string(),
        ));
    }
    mongodb::bson::to_document(value).map_err(|e| StoreError::InvalidDocument(e.to_string()))
}

/// Stamp `created_at` with the current time if the client did not supply one.
pub fn stamp_created_at(doc: &mut Document) {
    if !doc.contains_key(CREATED_AT_FIELD) {
        doc.insert(CREATED_AT_FIELD, Bson::DateTime(DateTime::now()));
    }
}

/// Convert a stored document into its wire JSON form.
pub fn document_to_json(doc: Document) -> Value {
    let mut map = Map::with_capacity(doc.len());
    for (key, value) in doc {
        map.insert(key, bson_to_json(value));
    }
    Value::Object(map)
}

fn bson_to_json(bson: Bson) -> Value {
    match bson {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => Value::String(format_datetime(dt)),
        Bson::String(s) => Value::String(s),
        Bson::Boolean(b) => Value::Bool(b),
        Bson::Null => Value::Null,
        Bson::Int32(n) => Value::from(n),
        Bson::Int64(n) => Value::from(n),
        Bson::Double(n) => Value::from(n),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        Bson::Document(doc) => document_to_json(doc),
        // Decimal128, timestamps, binary and friends never occur in
        // client-submitted documents; extended JSON is a safe fallback.
        other => other.into_relaxed_extjson(),
    }
}

fn format_datetime(dt: DateTime) -> String {
    chrono::DateTime::from_timestamp_millis(dt.timestamp_millis())
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}
