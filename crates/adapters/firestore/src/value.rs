//! Firestore REST wire types and their mapping to domain records.
//!
//! Firestore encodes every field as a single-key object naming its type,
//! e.g. `{"booleanValue": true}` or `{"timestampValue": "2024-05-01T10:15:30Z"}`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use firebridge_domain::document::{DeviceUpdate, DocumentRecord};
use firebridge_domain::id::DocumentKey;
use firebridge_domain::time::parse_rfc3339;

use crate::error::FirestoreError;

/// A typed Firestore value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue(()),
    BooleanValue(bool),
    /// 64-bit integers travel as decimal strings.
    IntegerValue(String),
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(serde_json::Value),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

impl Value {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::StringValue(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::BooleanValue(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<&str> {
        match self {
            Self::TimestampValue(ts) => Some(ts),
            _ => None,
        }
    }
}

/// A document as returned by `GET …/documents/{collection}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name, ending in `/{collection}/{key}`.
    pub name: String,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
    #[serde(default)]
    pub create_time: Option<String>,
    #[serde(default)]
    pub update_time: Option<String>,
}

impl Document {
    /// The document key (last segment of the resource name).
    ///
    /// # Errors
    ///
    /// Returns [`FirestoreError::InvalidDocumentName`] for names without a
    /// non-empty last segment.
    pub fn key(&self) -> Result<DocumentKey, FirestoreError> {
        match self.name.rsplit('/').next() {
            Some(key) if !key.is_empty() => Ok(DocumentKey::new(key)),
            _ => Err(FirestoreError::InvalidDocumentName(self.name.clone())),
        }
    }

    /// Decode the fields the bridge understands; others are ignored, and a
    /// field with an unexpected type reads as absent.
    #[must_use]
    pub fn to_record(&self) -> DocumentRecord {
        DocumentRecord {
            entity_id: self.string_field("entity_id"),
            domain: self.string_field("domain"),
            state: self.fields.get("state").and_then(Value::as_bool),
            updated_at: self
                .fields
                .get("updatedAt")
                .and_then(Value::as_timestamp)
                .and_then(parse_rfc3339),
        }
    }

    fn string_field(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

/// One page of a collection listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsResponse {
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Field map written for a device update.
#[must_use]
pub fn encode_update(update: &DeviceUpdate) -> BTreeMap<String, Value> {
    BTreeMap::from([
        (
            "entity_id".to_string(),
            Value::StringValue(update.entity_id.to_string()),
        ),
        (
            "domain".to_string(),
            Value::StringValue(update.domain.to_string()),
        ),
        ("state".to_string(), Value::BooleanValue(update.state)),
    ])
}
