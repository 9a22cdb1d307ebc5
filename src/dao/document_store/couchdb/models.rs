use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dao::document_store::DocumentKey;

/// Prefix shared by every coordinator document id.
pub const DOC_PREFIX: &str = "buzzboard::";

/// Envelope wrapping a logical document so CouchDB can track its revision.
/// The payload sits under `content` because a document body must be an
/// object while `users` is a bare array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    pub content: Value,
}

impl CouchDocument {
    pub fn new(key: DocumentKey, rev: Option<String>, content: Value) -> Self {
        Self {
            id: doc_id(key),
            rev,
            content,
        }
    }
}

/// Only the revision is needed when probing an existing document.
#[derive(Debug, Deserialize)]
pub struct RevisionOnly {
    #[serde(rename = "_rev")]
    pub rev: String,
}

pub fn doc_id(key: DocumentKey) -> String {
    format!("{}{}", DOC_PREFIX, key.as_str())
}
