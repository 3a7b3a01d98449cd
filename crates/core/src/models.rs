use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Product,
    Greeting,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => write!(formatter, "NULL"),
            FieldValue::Integer(value) => write!(formatter, "{value}"),
            FieldValue::Real(value) => write!(formatter, "{value}"),
            FieldValue::Text(value) => write!(formatter, "{value}"),
        }
    }
}

/// One retrieved row: field names paired with scalar values, in column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub fields: Vec<(String, FieldValue)>,
}

impl CatalogRecord {
    pub fn new(fields: Vec<(String, FieldValue)>) -> Self {
        Self { fields }
    }

    /// Serializes the record to one line with stable field order.
    pub fn as_line(&self) -> String {
        let rendered = self
            .fields
            .iter()
            .map(|(name, value)| format!("{name}: {value}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{{{rendered}}}")
    }
}

/// Result of a full catalog sweep. `Empty` means zero records survived across
/// all collections, which is distinct from a collection-level read failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Retrieval {
    Empty,
    Records(Vec<CatalogRecord>),
}

impl Retrieval {
    pub fn record_count(&self) -> usize {
        match self {
            Retrieval::Empty => 0,
            Retrieval::Records(records) => records.len(),
        }
    }
}

/// One client-side submission. A retry mints a fresh id over the last text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuerySubmission {
    pub id: Uuid,
    pub text: String,
}

impl QuerySubmission {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
        }
    }
}
