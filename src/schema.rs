//! Schema definitions for collections.
//!
//! A [`Schema`] is purely declarative: it names the primary-key field and the
//! fields the engine should index. It never enforces value types — records
//! stay dynamic JSON objects, and per-collection field contracts are
//! documented on the types that feed them (see [`crate::timing`]).

use serde::{Deserialize, Serialize};

/// Default primary-key field name when none is supplied.
pub const DEFAULT_KEY_PATH: &str = "id";

/// Secondary-index intent for a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedField {
    /// Field name inside the record.
    pub name: String,
    /// Whether the index must reject duplicate values.
    pub unique: bool,
}

/// Declarative description of a collection's structure.
///
/// Field order is preserved as declared, matching the ordered schema mapping
/// the store contract expects. Only the key path is structurally required by
/// the store; indexed fields are advisory input to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    key_path: String,
    fields: Vec<IndexedField>,
}

impl Schema {
    /// Create a schema with the default `"id"` key path and no indexed fields.
    pub fn new() -> Self {
        Self {
            key_path: DEFAULT_KEY_PATH.to_string(),
            fields: Vec::new(),
        }
    }

    /// Builder-style method to set the primary-key field name.
    pub fn with_key_path(mut self, key_path: impl Into<String>) -> Self {
        self.key_path = key_path.into();
        self
    }

    /// Builder-style method to append an indexed field.
    pub fn with_field(mut self, name: impl Into<String>, unique: bool) -> Self {
        self.fields.push(IndexedField {
            name: name.into(),
            unique,
        });
        self
    }

    /// The primary-key field name.
    pub fn key_path(&self) -> &str {
        &self.key_path
    }

    /// Indexed fields, in declaration order.
    pub fn fields(&self) -> &[IndexedField] {
        &self.fields
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}
