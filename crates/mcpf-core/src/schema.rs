// SPDX-License-Identifier: MIT OR Apache-2.0
//! The JSON-Schema draft-07 subset used to describe MCP tool parameters.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One or more JSON-Schema primitive type names.
///
/// `type` may be a single string or an array of strings in draft-07; both
/// forms round-trip through this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaType {
    /// A single declared type, e.g. `"string"`.
    Single(PrimitiveType),
    /// Several accepted types, e.g. `["string", "null"]`.
    Many(Vec<PrimitiveType>),
}

impl SchemaType {
    /// All primitive types this declaration accepts.
    pub fn candidates(&self) -> Vec<PrimitiveType> {
        match self {
            SchemaType::Single(t) => vec![*t],
            SchemaType::Many(ts) => ts.clone(),
        }
    }
}

/// A single JSON-Schema primitive type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    /// `"string"`
    String,
    /// `"number"`
    Number,
    /// `"integer"`
    Integer,
    /// `"boolean"`
    Boolean,
    /// `"array"`
    Array,
    /// `"object"`
    Object,
    /// `"null"`
    Null,
}

/// Whether extra object properties beyond `properties` are permitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    /// `additionalProperties: true|false`.
    Allowed(bool),
    /// `additionalProperties: { ...schema }`.
    Schema(Box<JsonSchema>),
}

/// A JSON-Schema draft-07 subset sufficient to describe MCP tool parameters.
///
/// Unknown keywords are preserved in `extra` but ignored by the generator,
/// matching draft-07's "unknown keywords are annotations" posture without
/// implementing the full annotation machinery.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonSchema {
    /// Accepted primitive type(s).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<JsonSchema>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_properties: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_properties: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, JsonSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<JsonSchema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<JsonSchema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<JsonSchema>,

    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    #[serde(rename = "const", default, skip_serializing_if = "Option::is_none")]
    pub const_value: Option<Value>,

    /// Keywords this subset does not model, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JsonSchema {
    /// A schema accepting any value (no constraints).
    pub fn any() -> Self {
        Self::default()
    }

    /// Build a schema for a single primitive type with no other constraints.
    pub fn of_type(t: PrimitiveType) -> Self {
        Self {
            schema_type: Some(SchemaType::Single(t)),
            ..Self::default()
        }
    }

    /// True if this schema declares `type` as including `t`.
    pub fn accepts_type(&self, t: PrimitiveType) -> bool {
        match &self.schema_type {
            None => true,
            Some(st) => st.candidates().contains(&t),
        }
    }

    /// True if this schema uses a combinator (`oneOf`/`anyOf`/`allOf`).
    pub fn is_combinator(&self) -> bool {
        !self.one_of.is_empty() || !self.any_of.is_empty() || !self.all_of.is_empty()
    }
}
