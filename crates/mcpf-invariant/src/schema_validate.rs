// SPDX-License-Identifier: MIT OR Apache-2.0
//! Compiles a [`mcpf_core::JsonSchema`] declaration into a reusable
//! `jsonschema` validator.
//!
//! Compilation happens once per tool/method — callers hold the
//! [`CompiledSchema`] for as long as the schema is in scope and reuse it
//! across every case dispatched against that tool, rather than recompiling
//! per response.

use crate::error::InvariantError;
use mcpf_core::JsonSchema;
use serde_json::Value;

/// A [`mcpf_core::JsonSchema`] declaration compiled into a validator.
pub struct CompiledSchema {
    validator: jsonschema::Validator,
}

impl CompiledSchema {
    /// Compile `schema` for repeated use.
    pub fn compile(schema: &JsonSchema) -> Result<Self, InvariantError> {
        let document = serde_json::to_value(schema)?;
        let validator =
            jsonschema::validator_for(&document).map_err(|err| InvariantError::CompileSchema(err.to_string()))?;
        Ok(Self { validator })
    }

    /// True if `instance` satisfies the compiled schema.
    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validator.is_valid(instance)
    }

    /// Every validation error `instance` produces against the compiled
    /// schema, rendered as human-readable strings.
    pub fn errors(&self, instance: &Value) -> Vec<String> {
        self.validator.iter_errors(instance).map(|err| err.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcpf_core::PrimitiveType;

    #[test]
    fn accepts_a_conforming_instance() {
        let schema = JsonSchema::of_type(PrimitiveType::Object);
        let compiled = CompiledSchema::compile(&schema).expect("compile");
        assert!(compiled.is_valid(&serde_json::json!({"ok": true})));
    }

    #[test]
    fn reports_an_error_for_a_type_mismatch() {
        let schema = JsonSchema::of_type(PrimitiveType::Object);
        let compiled = CompiledSchema::compile(&schema).expect("compile");
        assert!(!compiled.is_valid(&serde_json::json!("not an object")));
        assert!(!compiled.errors(&serde_json::json!("not an object")).is_empty());
    }
}
