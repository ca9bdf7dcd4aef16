// SPDX-License-Identifier: MIT OR Apache-2.0
//! Aggressive-mode value generation: build a realistic skeleton, then apply
//! a mutation sampled from the attack catalog. The result is not guaranteed
//! (and often not intended) to satisfy the schema.

use crate::catalog;
use crate::error::SchemaGenError;
use crate::realistic::realistic;
use crate::rng::CaseRng;
use mcpf_core::JsonSchema;
use serde_json::{Map, Value};

/// Build a schema-conforming skeleton and mutate it per the attack catalog.
pub fn aggressive(schema: &JsonSchema, rng: &mut CaseRng) -> Result<Value, SchemaGenError> {
    let skeleton = realistic(schema, rng)?;
    Ok(mutate(skeleton, schema, rng))
}

fn mutate(value: Value, schema: &JsonSchema, rng: &mut CaseRng) -> Value {
    match value {
        Value::String(s) => mutate_string(s, schema, rng),
        Value::Number(n) => mutate_number(n, schema, rng),
        Value::Array(items) => mutate_array(items, rng),
        Value::Object(map) => mutate_object(map, schema, rng),
        Value::Bool(_) | Value::Null => mutate_scalar(rng),
    }
}

fn mutate_string(original: String, schema: &JsonSchema, rng: &mut CaseRng) -> Value {
    match rng.index(4) {
        0 => Value::String(
            catalog::STRING_INJECTION[rng.index(catalog::STRING_INJECTION.len())].to_string(),
        ),
        1 => Value::String(
            catalog::STRING_UNICODE_EDGE[rng.index(catalog::STRING_UNICODE_EDGE.len())]
                .to_string(),
        ),
        2 => {
            let target_len = catalog::OVERSIZE_LENGTHS[rng.index(catalog::OVERSIZE_LENGTHS.len())];
            Value::String("A".repeat(target_len))
        }
        _ => {
            // Violate declared length bounds directly when present, else empty the string.
            if let Some(min) = schema.min_length {
                if min > 0 {
                    return Value::String(String::new());
                }
            }
            if let Some(max) = schema.max_length {
                return Value::String("x".repeat(max as usize + 1));
            }
            let _ = &original;
            Value::String(String::new())
        }
    }
}

fn mutate_number(original: serde_json::Number, schema: &JsonSchema, rng: &mut CaseRng) -> Value {
    let is_integer = original.is_i64() || original.is_u64();
    match rng.index(2) {
        0 => {
            let edge = catalog::FLOAT_EDGE_VALUES[rng.index(catalog::FLOAT_EDGE_VALUES.len())];
            if edge.is_finite() {
                serde_json::Number::from_f64(edge).map(Value::Number).unwrap_or(Value::Null)
            } else {
                // NaN and +-inf have no JSON representation; encode as null,
                // matching how a schema-unaware client would serialize them.
                Value::Null
            }
        }
        _ => {
            if let Some(max) = schema.maximum {
                let over = max + 1.0;
                return if is_integer {
                    Value::from(over as i64)
                } else {
                    serde_json::Number::from_f64(over).map(Value::Number).unwrap_or(Value::Null)
                };
            }
            if let Some(min) = schema.minimum {
                let under = min - 1.0;
                return if is_integer {
                    Value::from(under as i64)
                } else {
                    serde_json::Number::from_f64(under).map(Value::Number).unwrap_or(Value::Null)
                };
            }
            Value::Number(original)
        }
    }
}

fn mutate_array(mut items: Vec<Value>, rng: &mut CaseRng) -> Value {
    if rng.chance(0.5) {
        // Wrong element type: inject a value of a type other than the rest.
        items.push(Value::Bool(rng.chance(0.5)));
        items.push(Value::Object(Map::new()));
    } else {
        // Excess length: duplicate whatever is there well past any declared bound.
        let filler = items.first().cloned().unwrap_or(Value::Null);
        for _ in 0..64 {
            items.push(filler.clone());
        }
    }
    Value::Array(items)
}

fn mutate_object(mut map: Map<String, Value>, schema: &JsonSchema, rng: &mut CaseRng) -> Value {
    if !schema.required.is_empty() && rng.chance(0.5) {
        let idx = rng.index(schema.required.len());
        map.remove(&schema.required[idx]);
    } else if let Some((name, _)) = schema.properties.iter().nth(rng.index(schema.properties.len().max(1))) {
        map.insert(name.clone(), Value::Array(vec![Value::String("type-swapped".to_string())]));
    } else {
        map.insert(format!("unexpected_{}", rng.next_u32()), Value::String("unexpected".to_string()));
    }
    Value::Object(map)
}

fn mutate_scalar(rng: &mut CaseRng) -> Value {
    match rng.index(3) {
        0 => Value::String("type-confused".to_string()),
        1 => Value::Array(vec![Value::Null]),
        _ => Value::Number(serde_json::Number::from(rng.range_i64(-1_000_000, 1_000_000))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcpf_core::PrimitiveType;

    #[test]
    fn string_mutation_produces_a_value() {
        let schema = JsonSchema::of_type(PrimitiveType::String);
        let mut rng = CaseRng::from_seed(1);
        let v = aggressive(&schema, &mut rng).expect("generate");
        assert!(v.is_string());
    }

    #[test]
    fn number_mutation_can_produce_null_for_non_finite() {
        let schema = JsonSchema::of_type(PrimitiveType::Number);
        let mut saw_null_or_number = false;
        for seed in 0..20 {
            let mut rng = CaseRng::from_seed(seed);
            let v = aggressive(&schema, &mut rng).expect("generate");
            if v.is_null() || v.is_number() {
                saw_null_or_number = true;
            }
        }
        assert!(saw_null_or_number);
    }

    #[test]
    fn object_mutation_drops_a_required_property_or_adds_one() {
        let mut properties = std::collections::BTreeMap::new();
        properties.insert("name".to_string(), JsonSchema::of_type(PrimitiveType::String));
        let schema = JsonSchema {
            schema_type: Some(mcpf_core::SchemaType::Single(PrimitiveType::Object)),
            required: vec!["name".to_string()],
            properties,
            ..JsonSchema::any()
        };
        let mut rng = CaseRng::from_seed(9);
        let v = aggressive(&schema, &mut rng).expect("generate");
        assert!(v.is_object());
    }
}
