// SPDX-License-Identifier: MIT OR Apache-2.0
//! Realistic-mode value generation: always produces a value satisfying the
//! schema (to the extent this subset can express "satisfying").

use crate::error::SchemaGenError;
use crate::{format, pattern, rng::CaseRng};
use mcpf_core::{AdditionalProperties, JsonSchema, PrimitiveType};
use serde_json::{Map, Value};

/// Generate a value that satisfies `schema`.
pub fn realistic(schema: &JsonSchema, rng: &mut CaseRng) -> Result<Value, SchemaGenError> {
    realistic_at(schema, rng, "$")
}

fn realistic_at(schema: &JsonSchema, rng: &mut CaseRng, path: &str) -> Result<Value, SchemaGenError> {
    if let Some(values) = &schema.enum_values {
        if values.is_empty() {
            return Err(SchemaGenError::EmptyEnum { path: path.to_string() });
        }
        return Ok(values[rng.index(values.len())].clone());
    }
    if let Some(c) = &schema.const_value {
        return Ok(c.clone());
    }
    if !schema.one_of.is_empty() {
        return pick_branch(&schema.one_of, rng, path, "oneOf");
    }
    if !schema.any_of.is_empty() {
        return pick_branch(&schema.any_of, rng, path, "anyOf");
    }
    if !schema.all_of.is_empty() {
        let merged = merge_all_of(&schema.all_of, path)?;
        return realistic_at(&merged, rng, path);
    }

    let candidates = schema
        .schema_type
        .as_ref()
        .map(|t| t.candidates())
        .unwrap_or_else(|| {
            vec![
                PrimitiveType::String,
                PrimitiveType::Number,
                PrimitiveType::Integer,
                PrimitiveType::Boolean,
                PrimitiveType::Array,
                PrimitiveType::Object,
            ]
        });
    let chosen = candidates[rng.index(candidates.len())];
    Ok(match chosen {
        PrimitiveType::Null => Value::Null,
        PrimitiveType::Boolean => Value::Bool(rng.chance(0.5)),
        PrimitiveType::String => Value::String(gen_string(schema, rng)),
        PrimitiveType::Integer => gen_number(schema, rng, true),
        PrimitiveType::Number => gen_number(schema, rng, false),
        PrimitiveType::Array => gen_array(schema, rng, path)?,
        PrimitiveType::Object => gen_object(schema, rng, path)?,
    })
}

fn pick_branch(
    branches: &[JsonSchema],
    rng: &mut CaseRng,
    path: &str,
    keyword: &'static str,
) -> Result<Value, SchemaGenError> {
    if branches.is_empty() {
        return Err(SchemaGenError::EmptyCombinator { keyword, path: path.to_string() });
    }
    let idx = rng.index(branches.len());
    realistic_at(&branches[idx], rng, &format!("{path}/{keyword}[{idx}]"))
}

fn merge_all_of(branches: &[JsonSchema], path: &str) -> Result<JsonSchema, SchemaGenError> {
    let mut merged = JsonSchema::any();
    for branch in branches {
        if let Some(t) = &branch.schema_type {
            merged.schema_type = Some(match &merged.schema_type {
                None => t.clone(),
                Some(existing) => {
                    let kept: Vec<_> = existing
                        .candidates()
                        .into_iter()
                        .filter(|c| t.candidates().contains(c))
                        .collect();
                    if kept.is_empty() {
                        return Err(SchemaGenError::DegenerateAllOf {
                            path: path.to_string(),
                            reason: "disjoint type constraints".to_string(),
                        });
                    }
                    mcpf_core::SchemaType::Many(kept)
                }
            });
        }
        merged.minimum = max_opt(merged.minimum, branch.minimum);
        merged.maximum = min_opt(merged.maximum, branch.maximum);
        merged.min_length = max_opt_u64(merged.min_length, branch.min_length);
        merged.max_length = min_opt_u64(merged.max_length, branch.max_length);
        merged.min_items = max_opt_u64(merged.min_items, branch.min_items);
        merged.max_items = min_opt_u64(merged.max_items, branch.max_items);
        if branch.pattern.is_some() {
            merged.pattern = branch.pattern.clone();
        }
        if branch.format.is_some() {
            merged.format = branch.format.clone();
        }
        for req in &branch.required {
            if !merged.required.contains(req) {
                merged.required.push(req.clone());
            }
        }
        for (k, v) in &branch.properties {
            merged.properties.insert(k.clone(), v.clone());
        }
    }
    if let (Some(min), Some(max)) = (merged.minimum, merged.maximum) {
        if min > max {
            return Err(SchemaGenError::DegenerateAllOf {
                path: path.to_string(),
                reason: format!("minimum {min} exceeds maximum {max}"),
            });
        }
    }
    if let (Some(min), Some(max)) = (merged.min_length, merged.max_length) {
        if min > max {
            return Err(SchemaGenError::DegenerateAllOf {
                path: path.to_string(),
                reason: format!("minLength {min} exceeds maxLength {max}"),
            });
        }
    }
    Ok(merged)
}

fn max_opt(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

fn min_opt(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

fn max_opt_u64(a: Option<u64>, b: Option<u64>) -> Option<u64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

fn min_opt_u64(a: Option<u64>, b: Option<u64>) -> Option<u64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

fn gen_string(schema: &JsonSchema, rng: &mut CaseRng) -> String {
    let min_len = schema.min_length.unwrap_or(0) as usize;
    let max_len = schema.max_length.unwrap_or(min_len.max(12) as u64).max(min_len as u64) as usize;

    if max_len == 0 {
        return String::new();
    }

    if let Some(f) = &schema.format {
        if let Some(s) = format::generate(f, rng) {
            return s;
        }
    }
    if let Some(p) = &schema.pattern {
        if let Some(s) = pattern::generate(p, min_len, max_len, rng) {
            return s;
        }
    }
    let len = if max_len == min_len { min_len } else { min_len + rng.index(max_len - min_len + 1) };
    (0..len)
        .map(|_| (b'a' + (rng.byte() % 26)) as char)
        .collect()
}

fn gen_number(schema: &JsonSchema, rng: &mut CaseRng, integer: bool) -> Value {
    let mut min = schema.minimum.unwrap_or(if integer { -1_000.0 } else { -1_000.0 });
    let mut max = schema.maximum.unwrap_or(if integer { 1_000.0 } else { 1_000.0 });
    if let Some(ex_min) = schema.exclusive_minimum {
        min = min.max(ex_min + if integer { 1.0 } else { f64::EPSILON });
    }
    if let Some(ex_max) = schema.exclusive_maximum {
        max = max.min(ex_max - if integer { 1.0 } else { f64::EPSILON });
    }
    if min > max {
        std::mem::swap(&mut min, &mut max);
    }

    if integer {
        let lo = min.ceil() as i64;
        let hi = max.floor() as i64;
        let mut v = rng.range_i64(lo, hi.saturating_add(1));
        if let Some(m) = schema.multiple_of {
            let m = m.max(1.0) as i64;
            if m > 0 {
                v -= v.rem_euclid(m);
            }
        }
        Value::from(v)
    } else {
        let mut v = rng.range_f64(min, max);
        if let Some(m) = schema.multiple_of {
            if m > 0.0 {
                v = (v / m).round() * m;
            }
        }
        serde_json::Number::from_f64(v)
            .map(Value::Number)
            .unwrap_or(Value::from(0))
    }
}

fn gen_array(schema: &JsonSchema, rng: &mut CaseRng, path: &str) -> Result<Value, SchemaGenError> {
    let min_items = schema.min_items.unwrap_or(0) as usize;
    let max_items = schema.max_items.unwrap_or(min_items.max(5) as u64).max(min_items as u64) as usize;
    let n = if max_items == min_items { min_items } else { min_items + rng.index(max_items - min_items + 1) };
    let item_schema = schema.items.clone().unwrap_or_default();
    let unique = schema.unique_items.unwrap_or(false);

    let mut items = Vec::with_capacity(n);
    let mut seen = Vec::new();
    let mut attempts = 0;
    while items.len() < n && attempts < n * 8 + 8 {
        attempts += 1;
        let v = realistic_at(&item_schema, rng, &format!("{path}[{}]", items.len()))?;
        if unique && seen.contains(&v) {
            continue;
        }
        seen.push(v.clone());
        items.push(v);
    }
    Ok(Value::Array(items))
}

fn gen_object(schema: &JsonSchema, rng: &mut CaseRng, path: &str) -> Result<Value, SchemaGenError> {
    let mut map = Map::new();
    for name in &schema.required {
        let prop_schema = schema.properties.get(name).cloned().unwrap_or_default();
        map.insert(name.clone(), realistic_at(&prop_schema, rng, &format!("{path}.{name}"))?);
    }

    let max_properties = schema.max_properties.map(|m| m as usize);
    for (name, prop_schema) in &schema.properties {
        if map.contains_key(name) {
            continue;
        }
        if let Some(max) = max_properties {
            if map.len() >= max {
                break;
            }
        }
        if rng.chance(0.6) {
            map.insert(name.clone(), realistic_at(prop_schema, rng, &format!("{path}.{name}"))?);
        }
    }

    if matches!(schema.additional_properties, Some(AdditionalProperties::Allowed(true)) | None) && rng.chance(0.1) {
        map.insert(format!("extra_{}", rng.next_u32()), Value::String("extra".to_string()));
    }

    Ok(Value::Object(map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcpf_core::SchemaType;

    fn rng(seed: u64) -> CaseRng {
        CaseRng::from_seed(seed)
    }

    #[test]
    fn enum_returns_a_member() {
        let schema = JsonSchema {
            enum_values: Some(vec![Value::from("a"), Value::from("b")]),
            ..JsonSchema::any()
        };
        let v = realistic(&schema, &mut rng(1)).expect("generate");
        assert!(v == Value::from("a") || v == Value::from("b"));
    }

    #[test]
    fn const_returns_the_exact_value() {
        let schema = JsonSchema { const_value: Some(Value::from(42)), ..JsonSchema::any() };
        assert_eq!(realistic(&schema, &mut rng(1)).unwrap(), Value::from(42));
    }

    #[test]
    fn integer_respects_bounds() {
        let schema = JsonSchema {
            schema_type: Some(SchemaType::Single(PrimitiveType::Integer)),
            minimum: Some(10.0),
            maximum: Some(12.0),
            ..JsonSchema::any()
        };
        for seed in 0..50 {
            let v = realistic(&schema, &mut rng(seed)).unwrap();
            let n = v.as_i64().expect("integer");
            assert!((10..=12).contains(&n));
        }
    }

    #[test]
    fn string_respects_length_bounds() {
        let schema = JsonSchema {
            schema_type: Some(SchemaType::Single(PrimitiveType::String)),
            min_length: Some(3),
            max_length: Some(5),
            ..JsonSchema::any()
        };
        for seed in 0..20 {
            let v = realistic(&schema, &mut rng(seed)).unwrap();
            let s = v.as_str().unwrap();
            assert!((3..=5).contains(&s.chars().count()));
        }
    }

    #[test]
    fn zero_max_length_yields_the_empty_string() {
        let schema = JsonSchema {
            schema_type: Some(SchemaType::Single(PrimitiveType::String)),
            max_length: Some(0),
            ..JsonSchema::any()
        };
        for seed in 0..20 {
            let v = realistic(&schema, &mut rng(seed)).unwrap();
            assert_eq!(v.as_str().unwrap(), "");
        }
    }

    #[test]
    fn object_includes_all_required_properties() {
        let mut properties = std::collections::BTreeMap::new();
        properties.insert("name".to_string(), JsonSchema::of_type(PrimitiveType::String));
        properties.insert("count".to_string(), JsonSchema::of_type(PrimitiveType::Integer));
        let schema = JsonSchema {
            schema_type: Some(SchemaType::Single(PrimitiveType::Object)),
            required: vec!["name".to_string()],
            properties,
            ..JsonSchema::any()
        };
        let v = realistic(&schema, &mut rng(3)).unwrap();
        assert!(v.as_object().unwrap().contains_key("name"));
    }

    #[test]
    fn conflicting_all_of_bounds_is_degenerate() {
        let a = JsonSchema { minimum: Some(10.0), ..JsonSchema::any() };
        let b = JsonSchema { maximum: Some(5.0), ..JsonSchema::any() };
        let schema = JsonSchema { all_of: vec![a, b], ..JsonSchema::any() };
        let err = realistic(&schema, &mut rng(1)).unwrap_err();
        assert!(matches!(err, SchemaGenError::DegenerateAllOf { .. }));
    }
}
