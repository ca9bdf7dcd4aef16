// SPDX-License-Identifier: MIT OR Apache-2.0
use mcpf_core::{FuzzTarget, JsonSchema, Phase, PrimitiveType, SchemaType};
use mcpf_schema::CaseGenerator;
use std::collections::BTreeMap;

fn search_tool_schema() -> JsonSchema {
    let mut properties = BTreeMap::new();
    properties.insert(
        "query".to_string(),
        JsonSchema { min_length: Some(1), max_length: Some(64), ..JsonSchema::of_type(PrimitiveType::String) },
    );
    properties.insert(
        "limit".to_string(),
        JsonSchema { minimum: Some(1.0), maximum: Some(50.0), ..JsonSchema::of_type(PrimitiveType::Integer) },
    );
    JsonSchema {
        schema_type: Some(SchemaType::Single(PrimitiveType::Object)),
        required: vec!["query".to_string()],
        properties,
        ..JsonSchema::any()
    }
}

#[test]
fn realistic_cases_satisfy_declared_bounds() {
    let gen = CaseGenerator::new(
        FuzzTarget::Tool { name: "search".to_string() },
        search_tool_schema(),
        10,
        1234,
    );
    let cases: Vec<_> = gen.collect::<Result<_, _>>().expect("generation should not error");

    for case in cases.iter().filter(|c| c.phase == Phase::Realistic) {
        let obj = case.args.as_object().expect("object");
        let query = obj.get("query").and_then(|v| v.as_str()).expect("query present");
        assert!((1..=64).contains(&query.chars().count()));
        if let Some(limit) = obj.get("limit").and_then(|v| v.as_i64()) {
            assert!((1..=50).contains(&limit));
        }
    }
}

#[test]
fn aggressive_cases_are_flagged_and_reproducible() {
    let schema = search_tool_schema();
    let target = FuzzTarget::Tool { name: "search".to_string() };
    let cases: Vec<_> = CaseGenerator::new(target, schema.clone(), 5, 77)
        .collect::<Result<_, _>>()
        .expect("generation should not error");

    let aggressive_cases: Vec<_> = cases.into_iter().filter(|c| c.phase == Phase::Aggressive).collect();
    assert_eq!(aggressive_cases.len(), 5);
    assert!(aggressive_cases.iter().all(|c| c.violates_schema));

    let replayed = CaseGenerator::regenerate(&aggressive_cases[0], &schema).expect("replay");
    assert_eq!(replayed, aggressive_cases[0].args);
}
